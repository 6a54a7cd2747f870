//! # Deluge RPC Types
//!
//! This crate defines the consumer-facing types shared by the Deluge RPC client: the error type,
//! the normalized torrent model and the [`TorrentClient`] trait.

use std::{borrow::Cow, fmt};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for daemon operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DelugeError {
    /// The daemon rejected the credentials, or still required authentication after a re-login.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The daemon answered a well-formed call with a structured error.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Message reported by the daemon.
        message: String,
        /// Numeric error code reported by the daemon.
        code: i64,
    },

    /// Network or HTTP failure, malformed envelope, or a response id that does not match the
    /// request.
    #[error("transport error: {0}")]
    Transport(String),

    /// Torrent content that is neither a readable file, raw metainfo bytes nor base64 text.
    #[error("invalid input: {0}")]
    Input(String),

    /// The daemon has no record of the requested entity.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Torrent state as reported by the daemon.
///
/// The daemon's set of states is open ended (plugins and newer releases add their own), so
/// anything outside the known table is kept verbatim in [`TorrentState::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentState {
    /// Disk space is being allocated.
    Allocating,
    /// Pieces are being verified.
    Checking,
    /// Actively downloading.
    Downloading,
    /// Complete and uploading.
    Seeding,
    /// Stopped by the user.
    Paused,
    /// The daemon reported an error for this torrent.
    Error,
    /// Waiting for a free queue slot.
    Queued,
    /// Storage is being relocated.
    Moving,
    /// A state name this crate does not know, as sent by the daemon.
    Unrecognized(String),
}

impl TorrentState {
    /// Maps a daemon state name (e.g. `"Paused"`) to a [`TorrentState`].
    pub fn from_daemon(raw: &str) -> Self {
        match raw {
            "Allocating" => Self::Allocating,
            "Checking" => Self::Checking,
            "Downloading" => Self::Downloading,
            "Seeding" => Self::Seeding,
            "Paused" => Self::Paused,
            "Error" => Self::Error,
            "Queued" => Self::Queued,
            "Moving" => Self::Moving,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Canonical lowercase token, e.g. `"paused"`.
    pub fn token(&self) -> Cow<'_, str> {
        match self {
            Self::Allocating => Cow::Borrowed("allocating"),
            Self::Checking => Cow::Borrowed("checking"),
            Self::Downloading => Cow::Borrowed("downloading"),
            Self::Seeding => Cow::Borrowed("seeding"),
            Self::Paused => Cow::Borrowed("paused"),
            Self::Error => Cow::Borrowed("error"),
            Self::Queued => Cow::Borrowed("queued"),
            Self::Moving => Cow::Borrowed("moving"),
            Self::Unrecognized(raw) => Cow::Owned(raw.to_lowercase()),
        }
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl Serialize for TorrentState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

/// Torrent information in a stable, unit-consistent shape.
///
/// Sizes are bytes, speeds are bytes per second, durations are seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)] // rationale: field names mirror the daemon's status keys
pub struct NormalizedTorrent {
    /// The daemon's torrent hash.
    pub id: String,

    pub name: String,

    pub state: TorrentState,

    pub state_message: String,

    /// Percent complete, 0 to 100.
    pub progress: f64,

    pub total_size: u64,

    pub total_selected: u64,

    pub total_downloaded: u64,

    pub total_uploaded: u64,

    pub download_speed: u64,

    pub upload_speed: u64,

    pub eta: i64,

    /// Share ratio, `-1` when the daemon has none yet.
    pub ratio: f64,

    /// Position in the download queue, `-1` when not queued.
    pub queue_position: i64,

    pub save_path: String,

    /// `None` when the daemon did not send a label at all (Label plugin disabled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub connected_peers: u64,

    pub total_peers: i64,

    pub connected_seeds: u64,

    pub total_seeds: i64,

    pub is_completed: bool,

    /// Unix timestamp, seconds.
    pub date_added: i64,

    pub is_auto_managed: bool,
}

/// A label known to the daemon, with the number of torrents carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct Label {
    pub name: String,

    pub count: u64,
}

/// Snapshot of everything a UI needs to render the daemon state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientData {
    /// Torrents ordered by queue position.
    pub torrents: Vec<NormalizedTorrent>,
    /// Labels currently in use.
    pub labels: Vec<Label>,
}

/// TorrentClient defines the common interface for torrent daemon controllers.
#[allow(async_fn_in_trait)]
pub trait TorrentClient {
    /// Fetch all torrents (normalized) and labels in one round trip.
    async fn all_data(&self) -> Result<ClientData, DelugeError>;
    /// Fetch one torrent by its hash.
    async fn torrent(&self, id: &str) -> Result<NormalizedTorrent, DelugeError>;
    /// Pause a torrent by its hash.
    async fn pause(&self, id: &str) -> Result<(), DelugeError>;
    /// Resume a torrent by its hash.
    async fn resume(&self, id: &str) -> Result<(), DelugeError>;
    /// Remove a torrent by its hash. If `delete_data` is true, downloaded data is also deleted.
    async fn remove(&self, id: &str, delete_data: bool) -> Result<bool, DelugeError>;
}
