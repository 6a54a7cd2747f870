//! # Deluge client over the Web UI JSON-RPC endpoint.
//!
//! The client logs in and attaches the Web UI to a daemon on demand, replays the session cookie,
//! and renews an expired session once before giving up.
//!
//! usage:
//!
//! ```rust,ignore
//! use deluge_rpc_client::{AddTorrentOptions, ClientConfig, DelugeClient};
//! use deluge_rpc_types::TorrentClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DelugeClient::try_new(ClientConfig::from_env()?)?;
//!     let id = client
//!         .add_torrent("path/to/file.torrent", &AddTorrentOptions::default())
//!         .await?;
//!     println!("Added torrent: {:?}", id);
//!
//!     for torrent in client.all_data().await?.torrents {
//!         println!("{} {} {:.1}%", torrent.name, torrent.state, torrent.progress);
//!     }
//!     Ok(())
//! }
//! ```
//!

mod client;
mod config;
mod envelope;
pub mod method;
mod normalize;
mod session;
mod transport;
mod upload;
mod wire;

#[cfg(test)]
mod testutil;

#[cfg(test)]
use httpmock as _;
#[cfg(test)]
use tracing_subscriber as _;

pub use client::{DelugeClient, QueueDirection};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_PASSWORD, DEFAULT_TIMEOUT};
pub use envelope::AUTH_REQUIRED_CODE;
pub use normalize::{normalize, normalize_all};
pub use transport::{
    HttpTransport, JsonRequest, JsonResponse, MultipartRequest, Transport, TransportError,
};
pub use upload::{TorrentInput, TorrentPayload, UploadResponse, UploadedFile};
pub use wire::{
    AddTorrentOptions, DaemonConfig, DaemonHost, PluginInfo, PluginList, RawTorrentStatus,
    SessionStats, TorrentListing, TorrentOptions,
};
