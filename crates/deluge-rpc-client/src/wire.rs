//! Raw result and argument shapes of the Deluge Web UI methods.
//!
//! Decoding is deliberately lenient: the daemon omits keys it does not know (plugins disabled,
//! older releases) and sends `null` for some of the ones it does, so every field falls back to a
//! default instead of failing the whole call.

use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};
use serde_json::{Map, Value};

/// The daemon configuration, a flat key/value mapping.
pub type DaemonConfig = Map<String, Value>;

/// Torrent status record as sent by the daemon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
#[allow(missing_docs)] // rationale: these are the daemon's status keys
pub struct RawTorrentStatus {
    #[serde(deserialize_with = "nullable")]
    pub name: String,

    /// State name, e.g. `"Paused"` or `"Downloading"`.
    #[serde(deserialize_with = "nullable")]
    pub state: String,

    #[serde(deserialize_with = "nullable")]
    pub message: String,

    /// Percent complete, 0 to 100.
    #[serde(deserialize_with = "lenient_f64")]
    pub progress: f64,

    /// Queue position, `-1` when not queued.
    #[serde(deserialize_with = "sentinel_i64")]
    pub queue: i64,

    #[serde(deserialize_with = "lenient_u64")]
    pub total_size: u64,

    #[serde(deserialize_with = "lenient_u64")]
    pub total_wanted: u64,

    #[serde(deserialize_with = "lenient_u64")]
    pub total_done: u64,

    #[serde(deserialize_with = "lenient_u64")]
    pub total_uploaded: u64,

    #[serde(deserialize_with = "lenient_u64")]
    pub download_payload_rate: u64,

    #[serde(deserialize_with = "lenient_u64")]
    pub upload_payload_rate: u64,

    #[serde(deserialize_with = "lenient_i64")]
    pub eta: i64,

    /// Share ratio, `-1` when unknown.
    #[serde(deserialize_with = "sentinel_f64")]
    pub ratio: f64,

    #[serde(deserialize_with = "nullable")]
    pub save_path: String,

    /// Only present when the Label plugin is enabled.
    pub label: Option<String>,

    #[serde(deserialize_with = "lenient_u64")]
    pub num_peers: u64,

    #[serde(deserialize_with = "lenient_i64")]
    pub total_peers: i64,

    #[serde(deserialize_with = "lenient_u64")]
    pub num_seeds: u64,

    #[serde(deserialize_with = "lenient_i64")]
    pub total_seeds: i64,

    #[serde(deserialize_with = "nullable")]
    pub is_auto_managed: bool,

    /// Unix timestamp, seconds.
    #[serde(deserialize_with = "lenient_i64")]
    pub time_added: i64,
}

impl Default for RawTorrentStatus {
    fn default() -> Self {
        Self {
            name: String::new(),
            state: String::new(),
            message: String::new(),
            progress: 0.0,
            queue: -1,
            total_size: 0,
            total_wanted: 0,
            total_done: 0,
            total_uploaded: 0,
            download_payload_rate: 0,
            upload_payload_rate: 0,
            eta: 0,
            ratio: -1.0,
            save_path: String::new(),
            label: None,
            num_peers: 0,
            total_peers: 0,
            num_seeds: 0,
            total_seeds: 0,
            is_auto_managed: false,
            time_added: 0,
        }
    }
}

/// Result of `web.update_ui`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct TorrentListing {
    /// Whether the Web UI is attached to a daemon.
    #[serde(deserialize_with = "nullable")]
    pub connected: bool,
    /// Torrent id to status, in the order the daemon sent them.
    #[serde(deserialize_with = "ordered_entries")]
    pub torrents: Vec<(String, RawTorrentStatus)>,
    /// Session-wide transfer statistics.
    #[serde(deserialize_with = "nullable")]
    pub stats: SessionStats,
    /// Sidebar filters, e.g. `"state"` or `"label"`, as `(value, count)` pairs.
    #[serde(deserialize_with = "nullable")]
    pub filters: BTreeMap<String, Vec<(String, u64)>>,
}

/// Session-wide statistics reported alongside the torrent listing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct SessionStats {
    #[serde(deserialize_with = "lenient_f64")]
    pub download_rate: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub upload_rate: f64,

    #[serde(deserialize_with = "lenient_i64")]
    pub num_connections: i64,

    #[serde(deserialize_with = "lenient_i64")]
    pub max_num_connections: i64,

    #[serde(deserialize_with = "lenient_i64")]
    pub dht_nodes: i64,

    #[serde(deserialize_with = "lenient_i64")]
    pub free_space: i64,

    #[serde(deserialize_with = "nullable")]
    pub has_incoming_connections: bool,
}

/// Result of `web.get_plugins`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PluginList {
    pub enabled_plugins: Vec<String>,

    pub available_plugins: Vec<String>,
}

/// Result of `web.get_plugin_info`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PluginInfo {
    #[serde(rename = "Name", deserialize_with = "nullable")]
    pub name: String,

    #[serde(rename = "Version", deserialize_with = "nullable")]
    pub version: String,

    #[serde(rename = "Author", deserialize_with = "nullable")]
    pub author: String,

    #[serde(rename = "Author-email", deserialize_with = "nullable")]
    pub author_email: String,

    #[serde(rename = "Home-page", deserialize_with = "nullable")]
    pub home_page: String,

    #[serde(rename = "License", deserialize_with = "nullable")]
    pub license: String,

    #[serde(rename = "Description", deserialize_with = "nullable")]
    pub description: String,
}

/// A daemon the Web UI knows about, from `web.get_hosts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<Value>")]
#[allow(missing_docs)]
pub struct DaemonHost {
    pub id: String,

    pub host: String,

    pub port: u16,
}

impl From<Vec<Value>> for DaemonHost {
    // Rows are `[id, host, port, user_or_status]`.
    fn from(row: Vec<Value>) -> Self {
        let text = |index: usize| {
            row.get(index)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            id: text(0),
            host: text(1),
            port: row
                .get(2)
                .and_then(Value::as_u64)
                .and_then(|port| u16::try_from(port).ok())
                .unwrap_or_default(),
        }
    }
}

/// Options for `core.add_torrent_*`. Unset fields fall back to the daemon's defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[allow(missing_docs)]
pub struct AddTorrentOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_paused: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_completed_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_slots: Option<i64>,

    /// KiB/s, `-1` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_download_speed: Option<f64>,

    /// KiB/s, `-1` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_speed: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritize_first_last_pieces: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_download: Option<bool>,
}

/// Options for `core.set_torrent_options`. Only set fields are sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[allow(missing_docs)]
pub struct TorrentOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_slots: Option<i64>,

    /// KiB/s, `-1` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_download_speed: Option<f64>,

    /// KiB/s, `-1` for unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_speed: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_managed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_at_ratio: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_ratio: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_at_ratio: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_completed_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritize_first_last: Option<bool>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn number<'de, D>(deserializer: D) -> Result<Option<serde_json::Number>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => Some(n),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(number(deserializer)?
        .and_then(|n| {
            n.as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        })
        .unwrap_or_default())
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(number(deserializer)?
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
        .unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(number(deserializer)?
        .and_then(|n| n.as_f64())
        .unwrap_or_default())
}

fn sentinel_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(number(deserializer)?
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
        .unwrap_or(-1))
}

fn sentinel_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(number(deserializer)?
        .and_then(|n| n.as_f64())
        .unwrap_or(-1.0))
}

/// Decodes a JSON object into `(key, value)` pairs, keeping the source order. `null` is empty.
fn ordered_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object keyed by torrent id")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or_default());
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(EntriesVisitor(PhantomData))
}
