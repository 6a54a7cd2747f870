//! Typed wrappers over the daemon's RPC methods.

use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use deluge_rpc_types::{ClientData, DelugeError, NormalizedTorrent, TorrentClient};

use super::{DelugeClient, decode};
use crate::method;
use crate::normalize::{labels_from_filter, normalize, normalize_all};
use crate::transport::{MultipartRequest, Transport};
use crate::upload::{TorrentInput, TorrentPayload, UploadResponse};
use crate::wire::{
    AddTorrentOptions, DaemonConfig, DaemonHost, PluginInfo, PluginList, RawTorrentStatus,
    TorrentListing, TorrentOptions,
};

/// Form field the Web UI reads uploaded files from.
const UPLOAD_FIELD: &str = "file";

/// Where to move a torrent in the download queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDirection {
    /// First position.
    Top,
    /// One position up.
    Up,
    /// One position down.
    Down,
    /// Last position.
    Bottom,
}

impl QueueDirection {
    fn method(self) -> &'static str {
        match self {
            Self::Top => method::CORE_QUEUE_TOP,
            Self::Up => method::CORE_QUEUE_UP,
            Self::Down => method::CORE_QUEUE_DOWN,
            Self::Bottom => method::CORE_QUEUE_BOTTOM,
        }
    }
}

impl<T: Transport> DelugeClient<T> {
    /// Whether the daemon still accepts the current session cookie.
    ///
    /// Never logs in, so it reports `false` for a fresh client.
    pub async fn check_session(&self) -> Result<bool, DelugeError> {
        let valid: Option<bool> = decode(
            method::AUTH_CHECK_SESSION,
            self.dispatch(method::AUTH_CHECK_SESSION, &[]).await?,
        )?;
        Ok(valid.unwrap_or(false))
    }

    /// Whether the Web UI is attached to a daemon, as the Web UI sees it.
    pub async fn is_daemon_connected(&self) -> Result<bool, DelugeError> {
        self.call_unattached(method::WEB_CONNECTED, vec![]).await
    }

    /// Daemon hosts the Web UI knows about.
    pub async fn get_hosts(&self) -> Result<Vec<DaemonHost>, DelugeError> {
        self.call_unattached(method::WEB_GET_HOSTS, vec![]).await
    }

    /// Names of every RPC method the Web UI exposes.
    pub async fn list_methods(&self) -> Result<Vec<String>, DelugeError> {
        self.call(method::SYSTEM_LIST_METHODS, vec![]).await
    }

    /// Enabled and available plugins.
    pub async fn get_plugins(&self) -> Result<PluginList, DelugeError> {
        self.call(method::WEB_GET_PLUGINS, vec![]).await
    }

    /// Metadata of one plugin.
    pub async fn get_plugin_info(&self, name: &str) -> Result<PluginInfo, DelugeError> {
        self.call(method::WEB_GET_PLUGIN_INFO, vec![json!(name)])
            .await
    }

    /// Enables a plugin on the daemon.
    #[instrument(skip(self))]
    pub async fn enable_plugin(&self, name: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::CORE_ENABLE_PLUGIN, vec![json!(name)])
            .await
    }

    /// Disables a plugin on the daemon.
    #[instrument(skip(self))]
    pub async fn disable_plugin(&self, name: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::CORE_DISABLE_PLUGIN, vec![json!(name)])
            .await
    }

    /// The daemon's full configuration.
    pub async fn get_config(&self) -> Result<DaemonConfig, DelugeError> {
        self.call(method::CORE_GET_CONFIG, vec![]).await
    }

    /// Updates the given configuration keys. Keys not present are left alone.
    #[instrument(skip_all)]
    pub async fn set_config(&self, config: &DaemonConfig) -> Result<(), DelugeError> {
        debug!("Updating {} config keys", config.len());
        self.call_discarding(method::CORE_SET_CONFIG, vec![Value::Object(config.clone())])
            .await
    }

    /// Uploads a torrent file to the Web UI's temporary storage.
    ///
    /// A report with `success == false` is returned as is.
    #[instrument(skip_all)]
    pub async fn upload(
        &self,
        input: impl Into<TorrentInput>,
    ) -> Result<UploadResponse, DelugeError> {
        let payload = TorrentPayload::resolve(input.into()).await?;
        self.upload_payload(payload).await
    }

    async fn upload_payload(&self, payload: TorrentPayload) -> Result<UploadResponse, DelugeError> {
        if self.auto_login && !self.session.is_authenticated() {
            self.login(None).await?;
        }

        debug!(
            "Uploading {} ({} bytes)",
            payload.file_name,
            payload.bytes.len()
        );
        let response = self
            .transport
            .post_multipart(MultipartRequest {
                url: self.upload_url.clone(),
                field: UPLOAD_FIELD.to_string(),
                file_name: payload.file_name,
                bytes: payload.bytes,
                cookie: self.session.cookie(),
            })
            .await
            .map_err(super::map_transport_error)?;
        self.session.refresh_cookie(&response.set_cookies);
        decode("upload", response.body)
    }

    /// Adds a torrent from a file path, raw bytes or base64 content.
    ///
    /// Returns the new torrent id, or `None` when the daemon declined, e.g. for a duplicate.
    #[instrument(skip_all)]
    pub async fn add_torrent(
        &self,
        input: impl Into<TorrentInput>,
        options: &AddTorrentOptions,
    ) -> Result<Option<String>, DelugeError> {
        let payload = TorrentPayload::resolve(input.into()).await?;
        debug!("Adding torrent {}", payload.file_name);
        let id: Option<String> = self
            .call(
                method::CORE_ADD_TORRENT_FILE,
                vec![
                    json!(payload.file_name),
                    json!(payload.base64),
                    options_value(options)?,
                ],
            )
            .await?;
        debug!("Daemon assigned torrent id {id:?}");
        Ok(id)
    }

    /// Adds a torrent from a magnet URI.
    #[instrument(skip(self, options))]
    pub async fn add_torrent_magnet(
        &self,
        uri: &str,
        options: &AddTorrentOptions,
    ) -> Result<Option<String>, DelugeError> {
        if !uri.starts_with("magnet:") {
            return Err(DelugeError::Input(format!("not a magnet URI: {uri}")));
        }
        self.call(
            method::CORE_ADD_TORRENT_MAGNET,
            vec![json!(uri), options_value(options)?],
        )
        .await
    }

    /// Adds a torrent the daemon downloads from `url`.
    #[instrument(skip(self, options))]
    pub async fn add_torrent_url(
        &self,
        url: &str,
        options: &AddTorrentOptions,
    ) -> Result<Option<String>, DelugeError> {
        self.call(
            method::CORE_ADD_TORRENT_URL,
            vec![json!(url), options_value(options)?],
        )
        .await
    }

    /// Removes a torrent, optionally deleting its downloaded data.
    #[instrument(skip(self))]
    pub async fn remove_torrent(&self, id: &str, remove_data: bool) -> Result<bool, DelugeError> {
        let removed: Option<bool> = self
            .call(
                method::CORE_REMOVE_TORRENT,
                vec![json!(id), json!(remove_data)],
            )
            .await?;
        Ok(removed.unwrap_or(false))
    }

    /// Raw status of one torrent. `fields` defaults to every key normalization reads.
    pub async fn get_torrent_status(
        &self,
        id: &str,
        fields: Option<&[&str]>,
    ) -> Result<RawTorrentStatus, DelugeError> {
        let fields = fields.unwrap_or(method::DEFAULT_STATUS_FIELDS);
        let status: Map<String, Value> = self
            .call(method::WEB_GET_TORRENT_STATUS, vec![json!(id), json!(fields)])
            .await?;
        // Unknown ids come back as an empty record.
        if status.is_empty() {
            return Err(DelugeError::NotFound(format!("torrent {id}")));
        }
        decode(method::WEB_GET_TORRENT_STATUS, Value::Object(status))
    }

    /// Torrent listing with session stats and sidebar filters.
    pub async fn list_torrents(
        &self,
        fields: Option<&[&str]>,
        filter: Option<&Map<String, Value>>,
    ) -> Result<TorrentListing, DelugeError> {
        let fields = fields.unwrap_or(method::DEFAULT_STATUS_FIELDS);
        let filter = filter.cloned().unwrap_or_default();
        self.call(
            method::WEB_UPDATE_UI,
            vec![json!(fields), Value::Object(filter)],
        )
        .await
    }

    /// One torrent in normalized form.
    pub async fn get_torrent(&self, id: &str) -> Result<NormalizedTorrent, DelugeError> {
        let raw = self.get_torrent_status(id, None).await?;
        Ok(normalize(id, &raw))
    }

    /// Every torrent in normalized form plus the labels in use.
    #[instrument(skip(self))]
    pub async fn get_all_data(&self) -> Result<ClientData, DelugeError> {
        let listing = self.list_torrents(None, None).await?;
        let labels = listing
            .filters
            .get("label")
            .map(|filter| labels_from_filter(filter))
            .unwrap_or_default();
        let torrents = normalize_all(listing.torrents);
        debug!(
            "Fetched {} torrents and {} labels",
            torrents.len(),
            labels.len()
        );
        Ok(ClientData { torrents, labels })
    }

    /// Pauses a torrent.
    #[instrument(skip(self))]
    pub async fn pause_torrent(&self, id: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::CORE_PAUSE_TORRENT, vec![json!([id])])
            .await
    }

    /// Resumes a torrent.
    #[instrument(skip(self))]
    pub async fn resume_torrent(&self, id: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::CORE_RESUME_TORRENT, vec![json!([id])])
            .await
    }

    /// Forces a recheck of the torrent's downloaded data.
    #[instrument(skip(self))]
    pub async fn verify_torrent(&self, id: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::CORE_FORCE_RECHECK, vec![json!([id])])
            .await
    }

    /// Moves a torrent in the download queue.
    #[instrument(skip(self))]
    pub async fn queue(&self, id: &str, direction: QueueDirection) -> Result<(), DelugeError> {
        self.call_discarding(direction.method(), vec![json!([id])])
            .await
    }

    /// Applies per-torrent options. Unset fields are left alone.
    #[instrument(skip(self, options))]
    pub async fn set_torrent_options(
        &self,
        id: &str,
        options: &TorrentOptions,
    ) -> Result<(), DelugeError> {
        let options = serde_json::to_value(options)
            .map_err(|e| DelugeError::Input(format!("invalid torrent options: {e}")))?;
        self.call_discarding(method::CORE_SET_TORRENT_OPTIONS, vec![json!([id]), options])
            .await
    }

    /// Labels known to the Label plugin.
    pub async fn get_labels(&self) -> Result<Vec<String>, DelugeError> {
        self.call(method::LABEL_GET_LABELS, vec![]).await
    }

    /// Creates a label. Label names are lowercase on the daemon.
    #[instrument(skip(self))]
    pub async fn add_label(&self, label: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::LABEL_ADD, vec![json!(label)])
            .await
    }

    /// Deletes a label.
    #[instrument(skip(self))]
    pub async fn remove_label(&self, label: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::LABEL_REMOVE, vec![json!(label)])
            .await
    }

    /// Assigns a label to a torrent. An empty label clears it.
    #[instrument(skip(self))]
    pub async fn set_torrent_label(&self, id: &str, label: &str) -> Result<(), DelugeError> {
        self.call_discarding(method::LABEL_SET_TORRENT, vec![json!(id), json!(label)])
            .await
    }

    /// Calls a method whose result carries no information.
    async fn call_discarding(&self, method: &str, params: Vec<Value>) -> Result<(), DelugeError> {
        self.call::<Value>(method, params).await.map(drop)
    }
}

impl<T: Transport> TorrentClient for DelugeClient<T> {
    async fn all_data(&self) -> Result<ClientData, DelugeError> {
        self.get_all_data().await
    }

    async fn torrent(&self, id: &str) -> Result<NormalizedTorrent, DelugeError> {
        self.get_torrent(id).await
    }

    async fn pause(&self, id: &str) -> Result<(), DelugeError> {
        self.pause_torrent(id).await
    }

    async fn resume(&self, id: &str) -> Result<(), DelugeError> {
        self.resume_torrent(id).await
    }

    async fn remove(&self, id: &str, delete_data: bool) -> Result<bool, DelugeError> {
        self.remove_torrent(id, delete_data).await
    }
}

fn options_value(options: &AddTorrentOptions) -> Result<Value, DelugeError> {
    serde_json::to_value(options)
        .map_err(|e| DelugeError::Input(format!("invalid add options: {e}")))
}
