//! Method names exposed by the Deluge Web UI JSON endpoint.

#![allow(missing_docs)]

pub const AUTH_LOGIN: &str = "auth.login";
pub const AUTH_DELETE_SESSION: &str = "auth.delete_session";
pub const AUTH_CHECK_SESSION: &str = "auth.check_session";
pub const AUTH_CHANGE_PASSWORD: &str = "auth.change_password";

pub const WEB_CONNECT: &str = "web.connect";
pub const WEB_CONNECTED: &str = "web.connected";
pub const WEB_DISCONNECT: &str = "web.disconnect";
pub const WEB_GET_HOSTS: &str = "web.get_hosts";
pub const WEB_GET_PLUGINS: &str = "web.get_plugins";
pub const WEB_GET_PLUGIN_INFO: &str = "web.get_plugin_info";
pub const WEB_GET_TORRENT_STATUS: &str = "web.get_torrent_status";
pub const WEB_UPDATE_UI: &str = "web.update_ui";

pub const SYSTEM_LIST_METHODS: &str = "system.listMethods";

pub const CORE_ENABLE_PLUGIN: &str = "core.enable_plugin";
pub const CORE_DISABLE_PLUGIN: &str = "core.disable_plugin";
pub const CORE_GET_CONFIG: &str = "core.get_config";
pub const CORE_SET_CONFIG: &str = "core.set_config";
pub const CORE_ADD_TORRENT_FILE: &str = "core.add_torrent_file";
pub const CORE_ADD_TORRENT_MAGNET: &str = "core.add_torrent_magnet";
pub const CORE_ADD_TORRENT_URL: &str = "core.add_torrent_url";
pub const CORE_REMOVE_TORRENT: &str = "core.remove_torrent";
pub const CORE_PAUSE_TORRENT: &str = "core.pause_torrent";
pub const CORE_RESUME_TORRENT: &str = "core.resume_torrent";
pub const CORE_FORCE_RECHECK: &str = "core.force_recheck";
pub const CORE_QUEUE_TOP: &str = "core.queue_top";
pub const CORE_QUEUE_UP: &str = "core.queue_up";
pub const CORE_QUEUE_DOWN: &str = "core.queue_down";
pub const CORE_QUEUE_BOTTOM: &str = "core.queue_bottom";
pub const CORE_SET_TORRENT_OPTIONS: &str = "core.set_torrent_options";

pub const LABEL_GET_LABELS: &str = "label.get_labels";
pub const LABEL_ADD: &str = "label.add";
pub const LABEL_REMOVE: &str = "label.remove";
pub const LABEL_SET_TORRENT: &str = "label.set_torrent";

/// Status keys requested when listing torrents.
pub const DEFAULT_STATUS_FIELDS: &[&str] = &[
    "name",
    "state",
    "message",
    "progress",
    "queue",
    "total_size",
    "total_wanted",
    "total_done",
    "total_uploaded",
    "download_payload_rate",
    "upload_payload_rate",
    "eta",
    "ratio",
    "save_path",
    "label",
    "num_peers",
    "total_peers",
    "num_seeds",
    "total_seeds",
    "is_auto_managed",
    "time_added",
];
