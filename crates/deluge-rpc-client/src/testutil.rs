//! Shared test utilities and fixtures.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value, json};

use crate::transport::{
    JsonRequest, JsonResponse, MultipartRequest, Transport, TransportError,
};
use crate::wire::RawTorrentStatus;

pub(crate) const HOST_ID: &str = "c4f1a9b2d3e4";

pub(crate) fn make_raw_status(name: &str, state: &str, queue: i64) -> RawTorrentStatus {
    RawTorrentStatus {
        name: name.to_string(),
        state: state.to_string(),
        message: String::new(),
        progress: 0.0,
        queue,
        total_size: 1_953_349_632,
        total_wanted: 1_953_349_632,
        total_done: 0,
        total_uploaded: 0,
        download_payload_rate: 0,
        upload_payload_rate: 0,
        eta: 0,
        ratio: -1.0,
        save_path: "/downloads".to_string(),
        label: None,
        num_peers: 0,
        total_peers: 0,
        num_seeds: 0,
        total_seeds: 0,
        is_auto_managed: true,
        time_added: 1_536_080_000,
    }
}

/// Raw status record as the daemon sends it over the wire.
pub(crate) fn status_json(name: &str, state: &str, queue: i64, progress: f64) -> Value {
    json!({
        "name": name,
        "state": state,
        "message": "OK",
        "progress": progress,
        "queue": queue,
        "total_size": 1_953_349_632u64,
        "total_wanted": 1_953_349_632u64,
        "total_done": 0,
        "total_uploaded": 0,
        "download_payload_rate": 0,
        "upload_payload_rate": 0,
        "eta": 0,
        "ratio": -1,
        "save_path": "/downloads",
        "label": "",
        "num_peers": 0,
        "total_peers": -1,
        "num_seeds": 0,
        "total_seeds": -1,
        "is_auto_managed": true,
        "time_added": 1_536_080_000,
    })
}

/// One JSON-RPC request seen by [`FakeDaemon`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeenRequest {
    pub(crate) id: u64,
    pub(crate) method: String,
    pub(crate) params: Vec<Value>,
    pub(crate) cookie: Option<String>,
}

#[derive(Default)]
struct DaemonState {
    password: String,
    sessions: Vec<String>,
    issued: u32,
    host_connected: bool,
    torrents: Map<String, Value>,
    labels: Vec<String>,
    config: Map<String, Value>,
    requests: Vec<SeenRequest>,
    uploads: Vec<MultipartRequest>,
    offline: bool,
}

/// In-process stand-in for the Web UI that enforces its session rules.
///
/// Cookies are issued on login and checked on every other method. Host-scoped methods fail until
/// `web.connect` was called.
pub(crate) struct FakeDaemon {
    state: Mutex<DaemonState>,
}

impl FakeDaemon {
    pub(crate) fn new(password: &str) -> Self {
        let mut config = Map::new();
        config.insert("max_connections_global".into(), json!(200));
        config.insert("download_location".into(), json!("/downloads"));
        Self {
            state: Mutex::new(DaemonState {
                password: password.to_string(),
                config,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn with_torrent(self, id: &str, status: Value) -> Self {
        self.lock().torrents.insert(id.to_string(), status);
        self
    }

    pub(crate) fn requests(&self) -> Vec<SeenRequest> {
        self.lock().requests.clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .map(|request| request.method.clone())
            .collect()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.method == method)
            .count()
    }

    pub(crate) fn last_params(&self, method: &str) -> Option<Vec<Value>> {
        self.lock()
            .requests
            .iter()
            .rev()
            .find(|request| request.method == method)
            .map(|request| request.params.clone())
    }

    pub(crate) fn uploads(&self) -> Vec<MultipartRequest> {
        self.lock().uploads.clone()
    }

    pub(crate) fn password(&self) -> String {
        self.lock().password.clone()
    }

    /// Invalidates every issued cookie, like a Web UI restart.
    pub(crate) fn expire_sessions(&self) {
        self.lock().sessions.clear();
    }

    /// Changes the password behind the client's back.
    pub(crate) fn set_password(&self, password: &str) {
        self.lock().password = password.to_string();
    }

    pub(crate) fn go_offline(&self) {
        self.lock().offline = true;
    }

    fn lock(&self) -> MutexGuard<'_, DaemonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: JsonRequest) -> Result<JsonResponse, TransportError> {
        let mut state = self.lock();
        if state.offline {
            return Err(TransportError::Network("connection refused".into()));
        }

        let id = request.body["id"].as_u64().unwrap_or_default();
        let method = request.body["method"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let params = request.body["params"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        state.requests.push(SeenRequest {
            id,
            method: method.clone(),
            params: params.clone(),
            cookie: request.cookie.clone(),
        });

        let text = |index: usize| {
            params
                .get(index)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let authenticated = request
            .cookie
            .as_ref()
            .is_some_and(|cookie| state.sessions.contains(cookie));
        let mut set_cookies = Vec::new();

        let outcome: Result<Value, (&str, i64)> = match method.as_str() {
            "auth.login" => {
                if text(0) == state.password {
                    state.issued += 1;
                    let cookie = format!("_session_id=session{}", state.issued);
                    state.sessions.push(cookie.clone());
                    set_cookies.push(format!(
                        "{cookie}; Expires=Thu, 01 Jan 2099 00:00:00 GMT; Path=/json"
                    ));
                    Ok(json!(true))
                } else {
                    Ok(json!(false))
                }
            }
            "auth.check_session" => Ok(json!(authenticated)),
            _ if !authenticated => Err(("Not authenticated", 1)),
            "auth.delete_session" => {
                state
                    .sessions
                    .retain(|cookie| Some(cookie) != request.cookie.as_ref());
                Ok(json!(true))
            }
            "auth.change_password" => {
                if text(0) == state.password {
                    state.password = text(1);
                    Ok(json!(true))
                } else {
                    Err(("Incorrect password", 3))
                }
            }
            "web.get_hosts" => Ok(json!([[HOST_ID, "127.0.0.1", 58846, "localclient"]])),
            "web.connect" => {
                if text(0) == HOST_ID {
                    state.host_connected = true;
                    Ok(Value::Null)
                } else {
                    Err(("Unknown host", 3))
                }
            }
            "web.connected" => Ok(json!(state.host_connected)),
            "web.disconnect" => {
                state.host_connected = false;
                Ok(json!("Connection was closed successfully."))
            }
            // Daemon methods are only registered while a host is attached.
            _ if !state.host_connected => Err(("Unknown method", 2)),
            "system.listMethods" => Ok(json!(["auth.login", "core.get_config", "web.update_ui"])),
            "core.get_config" => Ok(Value::Object(state.config.clone())),
            "core.set_config" => {
                if let Some(update) = params.first().and_then(Value::as_object) {
                    for (key, value) in update {
                        state.config.insert(key.clone(), value.clone());
                    }
                }
                Ok(Value::Null)
            }
            "web.update_ui" => {
                let mut labels = vec![json!(["All", state.torrents.len()])];
                labels.extend(state.labels.iter().map(|label| json!([label, 1])));
                Ok(json!({
                    "connected": true,
                    "torrents": state.torrents,
                    "stats": {
                        "download_rate": 0.0,
                        "upload_rate": 0.0,
                        "num_connections": 0,
                        "max_num_connections": 200,
                        "dht_nodes": 12,
                        "free_space": 1_000_000,
                        "has_incoming_connections": false,
                    },
                    "filters": {"label": labels},
                }))
            }
            "web.get_torrent_status" => Ok(state
                .torrents
                .get(&text(0))
                .cloned()
                .unwrap_or_else(|| json!({}))),
            "core.add_torrent_file" => Ok(json!("2d2ec2e4ac1c5b1c8ef2b5e0b3b0e3f1a4c5d6e7")),
            "core.add_torrent_magnet" => Ok(json!("2d2ec2e4ac1c5b1c8ef2b5e0b3b0e3f1a4c5d6e7")),
            "core.remove_torrent" => Ok(json!(state.torrents.remove(&text(0)).is_some())),
            "core.pause_torrent" | "core.resume_torrent" | "core.force_recheck"
            | "core.queue_top" | "core.queue_up" | "core.queue_down" | "core.queue_bottom"
            | "core.set_torrent_options" => Ok(Value::Null),
            "label.get_labels" => Ok(json!(state.labels)),
            "label.add" => {
                let label = text(0);
                state.labels.push(label);
                Ok(Value::Null)
            }
            "label.set_torrent" => Ok(Value::Null),
            _ => Err(("Unknown method", 2)),
        };

        let body = match outcome {
            Ok(result) => json!({"id": id, "result": result, "error": null}),
            Err((message, code)) => json!({
                "id": id,
                "result": null,
                "error": {"message": message, "code": code},
            }),
        };
        Ok(JsonResponse { body, set_cookies })
    }
}

impl Transport for &FakeDaemon {
    async fn post_json(&self, request: JsonRequest) -> Result<JsonResponse, TransportError> {
        // Let concurrent callers interleave like they would on a real socket.
        tokio::task::yield_now().await;
        self.handle(request)
    }

    async fn post_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<JsonResponse, TransportError> {
        let mut state = self.lock();
        if state.offline {
            return Err(TransportError::Network("connection refused".into()));
        }
        let authenticated = request
            .cookie
            .as_ref()
            .is_some_and(|cookie| state.sessions.contains(cookie));
        let body = if authenticated {
            json!({
                "success": true,
                "files": [format!("/tmp/delugeweb-x1y2/{}", request.file_name)],
            })
        } else {
            json!({"success": false, "files": []})
        };
        state.uploads.push(request);
        Ok(JsonResponse {
            body,
            set_cookies: Vec::new(),
        })
    }
}
