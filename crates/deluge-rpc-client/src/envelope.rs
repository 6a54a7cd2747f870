//! JSON-RPC envelope framing for the Deluge Web UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use deluge_rpc_types::DelugeError;

/// Error code the Web UI uses for "Not authenticated".
pub const AUTH_REQUIRED_CODE: i64 = 1;

/// Error code the Web UI uses for "Unknown method". Daemon methods are only registered while
/// the Web UI is attached to a host, so a detached Web UI answers them with this code.
pub(crate) const UNKNOWN_METHOD_CODE: i64 = 2;

/// Outbound envelope. `params` are positional and order matters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub(crate) id: u64,
    pub(crate) method: &'a str,
    pub(crate) params: &'a [Value],
}

/// Inbound envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub(crate) id: Option<u64>,
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<RpcErrorBody>,
}

/// Structured error reported by the daemon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RpcErrorBody {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) code: i64,
}

impl RpcResponse {
    /// Unwraps the envelope of the response to request `expected_id`.
    pub(crate) fn into_result(self, expected_id: u64) -> Result<Value, DelugeError> {
        if self.id != Some(expected_id) {
            return Err(DelugeError::Transport(format!(
                "response id {} does not match request id {expected_id}",
                self.id
                    .map_or_else(|| "null".to_string(), |id| id.to_string())
            )));
        }
        match self.error {
            Some(error) => Err(DelugeError::Rpc {
                message: error.message,
                code: error.code,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Whether `err` is the daemon asking for (re-)authentication.
pub(crate) fn is_auth_required(err: &DelugeError) -> bool {
    matches!(err, DelugeError::Rpc { code, .. } if *code == AUTH_REQUIRED_CODE)
}

/// Whether `err` is what the Web UI answers when no daemon host is attached.
pub(crate) fn is_host_missing(err: &DelugeError) -> bool {
    matches!(err, DelugeError::Rpc { code, .. } if *code == UNKNOWN_METHOD_CODE)
}
