//! Deluge Web UI client: session lifecycle and the RPC caller.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use deluge_rpc_types::DelugeError;

use crate::config::ClientConfig;
use crate::envelope::{RpcRequest, RpcResponse, is_auth_required, is_host_missing};
use crate::method;
use crate::session::Session;
use crate::transport::{HttpTransport, JsonRequest, Transport, TransportError, endpoint};
use crate::wire::DaemonHost;

mod api;

pub use api::QueueDirection;

/// DelugeClient is a torrent daemon client that uses the Deluge Web UI JSON-RPC endpoint.
///
/// Each client owns its session. Operations take `&self` and may run concurrently; request ids
/// stay unique across them.
pub struct DelugeClient<T: Transport = HttpTransport> {
    transport: T,
    rpc_url: Url,
    upload_url: Url,
    host_id: Option<String>,
    auto_login: bool,
    session: Session,
    session_gate: Mutex<()>,
}

impl DelugeClient {
    /// Create a new DelugeClient over HTTP.
    ///
    /// Nothing is sent until the first operation.
    pub fn try_new(config: ClientConfig) -> Result<Self, DelugeError> {
        let transport = HttpTransport::try_new(config.timeout).map_err(map_transport_error)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> DelugeClient<T> {
    /// Create a DelugeClient with a custom transport implementation.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, DelugeError> {
        let rpc_url = endpoint(&config.base_url, "json")
            .map_err(|e| DelugeError::Input(format!("invalid base URL: {e}")))?;
        let upload_url = endpoint(&config.base_url, "upload")
            .map_err(|e| DelugeError::Input(format!("invalid base URL: {e}")))?;

        debug!("Using Deluge Web UI at {}", config.base_url);
        Ok(Self {
            transport,
            rpc_url,
            upload_url,
            host_id: config.host_id,
            auto_login: config.auto_login,
            session: Session::new(config.password),
            session_gate: Mutex::new(()),
        })
    }

    /// The most recently issued request id, 0 before the first request.
    pub fn request_id(&self) -> u64 {
        self.session.last_request_id()
    }

    /// The session cookie currently replayed to the daemon.
    pub fn cookie(&self) -> Option<String> {
        self.session.cookie()
    }

    /// Whether a login succeeded and no logout happened since.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Whether the Web UI was attached to a daemon host by this client.
    pub fn is_connected(&self) -> bool {
        self.session.is_host_connected()
    }

    /// The password used for the next login.
    pub fn password(&self) -> String {
        self.session.password()
    }

    /// Replaces the stored password without contacting the daemon.
    pub fn set_password(&self, password: impl Into<String>) {
        self.session.set_password(password);
    }

    /// Attaches the Web UI to the configured daemon host, or the first one it knows.
    ///
    /// Returns the daemon's raw acknowledgement. With auto-login enabled an unauthenticated
    /// client logs in first. Calling it again does not touch the existing login.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<Value, DelugeError> {
        if self.auto_login && !self.session.is_authenticated() {
            self.login(None).await?;
        }
        self.connect_host().await
    }

    /// Logs in with `password`, or with the stored password when `None`.
    ///
    /// On success the password used becomes the stored one and the refreshed session cookie
    /// replaces any previous one. A rejected login leaves an existing session untouched.
    #[instrument(skip_all)]
    pub async fn login(&self, password: Option<&str>) -> Result<(), DelugeError> {
        let password = password.map_or_else(|| self.session.password(), str::to_string);

        debug!("Logging in to the Web UI");
        let accepted: bool = match self
            .dispatch(method::AUTH_LOGIN, &[json!(password)])
            .await
        {
            Ok(result) => decode(method::AUTH_LOGIN, result)?,
            Err(DelugeError::Rpc { message, .. }) => return Err(DelugeError::Auth(message)),
            Err(err) => return Err(err),
        };
        if !accepted {
            return Err(DelugeError::Auth("the daemon rejected the password".into()));
        }

        self.session.mark_authenticated(password);
        debug!("Logged in");
        Ok(())
    }

    /// Ends the session on the daemon and forgets it locally.
    ///
    /// Returns `true` only when the daemon confirms. Without a session this is a no-op returning
    /// `false`.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<bool, DelugeError> {
        if !self.session.is_authenticated() {
            debug!("Not logged in, nothing to log out");
            return Ok(false);
        }

        let outcome = self.dispatch(method::AUTH_DELETE_SESSION, &[]).await;
        self.session.clear_auth();
        let confirmed: Option<bool> = decode(
            method::AUTH_DELETE_SESSION,
            outcome.map_err(classify_auth)?,
        )?;
        debug!("Logged out, confirmed={confirmed:?}");
        Ok(confirmed.unwrap_or(false))
    }

    /// Detaches the Web UI from its daemon host. The login is kept.
    ///
    /// Local state is always torn down; a daemon that refuses or cannot be reached is only logged.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<bool, DelugeError> {
        let logged_in = self.session.is_authenticated();
        self.session.clear_host();
        if logged_in && let Err(err) = self.dispatch(method::WEB_DISCONNECT, &[]).await {
            warn!("Daemon did not acknowledge the disconnect: {err}");
        }
        debug!("Disconnected from daemon host");
        Ok(true)
    }

    /// Changes the Web UI password, authenticating the change with the stored password.
    ///
    /// The stored password is replaced only after the daemon accepts the change. Any refusal,
    /// including a stale stored password, is an [`DelugeError::Auth`].
    #[instrument(skip_all)]
    pub async fn change_password(&self, new_password: &str) -> Result<(), DelugeError> {
        let current = self.session.password();
        let changed: bool = self
            .invoke(
                method::AUTH_CHANGE_PASSWORD,
                &[json!(current), json!(new_password)],
                false,
            )
            .await
            .and_then(|result| decode(method::AUTH_CHANGE_PASSWORD, result))
            .map_err(|err| match err {
                DelugeError::Rpc { message, .. } => DelugeError::Auth(message),
                other => other,
            })?;
        if !changed {
            return Err(DelugeError::Auth(
                "the daemon refused the password change".into(),
            ));
        }

        self.session.set_password(new_password);
        debug!("Password changed");
        Ok(())
    }

    /// Calls `method` with positional `params` and decodes the result into `R`.
    ///
    /// With auto-login enabled the client first logs in and attaches to a host if needed. An
    /// expired session is renewed once and a lost host attachment is restored once, each followed
    /// by a single replay.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, DelugeError> {
        let result = self.invoke(method, &params, true).await?;
        decode(method, result)
    }

    /// Like [`call`](Self::call), but does not attach the Web UI to a daemon host first.
    pub(crate) async fn call_unattached<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, DelugeError> {
        let result = self.invoke(method, &params, false).await?;
        decode(method, result)
    }

    async fn invoke(
        &self,
        method: &str,
        params: &[Value],
        attach: bool,
    ) -> Result<Value, DelugeError> {
        let mut renewed = false;
        let mut reattached = false;
        loop {
            if self.auto_login {
                self.ensure_session(attach).await?;
            }

            match self.dispatch(method, params).await {
                Err(err) if is_auth_required(&err) => {
                    if !self.auto_login || renewed {
                        return Err(classify_auth(err));
                    }
                    warn!("Session rejected for {method}, logging in again");
                    renewed = true;
                    self.session.clear_auth();
                }
                Err(err) if attach && self.auto_login && !reattached && is_host_missing(&err) => {
                    warn!("Daemon host not attached for {method}, connecting again");
                    reattached = true;
                    self.session.clear_host();
                }
                other => return other,
            }
        }
    }

    /// Logs in and attaches a host as needed. Concurrent callers share one setup.
    async fn ensure_session(&self, attach: bool) -> Result<(), DelugeError> {
        if self.session_ready(attach) {
            return Ok(());
        }

        let _gate = self.session_gate.lock().await;
        if !self.session.is_authenticated() {
            self.login(None).await?;
        }
        if attach && !self.session.is_host_connected() {
            self.connect_host().await?;
        }
        Ok(())
    }

    fn session_ready(&self, attach: bool) -> bool {
        self.session.is_authenticated() && (!attach || self.session.is_host_connected())
    }

    async fn connect_host(&self) -> Result<Value, DelugeError> {
        let host_id = match &self.host_id {
            Some(id) => id.clone(),
            None => {
                let hosts: Vec<DaemonHost> = decode(
                    method::WEB_GET_HOSTS,
                    self.dispatch(method::WEB_GET_HOSTS, &[])
                        .await
                        .map_err(classify_auth)?,
                )?;
                hosts.into_iter().next().map(|host| host.id).ok_or_else(|| {
                    DelugeError::NotFound("the Web UI has no daemon hosts configured".into())
                })?
            }
        };

        debug!("Connecting Web UI to daemon host {host_id}");
        let ack = self
            .dispatch(method::WEB_CONNECT, &[json!(host_id)])
            .await
            .map_err(classify_auth)?;
        self.session.mark_host_connected();
        debug!("Connected to daemon host {host_id}");
        Ok(ack)
    }

    /// One request/response round trip. Consumes exactly one request id.
    async fn dispatch(&self, method: &str, params: &[Value]) -> Result<Value, DelugeError> {
        let id = self.session.next_request_id();
        let body = serde_json::to_value(RpcRequest { id, method, params }).map_err(|e| {
            DelugeError::Transport(format!("failed to encode {method} request: {e}"))
        })?;

        debug!(id, method, "Sending RPC request");
        let response = self
            .transport
            .post_json(JsonRequest {
                url: self.rpc_url.clone(),
                body,
                cookie: self.session.cookie(),
            })
            .await
            .map_err(map_transport_error)?;
        self.session.refresh_cookie(&response.set_cookies);

        let envelope: RpcResponse = serde_json::from_value(response.body).map_err(|e| {
            DelugeError::Transport(format!("malformed response envelope for {method}: {e}"))
        })?;
        let result = envelope.into_result(id);
        if let Err(err) = &result {
            debug!(id, method, "RPC request failed: {err}");
        }
        result
    }
}

impl<T: Transport> fmt::Debug for DelugeClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelugeClient")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("host_id", &self.host_id)
            .field("auto_login", &self.auto_login)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Decodes a call result into the shape the call site expects.
fn decode<R: DeserializeOwned>(method: &str, result: Value) -> Result<R, DelugeError> {
    serde_json::from_value(result)
        .map_err(|e| DelugeError::Transport(format!("unexpected result for {method}: {e}")))
}

/// Turns the daemon's "Not authenticated" error into an [`DelugeError::Auth`].
fn classify_auth(err: DelugeError) -> DelugeError {
    match err {
        DelugeError::Rpc { message, .. } if is_auth_required_message(&message) => {
            DelugeError::Auth(message)
        }
        other if is_auth_required(&other) => DelugeError::Auth(other.to_string()),
        other => other,
    }
}

fn is_auth_required_message(message: &str) -> bool {
    message.eq_ignore_ascii_case("not authenticated")
}

/// Maps transport errors to daemon errors.
fn map_transport_error(err: TransportError) -> DelugeError {
    match err {
        TransportError::Network(msg) => DelugeError::Transport(format!("network error: {msg}")),
        TransportError::Status(status) => {
            DelugeError::Transport(format!("unexpected HTTP status {status}"))
        }
        TransportError::Decode(msg) => DelugeError::Transport(format!("malformed response: {msg}")),
        TransportError::Request(msg) => DelugeError::Transport(format!("invalid request: {msg}")),
    }
}
