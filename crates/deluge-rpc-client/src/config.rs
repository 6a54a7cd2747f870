//! Client configuration.

use std::{env, fmt, time::Duration};

use url::Url;

use deluge_rpc_types::DelugeError;

/// Web UI address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8112/";
/// Stock Web UI password.
pub const DEFAULT_PASSWORD: &str = "deluge";
/// Transport timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the [`DelugeClient`](crate::DelugeClient).
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Web UI root, e.g. `http://localhost:8112/`.
    pub base_url: Url,
    /// Web UI password.
    pub password: String,
    /// Daemon host to attach to. `None` picks the first host the Web UI knows.
    pub host_id: Option<String>,
    /// Log in and attach to a host on demand before the first call, and re-login once when the
    /// session expires.
    pub auto_login: bool,
    /// Timeout applied by the HTTP transport.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for the Web UI at `base_url` with every other setting at its default.
    pub fn new(base_url: &str) -> Result<Self, DelugeError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DelugeError::Input(format!("invalid base URL {base_url}: {e}")))?;
        Ok(Self {
            base_url,
            password: DEFAULT_PASSWORD.to_string(),
            host_id: None,
            auto_login: true,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Tries to read the configuration from the environment:
    /// `DELUGE_URL`, `DELUGE_PASSWORD`, `DELUGE_HOST_ID`, `DELUGE_AUTO_LOGIN`,
    /// `DELUGE_TIMEOUT_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, DelugeError> {
        let mut config =
            Self::new(&env::var("DELUGE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()))?;
        if let Ok(password) = env::var("DELUGE_PASSWORD") {
            config.password = password;
        }
        config.host_id = env::var("DELUGE_HOST_ID").ok().filter(|id| !id.is_empty());
        if let Ok(raw) = env::var("DELUGE_AUTO_LOGIN") {
            config.auto_login = parse_flag(&raw).ok_or_else(|| {
                DelugeError::Input(format!("DELUGE_AUTO_LOGIN must be true or false, got {raw}"))
            })?;
        }
        if let Ok(raw) = env::var("DELUGE_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| {
                DelugeError::Input(format!("DELUGE_TIMEOUT_SECS must be whole seconds: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the daemon host id.
    pub fn with_host_id(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    /// Enables or disables on-demand login.
    pub fn with_auto_login(mut self, auto_login: bool) -> Self {
        self.auto_login = auto_login;
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print credentials.
        write!(
            f,
            "ClientConfig(base_url=\"{}\", password=<{}>, host_id={:?}, auto_login={}, timeout={:?})",
            self.base_url,
            if self.password.is_empty() {
                "unset"
            } else {
                "set"
            },
            self.host_id,
            self.auto_login,
            self.timeout,
        )
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
