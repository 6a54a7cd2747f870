//! Per-client session state: credentials, session cookie, flags and the request-id counter.

use std::{
    fmt,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

/// Name of the cookie the Web UI issues on login.
pub(crate) const SESSION_COOKIE: &str = "_session_id";

/// Session owned by exactly one client.
///
/// Request ids come from an atomic counter so concurrent calls never share an id. The other
/// fields sit behind a mutex that is never held across an `.await`.
pub(crate) struct Session {
    last_id: AtomicU64,
    state: Mutex<SessionState>,
}

#[derive(Clone, Default, PartialEq, Eq)]
struct SessionState {
    password: String,
    cookie: Option<String>,
    authenticated: bool,
    host_connected: bool,
}

impl Session {
    pub(crate) fn new(password: impl Into<String>) -> Self {
        Self {
            last_id: AtomicU64::new(0),
            state: Mutex::new(SessionState {
                password: password.into(),
                ..Default::default()
            }),
        }
    }

    /// Consumes and returns the next request id. The first id is 1.
    pub(crate) fn next_request_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued request id, 0 before the first request.
    pub(crate) fn last_request_id(&self) -> u64 {
        self.last_id.load(Ordering::SeqCst)
    }

    pub(crate) fn password(&self) -> String {
        self.lock().password.clone()
    }

    pub(crate) fn set_password(&self, password: impl Into<String>) {
        self.lock().password = password.into();
    }

    pub(crate) fn cookie(&self) -> Option<String> {
        self.lock().cookie.clone()
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.lock().authenticated
    }

    pub(crate) fn is_host_connected(&self) -> bool {
        self.lock().host_connected
    }

    /// Replaces the stored cookie with the session cookie found in `set_cookies`, if any.
    pub(crate) fn refresh_cookie(&self, set_cookies: &[String]) {
        if let Some(cookie) = set_cookies.iter().find_map(|raw| session_cookie(raw)) {
            self.lock().cookie = Some(cookie);
        }
    }

    pub(crate) fn mark_authenticated(&self, password: String) {
        let mut state = self.lock();
        state.password = password;
        state.authenticated = true;
    }

    pub(crate) fn mark_host_connected(&self) {
        self.lock().host_connected = true;
    }

    pub(crate) fn clear_host(&self) {
        self.lock().host_connected = false;
    }

    /// Forgets the cookie and both flags. The password and the id counter are kept.
    pub(crate) fn clear_auth(&self) {
        let mut state = self.lock();
        state.cookie = None;
        state.authenticated = false;
        state.host_connected = false;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        // Never print credentials.
        f.debug_struct("Session")
            .field("last_id", &self.last_request_id())
            .field("cookie", &state.cookie.as_ref().map(|_| "<set>"))
            .field("authenticated", &state.authenticated)
            .field("host_connected", &state.host_connected)
            .finish_non_exhaustive()
    }
}

/// Extracts `_session_id=<value>` from one `Set-Cookie` header value.
///
/// An empty value (the daemon expiring the cookie) yields `None`.
fn session_cookie(raw: &str) -> Option<String> {
    let pair = raw.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let value = value.trim().trim_matches('"');
    if !name.trim().eq_ignore_ascii_case(SESSION_COOKIE) || value.is_empty() {
        return None;
    }
    Some(format!("{SESSION_COOKIE}={value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_start_at_one_and_increase() {
        let session = Session::new("deluge");
        assert_eq!(session.last_request_id(), 0);
        assert_eq!(session.next_request_id(), 1);
        assert_eq!(session.next_request_id(), 2);
        assert_eq!(session.last_request_id(), 2);
    }

    #[test]
    fn parses_session_cookie() {
        assert_eq!(
            session_cookie("_session_id=abc123; Expires=Tue, 01 Jan 2030 00:00:00 GMT; Path=/json"),
            Some("_session_id=abc123".into())
        );
        assert_eq!(session_cookie("other=1; Path=/"), None);
        assert_eq!(session_cookie("_session_id=; Max-Age=0"), None);
        assert_eq!(session_cookie("garbage"), None);
    }

    #[test]
    fn refresh_keeps_cookie_when_none_is_sent() {
        let session = Session::new("deluge");
        session.refresh_cookie(&["_session_id=first; Path=/json".into()]);
        session.refresh_cookie(&[]);
        assert_eq!(session.cookie().as_deref(), Some("_session_id=first"));
        session.refresh_cookie(&["x=y".into(), "_session_id=second".into()]);
        assert_eq!(session.cookie().as_deref(), Some("_session_id=second"));
    }

    #[test]
    fn clear_auth_keeps_password_and_counter() {
        let session = Session::new("deluge");
        session.next_request_id();
        session.refresh_cookie(&["_session_id=abc".into()]);
        session.mark_authenticated("secret".into());
        session.mark_host_connected();

        session.clear_auth();

        assert_eq!(session.cookie(), None);
        assert!(!session.is_authenticated());
        assert!(!session.is_host_connected());
        assert_eq!(session.password(), "secret");
        assert_eq!(session.last_request_id(), 1);
    }

    #[test]
    fn debug_hides_secrets() {
        let session = Session::new("hunter2");
        session.refresh_cookie(&["_session_id=topsecret".into()]);
        let printed = format!("{session:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("topsecret"));
    }
}
