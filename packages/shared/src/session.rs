//! Session configuration for talking to the geolive backend.
//!
//! A [`Session`] carries the REST base URL and the optional bearer token. It is
//! created at login, passed explicitly to whatever builds snapshot fetchers and
//! stream channels, and dropped at logout. [`SessionContext`] is the single
//! process-wide slot holding the current session between those two points.

use std::sync::{Arc, RwLock};

use reqwest::Url;
use thiserror::Error;

/// Stream base used when the REST base cannot be mapped to a WebSocket origin.
pub const DEFAULT_WS_BASE: &str = "ws://localhost:8000";

/// Default REST base URL of the backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

static CURRENT_SESSION: RwLock<Option<Arc<Session>>> = RwLock::new(None);

/// Session-related errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The API base URL could not be parsed
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Connection settings of one logged-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    api_base: Url,
    token: Option<String>,
}

impl Session {
    /// Create a session from a REST base URL and an optional bearer token.
    ///
    /// Empty tokens are treated as absent.
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self, SessionError> {
        let api_base = Url::parse(api_base).map_err(|e| SessionError::InvalidBaseUrl {
            url: api_base.to_string(),
            reason: e.to_string(),
        })?;
        let token = token.filter(|t| !t.is_empty());
        Ok(Self { api_base, token })
    }

    /// REST base URL
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Bearer token, if logged in with one
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Value of the `Authorization` header for REST requests.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Build an absolute REST URL for `path`, relative to the base URL.
    pub fn api_url(&self, path: &str) -> Result<Url, SessionError> {
        let joined = format!(
            "{}/{}",
            self.api_base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| SessionError::InvalidBaseUrl {
            url: joined,
            reason: e.to_string(),
        })
    }

    /// WebSocket origin matching the REST base (`https` maps to `wss`).
    ///
    /// Falls back to [`DEFAULT_WS_BASE`] when the base has no host or uses a
    /// scheme other than http(s).
    pub fn ws_base(&self) -> String {
        let scheme = match self.api_base.scheme() {
            "https" => "wss",
            "http" => "ws",
            _ => return DEFAULT_WS_BASE.to_string(),
        };
        match (self.api_base.host_str(), self.api_base.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", scheme, host, port),
            (Some(host), None) => format!("{}://{}", scheme, host),
            (None, _) => DEFAULT_WS_BASE.to_string(),
        }
    }
}

/// Process-wide holder of the current session.
///
/// `begin` is called at login and `end` at logout. Consumers read the session
/// once with [`SessionContext::current`] when they construct a feed, never on
/// every request.
pub struct SessionContext;

impl SessionContext {
    /// Install `session` as the current session, replacing any previous one.
    pub fn begin(session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let mut slot = CURRENT_SESSION.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(session.clone());
        tracing::debug!("Session started for {}", session.api_base());
        session
    }

    /// Tear down the current session.
    pub fn end() {
        let mut slot = CURRENT_SESSION.write().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            tracing::debug!("Session ended");
        }
    }

    /// The current session, if one is active.
    pub fn current() -> Option<Arc<Session>> {
        CURRENT_SESSION
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
