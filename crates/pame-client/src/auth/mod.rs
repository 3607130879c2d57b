//! Bearer-token injection and expired-token recovery.
//!
//! Attach an [`AuthHooks`] implementation to a [`PameClient`] with
//! [`PameClient::attach_auth`]. From then on every request:
//!
//! 1. receives `Authorization: Bearer <token>` unless it opted out or its path
//!    matches [`AuthOptions::exclude_paths`];
//! 2. on a 401, triggers at most one refresh for all concurrently failing
//!    requests, then is replayed once with the new token.

mod interceptor;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::client::PameClient;
use crate::error::{Error, Result};

pub(crate) use interceptor::AuthInterceptor;

/// Paths that never get a token or trigger a refresh unless configured
/// otherwise.
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"(?i)(/auth/login|/auth/refresh-token|/auth/logout)$";

/// Default upper bound on a single refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential callbacks used by the auth interceptor.
#[async_trait]
pub trait AuthHooks: Send + Sync {
    /// Current access token. Errors are treated as "no token".
    async fn access_token(&self) -> Result<Option<String>>;

    /// Obtain a new access token. `Ok(None)` counts as failure.
    ///
    /// Runs at most once at a time per attached client. Requests it issues
    /// through `client` must target an excluded path or opt out of auth.
    async fn refresh_access_token(&self, client: &PameClient) -> Result<Option<String>>;

    /// Called once per failed refresh cycle.
    async fn on_unauthorized(&self, _client: &PameClient) {}
}

/// Shared hooks handle.
pub type SharedAuthHooks = Arc<dyn AuthHooks>;

/// Regex over request paths, query string excluded.
#[derive(Debug, Clone)]
pub struct PathMatcher(Regex);

impl PathMatcher {
    /// Compile a matcher.
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| Error::Config(format!("invalid exclude pattern: {}", e)))
    }

    /// Check a request path.
    pub fn is_match(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        self.0.is_match(path)
    }

    /// The underlying pattern.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_EXCLUDE_PATTERN).expect("default exclude pattern is valid"))
    }
}

/// Options supplied when attaching auth to a client.
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Requests whose path matches are never authenticated or refreshed.
    pub exclude_paths: PathMatcher,
    /// Bound on the refresh call; `None` waits indefinitely.
    pub refresh_timeout: Option<Duration>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            exclude_paths: PathMatcher::default(),
            refresh_timeout: Some(DEFAULT_REFRESH_TIMEOUT),
        }
    }
}

impl AuthOptions {
    pub fn with_exclude_paths(mut self, matcher: PathMatcher) -> Self {
        self.exclude_paths = matcher;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.refresh_timeout = timeout;
        self
    }
}
