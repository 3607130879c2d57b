//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

use crate::api::{AuthApi, PasswordApi, UsersApi};
use crate::auth::{AuthInterceptor, AuthOptions, SharedAuthHooks};
use crate::error::{Error, ErrorResponse, Result};
use crate::request::ApiRequest;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// pame admin API client.
///
/// Cheap to clone; clones share the connection pool and the attached auth
/// interceptors.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pame_client::{AuthOptions, MemoryCredentialStore, PameClient, SessionManager};
///
/// # async fn example() -> pame_client::Result<()> {
/// let client = PameClient::builder()
///     .base_url("http://127.0.0.1:4000")
///     .build()?;
///
/// let session = Arc::new(SessionManager::new(Arc::new(MemoryCredentialStore::new())));
/// client.attach_auth(session.clone(), AuthOptions::default());
///
/// session.sign_in(&client, "admin@example.com", "secret").await?;
/// let user = client.users().get(7).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PameClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Attached auth interceptors, if any.
    auth: RwLock<Option<Arc<AuthInterceptor>>>,
}

impl std::fmt::Debug for PameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PameClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("auth_attached", &self.is_auth_attached())
            .finish()
    }
}

impl PameClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth attachment
    // ─────────────────────────────────────────────────────────────────────────

    /// Install the auth interceptors, replacing any previous attachment.
    ///
    /// The new attachment starts with no refresh in flight.
    pub fn attach_auth(&self, hooks: SharedAuthHooks, options: AuthOptions) {
        let interceptor = Arc::new(AuthInterceptor::new(hooks, options));
        *self.inner.auth.write() = Some(interceptor);
        tracing::debug!("auth interceptors attached");
    }

    /// Remove the auth interceptors. Returns whether any were attached.
    ///
    /// Requests already inside a refresh cycle finish against the detached
    /// interceptors.
    pub fn detach_auth(&self) -> bool {
        let detached = self.inner.auth.write().take().is_some();
        if detached {
            tracing::debug!("auth interceptors detached");
        }
        detached
    }

    /// Whether auth interceptors are attached.
    pub fn is_auth_attached(&self) -> bool {
        self.inner.auth.read().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the password-reset API.
    pub fn password(&self) -> PasswordApi {
        PasswordApi::new(self.clone())
    }

    /// Access the admin users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request through the auth interceptors (when attached).
    ///
    /// Non-2xx responses are returned as errors.
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response> {
        let auth = self.inner.auth.read().clone();
        match auth {
            Some(auth) => auth.send(self, request).await,
            None => self.dispatch(&request).await,
        }
    }

    /// Send a request and decode the JSON body.
    ///
    /// An empty body decodes as JSON `null`.
    pub async fn send_json<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Issue one HTTP call exactly as described, without interception.
    pub(crate) async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let url = self.url(request.path())?;
        tracing::debug!(method = %request.method(), path = request.path(), "dispatching request");

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone())
            .timeout(self.inner.timeout);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.json::<ErrorResponse>().await.unwrap_or_default();
        let message = body.message.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
            StatusCode::NOT_FOUND => Error::NotFound(message),
            _ => Error::Api {
                status: status.as_u16(),
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message,
            },
        }
    }
}

/// Builder for creating a PameClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PameClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("pame-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(PameClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                auth: RwLock::new(None),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
