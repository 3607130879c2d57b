//! Outgoing request descriptors.
//!
//! An [`ApiRequest`] is a replayable description of one HTTP call: the auth
//! interceptor may send the same descriptor twice (once with the old token,
//! once with a refreshed one), so bodies are held as JSON values rather than
//! as one-shot streams.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::{Error, Result};

/// Per-request auth flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Never inject a token and never trigger a refresh.
    pub skip_auth: bool,
    /// Inject a token but never trigger a refresh on 401.
    pub no_refresh: bool,
    /// Already replayed once after a refresh; a second 401 is final.
    pub retried: bool,
}

/// A replayable HTTP request against the API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
    flags: RequestFlags,
}

impl ApiRequest {
    /// Create a request for `path` (e.g. `/api/v1/admin/user/7`).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            flags: RequestFlags::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append a query parameter.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::Config(format!("invalid value for header {}", name)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Opt this request out of token injection and refresh.
    pub fn skip_auth(mut self) -> Self {
        self.flags.skip_auth = true;
        self
    }

    /// Keep token injection but never refresh on 401.
    pub fn no_refresh(mut self) -> Self {
        self.flags.no_refresh = true;
        self
    }

    /// Attach `Authorization: Bearer <token>` explicitly.
    pub fn bearer(mut self, token: &str) -> Self {
        self.set_bearer(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn flags(&self) -> RequestFlags {
        self.flags
    }

    /// The bearer token currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Returns false (and leaves headers untouched) if the token is not a
    /// valid header value.
    pub(crate) fn set_bearer(&mut self, token: &str) -> bool {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
                true
            }
            Err(_) => {
                tracing::warn!(path = %self.path, "access token is not a valid header value");
                false
            }
        }
    }

    pub(crate) fn mark_retried(&mut self) {
        self.flags.retried = true;
    }
}
