//! Auth API.

use crate::client::PameClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{
    ApiReply, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest,
};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const REFRESH_TOKEN_PATH: &str = "/api/v1/auth/refresh-token";
pub const LOGOUT_PATH: &str = "/api/v1/auth/logout";

/// Auth API client.
///
/// These calls manage credentials themselves and are never refreshed by
/// the auth interceptor.
pub struct AuthApi {
    client: PameClient,
}

impl AuthApi {
    pub(crate) fn new(client: PameClient) -> Self {
        Self { client }
    }

    /// Exchange email and password for tokens.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let reply: ApiReply<LoginResponse> = self
            .client
            .send_json(ApiRequest::post(LOGIN_PATH).json(request)?)
            .await?;
        reply.into_result()
    }

    /// Create an account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value> {
        self.client
            .send_json(ApiRequest::post(REGISTER_PATH).skip_auth().json(request)?)
            .await
    }

    /// Trade a refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when the token comes back `null` or empty; a
    /// `status: false` reply is an `Error::Rejected` carrying its message.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Option<String>> {
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        let reply: ApiReply<RefreshTokenResponse> = self
            .client
            .send_json(ApiRequest::post(REFRESH_TOKEN_PATH).no_refresh().json(&body)?)
            .await?;

        Ok(reply
            .into_result()?
            .access_token
            .filter(|t| !t.is_empty()))
    }

    /// End the server-side session. `access_token` is attached explicitly
    /// since the logout path is excluded from automatic injection.
    pub async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        let mut request = ApiRequest::post(LOGOUT_PATH).no_refresh();
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            request = request.bearer(token);
        }
        self.client.send(request).await?;
        Ok(())
    }
}
