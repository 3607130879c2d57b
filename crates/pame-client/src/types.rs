//! Request and response types for the pame admin API.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Response envelope
// ─────────────────────────────────────────────────────────────────────────────

/// A response body that may or may not be wrapped in the server's
/// `{ status, data, message }` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiReply<T> {
    /// `{ "status": bool, "data": T, "message"?: string }`
    Enveloped {
        status: bool,
        data: T,
        #[serde(default)]
        message: Option<String>,
    },
    /// The payload itself.
    Bare(T),
    /// `{ "status": bool, "message"?: string }` without data.
    Failure {
        status: bool,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T> ApiReply<T> {
    /// Unwrap the payload, turning `status: false` into [`Error::Rejected`].
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiReply::Enveloped {
                status: true, data, ..
            } => Ok(data),
            ApiReply::Bare(data) => Ok(data),
            ApiReply::Enveloped {
                status: false,
                message,
                ..
            }
            | ApiReply::Failure {
                status: false,
                message,
            } => Err(Error::Rejected(
                message.unwrap_or_else(|| "request rejected".to_string()),
            )),
            ApiReply::Failure { status: true, .. } => Err(Error::InvalidResponse(
                "successful envelope without data".to_string(),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reference to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub email: String,
}

/// Successful login payload.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Role assigned to self-registered users.
pub const DEFAULT_ROLE: &str = "UserStandard";

/// `POST /api/v1/auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// `POST /api/v1/auth/refresh-token` body.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// `POST /api/v1/auth/refresh-token` response.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    /// Required, but may be `null`. A body without the field is not a token
    /// reply, so a `{status, message}` rejection never parses as one.
    #[serde(deserialize_with = "Option::deserialize")]
    pub access_token: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Password reset
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/forgot-password` body.
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// `POST /api/v1/auth/verify-code` body.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// `POST /api/v1/auth/verify-code` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    pub reset_token: String,
}

/// `POST /api/v1/auth/reset-password` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin users
// ─────────────────────────────────────────────────────────────────────────────

/// A managed user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub email: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// `POST /api/v1/admin/user/` body.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub status: bool,
    pub role: String,
}

impl NewUser {
    /// Active standard user.
    pub fn standard(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            status: true,
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// `PUT /api/v1/admin/user/{id}` body. The password is only sent when it
/// changes.
#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub email: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
