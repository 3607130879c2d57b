//! Password reset API.
//!
//! Three unauthenticated steps: request a code by email, trade the code for
//! a reset token, then set the new password with that token.

use crate::client::PameClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{
    ApiReply, ForgotPasswordRequest, ResetPasswordRequest, VerifyCodeRequest, VerifyCodeResponse,
};

const FORGOT_PASSWORD_PATH: &str = "/api/v1/auth/forgot-password";
const VERIFY_CODE_PATH: &str = "/api/v1/auth/verify-code";
const RESET_PASSWORD_PATH: &str = "/api/v1/auth/reset-password";

/// Password reset API client.
pub struct PasswordApi {
    client: PameClient,
}

impl PasswordApi {
    pub(crate) fn new(client: PameClient) -> Self {
        Self { client }
    }

    /// Email a security code to `email`.
    pub async fn request_reset(&self, email: &str) -> Result<()> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.client
            .send(ApiRequest::post(FORGOT_PASSWORD_PATH).skip_auth().json(&body)?)
            .await?;
        Ok(())
    }

    /// Verify the emailed code; returns the reset token.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<String> {
        let body = VerifyCodeRequest {
            email: email.to_string(),
            code: code.trim().to_string(),
        };
        let reply: ApiReply<VerifyCodeResponse> = self
            .client
            .send_json(ApiRequest::post(VERIFY_CODE_PATH).skip_auth().json(&body)?)
            .await?;
        Ok(reply.into_result()?.reset_token)
    }

    /// Set a new password using a verified reset token.
    pub async fn reset(&self, email: &str, reset_token: &str, new_password: &str) -> Result<()> {
        let body = ResetPasswordRequest {
            email: email.to_string(),
            reset_token: reset_token.to_string(),
            new_password: new_password.to_string(),
        };
        self.client
            .send(ApiRequest::post(RESET_PASSWORD_PATH).skip_auth().json(&body)?)
            .await?;
        Ok(())
    }
}
