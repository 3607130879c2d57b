//! Admin users API.

use crate::client::PameClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::{ApiReply, NewUser, User, UserUpdate};

/// Admin users API client.
pub struct UsersApi {
    client: PameClient,
}

impl UsersApi {
    pub(crate) fn new(client: PameClient) -> Self {
        Self { client }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: u64) -> Result<User> {
        let reply: ApiReply<User> = self
            .client
            .send_json(ApiRequest::get(format!("/api/v1/admin/user/{}", id)))
            .await?;
        reply.into_result()
    }

    /// Create a user.
    pub async fn create(&self, user: &NewUser) -> Result<serde_json::Value> {
        self.client
            .send_json(ApiRequest::post("/api/v1/admin/user/").json(user)?)
            .await
    }

    /// Update a user.
    pub async fn update(&self, id: u64, update: &UserUpdate) -> Result<serde_json::Value> {
        self.client
            .send_json(ApiRequest::put(format!("/api/v1/admin/user/{}", id)).json(update)?)
            .await
    }
}
