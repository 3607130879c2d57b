//! Signed-in session state.
//!
//! [`SessionManager`] keeps the access token, refresh token and user email
//! in memory for synchronous reads and mirrors every change into a
//! [`CredentialStore`]. On a cold start the store is the source of truth
//! ([`SessionManager::load`]); once loaded, memory is authoritative.
//!
//! It is also the client's [`AuthHooks`]: it hands out the current token,
//! performs refreshes, and signs out when a refresh fails.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::auth::AuthHooks;
use crate::client::PameClient;
use crate::error::Result;
use crate::store::{CredentialKey, SharedCredentialStore};
use crate::types::{LoginRequest, RegisterRequest, UserRef};

/// In-memory copy of the persisted credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_email: Option<String>,
}

impl Session {
    /// A user and an access token are both present.
    pub fn is_signed_in(&self) -> bool {
        self.user_email.is_some() && self.access_token.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user_email", &self.user_email)
            .finish()
    }
}

/// Session owner and auth hooks for a [`PameClient`].
#[derive(Debug)]
pub struct SessionManager {
    store: SharedCredentialStore,
    session: RwLock<Session>,
}

impl SessionManager {
    /// Create an empty session backed by `store`. Call [`Self::load`] to pick
    /// up persisted credentials.
    pub fn new(store: SharedCredentialStore) -> Self {
        Self {
            store,
            session: RwLock::new(Session::default()),
        }
    }

    /// Read all persisted credentials into memory.
    pub async fn load(&self) -> Session {
        let access_token = self.store.get(CredentialKey::AccessToken).await;
        let refresh_token = self.store.get(CredentialKey::RefreshToken).await;
        let user_email = self.store.get(CredentialKey::UserEmail).await;

        let loaded = Session {
            access_token,
            refresh_token,
            user_email,
        };
        *self.session.write() = loaded.clone();
        debug!(signed_in = loaded.is_signed_in(), "session loaded");
        loaded
    }

    /// Snapshot of the in-memory session.
    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_signed_in()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<UserRef> {
        self.session
            .read()
            .user_email
            .clone()
            .map(|email| UserRef { email })
    }

    /// Current access token: memory first, then the store.
    pub async fn access_token(&self) -> Option<String> {
        self.cached_or_stored(CredentialKey::AccessToken).await
    }

    /// Current refresh token: memory first, then the store.
    pub async fn refresh_token(&self) -> Option<String> {
        self.cached_or_stored(CredentialKey::RefreshToken).await
    }

    async fn cached_or_stored(&self, key: CredentialKey) -> Option<String> {
        if let Some(value) = self.field(key) {
            return Some(value);
        }

        let stored = self.store.get(key).await?;
        let mut session = self.session.write();
        let slot = Self::slot(&mut session, key);
        if slot.is_none() {
            *slot = Some(stored.clone());
        }
        Some(stored)
    }

    fn field(&self, key: CredentialKey) -> Option<String> {
        let session = self.session.read();
        match key {
            CredentialKey::AccessToken => session.access_token.clone(),
            CredentialKey::RefreshToken => session.refresh_token.clone(),
            CredentialKey::UserEmail => session.user_email.clone(),
        }
    }

    fn slot(session: &mut Session, key: CredentialKey) -> &mut Option<String> {
        match key {
            CredentialKey::AccessToken => &mut session.access_token,
            CredentialKey::RefreshToken => &mut session.refresh_token,
            CredentialKey::UserEmail => &mut session.user_email,
        }
    }

    /// Sign in with email and password and persist the returned tokens.
    ///
    /// The stored email is the one the server reports, falling back to the
    /// one supplied. A refresh token is only replaced if the server sent one.
    pub async fn sign_in(&self, client: &PameClient, email: &str, password: &str) -> Result<UserRef> {
        let response = client
            .auth()
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let user_email = response
            .user
            .map(|u| u.email)
            .unwrap_or_else(|| email.to_string());

        self.store
            .set(CredentialKey::AccessToken, &response.access_token)
            .await;
        self.store.set(CredentialKey::UserEmail, &user_email).await;
        if let Some(refresh) = &response.refresh_token {
            self.store.set(CredentialKey::RefreshToken, refresh).await;
        }

        {
            let mut session = self.session.write();
            session.access_token = Some(response.access_token);
            session.refresh_token = response.refresh_token;
            session.user_email = Some(user_email.clone());
        }

        info!(user = %user_email, "signed in");
        Ok(UserRef { email: user_email })
    }

    /// End the session. The server call is best-effort; local credentials
    /// are always cleared.
    pub async fn sign_out(&self, client: &PameClient) {
        let token = self.session.read().access_token.clone();
        if let Err(e) = client.auth().logout(token.as_deref()).await {
            debug!(error = %e, "logout request failed, clearing credentials anyway");
        }

        for key in CredentialKey::ALL {
            self.store.delete(key).await;
        }
        *self.session.write() = Session::default();
        info!("signed out");
    }

    /// Register a new account.
    pub async fn register(
        &self,
        client: &PameClient,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<serde_json::Value> {
        client
            .auth()
            .register(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                role: role.to_string(),
            })
            .await
    }

    /// Obtain a new access token with the stored refresh token.
    ///
    /// `Ok(None)` when there is no refresh token or the server returned no
    /// access token.
    pub async fn refresh_access_token(&self, client: &PameClient) -> Result<Option<String>> {
        let Some(refresh_token) = self.refresh_token().await else {
            debug!("no refresh token available");
            return Ok(None);
        };

        let Some(access_token) = client.auth().refresh_token(&refresh_token).await? else {
            return Ok(None);
        };

        self.store
            .set(CredentialKey::AccessToken, &access_token)
            .await;
        self.session.write().access_token = Some(access_token.clone());
        Ok(Some(access_token))
    }
}

#[async_trait]
impl AuthHooks for SessionManager {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(SessionManager::access_token(self).await)
    }

    async fn refresh_access_token(&self, client: &PameClient) -> Result<Option<String>> {
        SessionManager::refresh_access_token(self, client).await
    }

    async fn on_unauthorized(&self, client: &PameClient) {
        self.sign_out(client).await;
    }
}
