//! Authenticated HTTP client SDK for the pame admin API.
//!
//! The client attaches the current access token to every request and, when
//! the server answers 401, recovers transparently: one refresh call is made
//! no matter how many requests failed at once, and every failed request is
//! replayed once with the new token. If the refresh fails, all waiting
//! requests fail with the same [`RefreshError`] and the session is signed
//! out.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pame_client::{AuthOptions, FileCredentialStore, PameClient, SessionManager};
//!
//! # async fn example() -> pame_client::Result<()> {
//! let client = PameClient::builder()
//!     .base_url("http://127.0.0.1:4000")
//!     .build()?;
//!
//! let store = Arc::new(FileCredentialStore::new(std::path::Path::new("/tmp/pame")));
//! let session = Arc::new(SessionManager::new(store));
//! session.load().await;
//! client.attach_auth(session.clone(), AuthOptions::default());
//!
//! if !session.is_signed_in() {
//!     session.sign_in(&client, "admin@example.com", "secret").await?;
//! }
//!
//! let user = client.users().get(7).await?;
//! println!("{} active={}", user.email, user.status);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Auth**: login, register, refresh token, logout
//! - **Password**: forgot password, verify code, reset password
//! - **Users**: get, create, update

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod request;
pub mod session;
pub mod store;
pub mod types;

pub use auth::{AuthHooks, AuthOptions, PathMatcher, SharedAuthHooks};
pub use client::{ClientBuilder, PameClient};
pub use error::{Error, RefreshError, Result};
pub use request::{ApiRequest, RequestFlags};
pub use session::{Session, SessionManager};
pub use store::{
    CredentialKey, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    SharedCredentialStore,
};
pub use types::*;
