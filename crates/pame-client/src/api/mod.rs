//! API endpoint implementations.

mod auth;
mod password;
mod users;

pub use auth::{AuthApi, LOGIN_PATH, LOGOUT_PATH, REFRESH_TOKEN_PATH, REGISTER_PATH};
pub use password::PasswordApi;
pub use users::UsersApi;
