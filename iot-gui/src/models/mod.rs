pub mod auth;
pub mod requests;
pub mod views;

pub use auth::{AuthToken, RefreshToken, REFRESH_COOKIE, TOKEN_COOKIE};
