//! Authentication module providing registration, login and token management.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - JWT access tokens (5-minute expiry)
//! - Rotating JWT refresh tokens (7-day expiry), one live token per user
//! - Access and refresh tokens signed with distinct secrets
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe::auth::{AuthManager, AuthSecrets};
//! use tictactoe::db::{Database, PgUserRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         AuthSecrets::new("access_secret", "refresh_secret", "pepper"),
//!     );
//!
//!     auth.register("player@example.com", "pw123").await?;
//!     let (user, tokens) = auth.login("player@example.com", "pw123").await?;
//!     println!("Logged in user {}", user.id);
//!
//!     let rotated = auth.refresh(&tokens.refresh_token).await?;
//!     auth.verify_access(&rotated.access_token)?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::{normalize_email, validate_email, validate_password, AuthManager};
pub use models::{AuthSecrets, GameStats, TokenClaims, TokenPair, User, UserId};
