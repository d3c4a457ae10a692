//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ID type
pub type UserId = i64;

/// Aggregate win/loss/draw counters. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
}

/// User model
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub stats: GameStats,
    /// The single live refresh token; `None` after logout or before first login.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Access/refresh token pair issued on login and on refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT claims carried by both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,           // User ID
    pub email: String,
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
    pub jti: String,           // Unique per token, so rotation never re-mints an identical string
}

/// Signing secrets and password pepper
#[derive(Debug, Clone)]
pub struct AuthSecrets {
    /// HS256 key for access tokens
    pub access_secret: String,
    /// HS256 key for refresh tokens; must differ from `access_secret`
    pub refresh_secret: String,
    /// Server-side pepper appended to passwords before hashing
    pub pepper: String,
}

impl AuthSecrets {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        pepper: impl Into<String>,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            pepper: pepper.into(),
        }
    }
}
