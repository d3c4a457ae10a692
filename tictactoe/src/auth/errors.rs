//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// JWT encoding error
    #[error("JWT error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Malformed email address
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Unacceptable password
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    /// Email already registered
    #[error("User already exists")]
    DuplicateUser,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token failed verification, or was superseded or revoked
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Access token failed verification
    #[error("Invalid access token")]
    InvalidAccessToken,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Store(_) | AuthError::HashingFailed => "Internal server error".to_string(),
            AuthError::Token(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error stems from the server rather than the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Store(_) | AuthError::HashingFailed | AuthError::Token(_)
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_sanitizes_storage() {
        let err = AuthError::Store(StoreError::Corrupt("users.id=4".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_internal());
    }

    #[test]
    fn test_client_message_passes_domain_errors() {
        assert_eq!(AuthError::DuplicateUser.client_message(), "User already exists");
        assert_eq!(
            AuthError::InvalidCredentials.client_message(),
            "Invalid credentials"
        );
        assert!(!AuthError::InvalidRefreshToken.is_internal());
    }
}
