//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AuthSecrets, TokenClaims, TokenPair, User, UserId},
};
use crate::db::{StoreError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    secrets: AuthSecrets,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `secrets` - Access/refresh signing secrets and password pepper
    ///
    /// # Returns
    ///
    /// * `AuthManager` - New authentication manager instance with 5-minute
    ///   access tokens and 7-day refresh tokens
    pub fn new(users: Arc<dyn UserRepository>, secrets: AuthSecrets) -> Self {
        Self {
            users,
            secrets,
            access_token_duration: Duration::minutes(5),
            refresh_token_duration: Duration::days(7),
        }
    }

    /// Override the token lifetimes
    pub fn with_token_durations(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_token_duration = access;
        self.refresh_token_duration = refresh;
        self
    }

    /// Register a new user
    ///
    /// # Arguments
    ///
    /// * `email` - Email address; compared case-insensitively
    /// * `password` - Plain-text password
    ///
    /// # Returns
    ///
    /// * `AuthResult<User>` - Created user with zeroed stats, or error
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email format invalid
    /// * `AuthError::InvalidPassword` - Password empty
    /// * `AuthError::DuplicateUser` - Email already registered
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hash_password(password)?;

        // A concurrent registration can still win the race to the unique index.
        let user = match self.users.create_user(&email, &password_hash).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => return Err(AuthError::DuplicateUser),
            Err(e) => return Err(e.into()),
        };

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Login a user
    ///
    /// Issues a fresh token pair and stores the refresh token on the user
    /// record, replacing any previous one. Earlier refresh tokens stop working.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(User, TokenPair)> {
        let email = normalize_email(email);

        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.verify_password(password, &user.password_hash)?;

        let tokens = self.issue_tokens(user.id, &user.email)?;
        self.users
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;
        user.refresh_token = Some(tokens.refresh_token.clone());

        debug!("User {} logged in", user.id);
        Ok((user, tokens))
    }

    /// Rotate a refresh token
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The most recently issued refresh token
    ///
    /// # Returns
    ///
    /// * `AuthResult<TokenPair>` - New access and refresh tokens
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidRefreshToken` - Signature or expiry invalid, user
    ///   gone, or the token is not the one currently stored for the user
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.verify_refresh_token(refresh_token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let matches = user
            .refresh_token
            .as_deref()
            .map(|stored| bool::from(stored.as_bytes().ct_eq(refresh_token.as_bytes())))
            .unwrap_or(false);
        if !matches {
            return Err(AuthError::InvalidRefreshToken);
        }

        let tokens = self.issue_tokens(user.id, &user.email)?;
        self.users
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        Ok(tokens)
    }

    /// Logout user by clearing the stored refresh token
    ///
    /// Outstanding access tokens keep working until they expire.
    pub async fn logout(&self, user_id: UserId) -> AuthResult<()> {
        self.users.set_refresh_token(user_id, None).await?;
        debug!("User {} logged out", user_id);
        Ok(())
    }

    /// Verify an access token
    ///
    /// # Returns
    ///
    /// * `AuthResult<TokenClaims>` - Decoded claims or `AuthError::InvalidAccessToken`
    pub fn verify_access(&self, token: &str) -> AuthResult<TokenClaims> {
        decode_claims(token, &self.secrets.access_secret).ok_or(AuthError::InvalidAccessToken)
    }

    fn verify_refresh_token(&self, token: &str) -> AuthResult<TokenClaims> {
        decode_claims(token, &self.secrets.refresh_secret).ok_or(AuthError::InvalidRefreshToken)
    }

    fn issue_tokens(&self, user_id: UserId, email: &str) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(
                user_id,
                email,
                self.access_token_duration,
                &self.secrets.access_secret,
            )?,
            refresh_token: self.sign(
                user_id,
                email,
                self.refresh_token_duration,
                &self.secrets.refresh_secret,
            )?,
        })
    }

    fn sign(
        &self,
        user_id: UserId,
        email: &str,
        lifetime: Duration,
        secret: &str,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id,
            email: email.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.secrets.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.secrets.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

fn decode_claims(token: &str, secret: &str) -> Option<TokenClaims> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::InvalidEmail("Email is required".to_string()));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidEmail(
            "Email cannot contain whitespace".to_string(),
        ));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(AuthError::InvalidEmail(
            "Email must look like name@domain".to_string(),
        )),
    }
}

/// Validate password presence
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(AuthError::InvalidPassword("Password is required".to_string()));
    }
    Ok(())
}
