//! Authentication service for login and JWT handling
//!
//! Provides:
//! - Login against the shared password
//! - JWT token generation and validation
//! - Resolution of an `Authorization` header into a [CurrentUser]

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError, UserRecord};

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by a login token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID (subject)
    pub sub: String,
    /// Username
    pub username: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

// ============================================================================
// Auth Types
// ============================================================================

/// Identity attached to every GraphQL request.
///
/// Always present in request data; resolvers that need a user check for
/// [CurrentUser::Authenticated].
#[derive(Debug, Clone, Default)]
pub enum CurrentUser {
    Authenticated(UserRecord),
    #[default]
    Anonymous,
}

impl CurrentUser {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            CurrentUser::Authenticated(user) => Some(user),
            CurrentUser::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("wrong credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("user '{0}' no longer exists")]
    UnknownUser(String),

    #[error(transparent)]
    Store(#[from] DbError),
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Password accepted for every user
    pub login_password: String,
    /// Token lifetime in seconds
    pub token_lifetime: i64,
}

impl AuthConfig {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            login_password: config.login_password.clone(),
            token_lifetime: config.token_lifetime_secs,
        }
    }
}

// ============================================================================
// Auth Service
// ============================================================================

/// Extract the token from a `bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let scheme = header.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = header[7..].trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self { db, config }
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Login with username and the shared password
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .db
            .users()
            .get_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if password != self.config.login_password {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok(LoginResult { user, token })
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Sign a token for `user`
    pub fn issue_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_lifetime);

        let claims = TokenClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?)
    }

    /// Check signature and expiry of a token
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims)
    }

    /// Verify a token and load the user it names
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.verify_token(token)?;
        self.db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser(claims.sub))
    }

    /// Resolve an `Authorization` header value into the request identity.
    ///
    /// Never fails: a missing header, a non-bearer scheme or a rejected token
    /// all resolve to [CurrentUser::Anonymous].
    pub async fn resolve_header(&self, header: Option<&str>) -> CurrentUser {
        let Some(header) = header else {
            tracing::debug!("No auth token in request headers");
            return CurrentUser::Anonymous;
        };
        let Some(token) = bearer_token(header) else {
            tracing::debug!("Authorization header is not a bearer token");
            return CurrentUser::Anonymous;
        };
        self.resolve_token(token).await
    }

    /// Resolve a raw token into the request identity
    pub async fn resolve_token(&self, token: &str) -> CurrentUser {
        match self.authenticate(token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Auth successful");
                CurrentUser::Authenticated(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected, continuing unauthenticated");
                CurrentUser::Anonymous
            }
        }
    }
}
