//! Token authentication extractor.
//!
//! Clients send `Authorization: Token <key>`; the `Bearer` scheme is
//! accepted as well.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use recipebox_auth::middleware::{AuthState, OwnerAuth};
//!
//! async fn protected_handler(OwnerAuth(auth): OwnerAuth) -> String {
//!     format!("Hello, {}!", auth.user.name)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::storage::DynUserStorage;
use crate::token::hash_token;

use super::types::AuthContext;

const TOKEN_SCHEMES: [&str; 2] = ["Token ", "Bearer "];

// =============================================================================
// Auth State
// =============================================================================

/// State required for token authentication.
///
/// Include it in the application state and expose it to the extractors
/// via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// User storage for resolving tokens to accounts.
    pub users: DynUserStorage,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(users: DynUserStorage) -> Self {
        Self { users }
    }
}

// =============================================================================
// Owner Auth Extractor
// =============================================================================

/// Axum extractor that resolves the acting owner from the request token.
///
/// # Errors
///
/// Rejects with `AuthError` (401) if:
/// - the Authorization header is missing or uses another scheme
/// - the token is unknown
/// - the account is inactive or gone
pub struct OwnerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for OwnerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                AuthError::unauthorized("Authentication credentials were not provided.")
            })?;

        let token = extract_token(header)
            .ok_or_else(|| AuthError::invalid_token("Unsupported authorization scheme"))?;

        let user_id = auth_state
            .users
            .find_token_user(&hash_token(token))
            .await?
            .ok_or_else(|| {
                tracing::debug!("Unknown token presented");
                AuthError::invalid_token("Unknown token")
            })?;

        let user = match auth_state.users.read_user(user_id).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::warn!(user_id = %user_id, "Token for inactive or missing user");
                return Err(AuthError::InactiveUser);
            }
        };

        tracing::debug!(user_id = %user.id, "Token validated successfully");
        Ok(OwnerAuth(AuthContext { user }))
    }
}

fn extract_token(header: &str) -> Option<&str> {
    TOKEN_SCHEMES
        .iter()
        .find_map(|scheme| header.strip_prefix(scheme))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
