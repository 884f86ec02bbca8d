//! Email/password login.

use recipebox_core::{User, normalize_email};

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::verify_password;
use crate::storage::UserStorage;
use crate::token::{generate_token, hash_token};

/// Checks an email/password pair against storage.
///
/// Unknown emails, wrong passwords and inactive accounts all yield
/// `AuthError::InvalidCredentials` so callers cannot probe for accounts.
pub async fn authenticate(
    storage: &dyn UserStorage,
    email: &str,
    password: &str,
) -> AuthResult<User> {
    let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;

    let Some(user) = storage.find_user_by_email(&email).await? else {
        tracing::debug!(email = %email, "Login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login attempt for inactive user");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Creates a fresh token for `user` and returns it in plaintext.
pub async fn issue_token(storage: &dyn UserStorage, user: &User) -> AuthResult<String> {
    let token = generate_token();
    storage.store_token(&hash_token(&token), user.id).await?;
    tracing::info!(user_id = %user.id, "API token issued");
    Ok(token)
}
