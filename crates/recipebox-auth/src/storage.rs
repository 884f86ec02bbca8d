//! User and token storage trait.
//!
//! Defines the interface for account persistence operations.
//! Implementations are provided by storage backends (e.g., in-memory).

use std::sync::Arc;

use async_trait::async_trait;
use recipebox_core::{NewUser, User, UserId};

use crate::AuthResult;

/// Shared handle to a user store.
pub type DynUserStorage = Arc<dyn UserStorage>;

/// Storage trait for user accounts and API tokens.
///
/// # Example
///
/// ```ignore
/// async fn example(storage: &impl UserStorage) {
///     if let Some(user) = storage.find_user_by_email("test@example.com").await? {
///         println!("Found user: {}", user.name);
///     }
/// }
/// ```
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Inserts a new user. `user.email` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email is in use.
    async fn create_user(&self, user: NewUser) -> AuthResult<User>;

    /// Finds a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Finds a user by id.
    async fn read_user(&self, id: UserId) -> AuthResult<Option<User>>;

    /// Replaces a stored user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the new email belongs to another user,
    /// or `AuthError::Storage` if the user does not exist.
    async fn update_user(&self, user: &User) -> AuthResult<User>;

    /// Records a token digest for `user`. Existing tokens stay valid.
    async fn store_token(&self, token_hash: &str, user: UserId) -> AuthResult<()>;

    /// Resolves a token digest to its user id.
    async fn find_token_user(&self, token_hash: &str) -> AuthResult<Option<UserId>>;
}
