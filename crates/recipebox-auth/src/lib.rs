//! # recipebox-auth
//!
//! Authentication module for the recipebox server.
//!
//! This crate provides:
//! - Argon2id password hashing and verification
//! - Opaque API token generation (only a SHA-256 digest is ever stored)
//! - The [`UserStorage`] trait that backends implement for accounts and tokens
//! - Credential checks and token issuance for the login endpoint
//! - The [`OwnerAuth`] Axum extractor that resolves the acting owner
//!
//! ## Modules
//!
//! - [`password`] - Password hashing
//! - [`token`] - Token generation and hashing
//! - [`storage`] - Storage trait for users and tokens
//! - [`credentials`] - Login flow
//! - [`middleware`] - Request authentication

pub mod credentials;
pub mod error;
pub mod middleware;
pub mod password;
pub mod storage;
pub mod token;

pub use credentials::{authenticate, issue_token};
pub use error::{AuthError, ErrorCategory};
pub use middleware::{AuthContext, AuthState, OwnerAuth};
pub use password::{hash_password, verify_password};
pub use storage::{DynUserStorage, UserStorage};
pub use token::{generate_token, hash_token};

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{AuthContext, AuthState, OwnerAuth};
    pub use crate::storage::UserStorage;
}
