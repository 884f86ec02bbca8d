//! HTTP middleware for authentication.
//!
//! This module provides Axum extractors for:
//!
//! - Token extraction and validation
//! - Acting-owner resolution
//! - JSON error responses with a `WWW-Authenticate` hint

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AuthState, OwnerAuth};
pub use types::AuthContext;
