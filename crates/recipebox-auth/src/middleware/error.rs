//! Error response handling for authentication middleware.
//!
//! `AuthError` renders through `ApiError` so every failure shares the same
//! JSON error document.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use recipebox_api::ApiError;

use crate::error::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized { message } => ApiError::unauthorized(message),
            AuthError::InvalidToken { .. } => ApiError::unauthorized("Invalid token."),
            AuthError::InactiveUser => ApiError::unauthorized("User inactive or deleted."),
            AuthError::InvalidCredentials => ApiError::field(
                "non_field_errors",
                "Unable to authenticate with provided credentials",
            ),
            AuthError::EmailTaken { .. } => {
                ApiError::field("email", "user with this email already exists.")
            }
            AuthError::Hashing { .. } | AuthError::Storage { .. } => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if matches!(self.category(), crate::ErrorCategory::Infrastructure) {
            tracing::error!(error = %self, "Authentication backend failure");
        }
        let mut response = ApiError::from(self).into_response();

        // Scheme hint for 401 responses
        if response.status() == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        }
        response
    }
}
