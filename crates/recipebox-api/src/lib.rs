use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use recipebox_core::CoreError;
use recipebox_storage::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDocument {
    /// HTTP status code, repeated for clients that only see the body.
    pub status: u16,
    /// Stable machine-readable code: invalid | unauthorized | forbidden |
    /// not-found | conflict | too-large | not-supported | exception
    pub code: String,
    /// Human-readable description
    pub detail: String,
    /// Per-field validation messages, keyed by field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

/// High-level API errors to be mapped to HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: Option<Value>,
    },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Validation failure attributed to a single field.
    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::Validation {
            errors: Some(json!({ field: [msg.clone()] })),
            message: msg,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => "invalid",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not-found",
            ApiError::Conflict(_) => "conflict",
            ApiError::PayloadTooLarge(_) => "too-large",
            ApiError::UnsupportedMediaType(_) => "not-supported",
            ApiError::Internal(_) => "exception",
        }
    }

    pub fn to_document(&self) -> ErrorDocument {
        let (detail, errors) = match self {
            ApiError::Validation { message, errors } => (message.clone(), errors.clone()),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::Internal(msg) => (msg.clone(), None),
        };
        ErrorDocument {
            status: self.status_code().as_u16(),
            code: self.code().to_string(),
            detail,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match serde_json::to_vec(&self.to_document()) {
            Ok(b) => b,
            // Fallback minimal body if serialization fails
            Err(_) => br#"{"status":500,"code":"exception","detail":"Serialization failure"}"#.to_vec(),
        };

        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidField { field, message } => ApiError::field(&field, message),
            CoreError::MissingField(field) => ApiError::field(&field, "This field is required."),
            CoreError::InvalidId(id) => ApiError::bad_request(format!("Invalid id '{id}'")),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StorageError::AlreadyExists { .. } => ApiError::conflict(err.to_string()),
            StorageError::InvalidRelation { .. } => ApiError::bad_request(err.to_string()),
            StorageError::TransactionError { .. } | StorageError::Internal { .. } => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::unsupported_media_type(rejection.body_text())
            }
            _ if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::payload_too_large(rejection.body_text())
            }
            _ => ApiError::bad_request(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::not_found(rejection.body_text())
    }
}

/// `axum::Json` whose rejections render as [`ErrorDocument`].
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejections render as [`ErrorDocument`].
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

// -------------------------
// API Response Wrapper
// -------------------------
use axum::http::HeaderName;

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self {
            value,
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn created(value: T) -> Self {
        Self::new(value, StatusCode::CREATED)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self.value) {
            Ok(b) => b,
            Err(e) => {
                return ApiError::internal(format!("Serialization failure: {e}")).into_response();
            }
        };
        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response();
        // Add extra headers
        for (n, v) in self.headers.into_iter() {
            response.headers_mut().insert(n, v);
        }
        response
    }
}

// -------------------------
// Content Negotiation
// -------------------------
/// Validate the Accept header: JSON responses only.
pub fn validate_accept(headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(accept) = headers.get(header::ACCEPT) {
        let val = accept.to_str().unwrap_or("").to_ascii_lowercase();
        // Quick allow list: application/json, application/* or */* (common)
        let allowed = val.is_empty()
            || val.contains(JSON_CONTENT_TYPE)
            || val.contains("application/*")
            || val.contains("*/*");
        if !allowed {
            return Err(ApiError::unsupported_media_type(format!(
                "Unsupported Accept: {val}. Only application/json is supported."
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn into_response_sets_status_and_content_type() {
        let resp = ApiError::bad_request("Invalid parameter").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, &HeaderValue::from_static("application/json"));
    }

    #[tokio::test]
    async fn error_document_shape() {
        let resp = ApiError::not_found("recipe not found: 123").into_response();
        let body = body_json(resp).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["code"], "not-found");
        assert_eq!(body["detail"], "recipe not found: 123");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn field_errors_are_keyed_by_field() {
        let resp = ApiError::field("name", "This field may not be blank.").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["errors"]["name"][0], "This field may not be blank.");
    }

    #[test]
    fn api_error_variants_map_to_status_and_codes() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ApiError::bad_request("x"),
                StatusCode::BAD_REQUEST,
                "invalid",
            ),
            (
                ApiError::unauthorized("x"),
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN, "forbidden"),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND, "not-found"),
            (ApiError::conflict("x"), StatusCode::CONFLICT, "conflict"),
            (
                ApiError::payload_too_large("x"),
                StatusCode::PAYLOAD_TOO_LARGE,
                "too-large",
            ),
            (
                ApiError::unsupported_media_type("x"),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "not-supported",
            ),
            (
                ApiError::internal("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "exception",
            ),
        ];
        for (err, status, code) in cases.into_iter() {
            assert_eq!(err.status_code(), status);
            let doc = err.to_document();
            assert_eq!(doc.code, code);
            assert_eq!(doc.status, status.as_u16());
        }
    }

    #[test]
    fn storage_errors_map_to_http_semantics() {
        let err: ApiError = StorageError::not_found("recipe", 9).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err: ApiError = StorageError::already_exists("tag", "Thai").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let err: ApiError = StorageError::invalid_relation("owner mismatch").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err: ApiError = StorageError::internal("boom").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn core_errors_become_field_errors() {
        let err: ApiError = CoreError::invalid_field("price", "A valid number is required.").into();
        let doc = err.to_document();
        assert_eq!(doc.status, 400);
        assert_eq!(doc.errors.unwrap()["price"][0], "A valid number is required.");
    }

    #[test]
    fn api_response_created_sets_status_and_headers() {
        let resp = ApiResponse::created(json!({"id": 1}))
            .with_header(header::LOCATION, HeaderValue::from_static("/api/recipe/recipes/1"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            &HeaderValue::from_static("/api/recipe/recipes/1")
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            &HeaderValue::from_static("application/json")
        );
    }

    #[test]
    fn accept_allows_json_and_wildcards() {
        let mut headers = HeaderMap::new();
        assert!(validate_accept(&headers).is_ok());
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(validate_accept(&headers).is_ok());
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        assert!(validate_accept(&headers).is_ok());
    }

    #[test]
    fn accept_rejects_xml() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/xml"));
        let err = validate_accept(&headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
