use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use recipebox_api::{ApiError, validate_accept};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request id stored in request extensions for logging.
#[derive(Debug, Clone)]
pub struct RequestId(pub HeaderValue);

impl RequestId {
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }
}

// Ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    // Preserve an incoming id, otherwise generate one
    let req_id = match req.headers().get(&REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => match HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            Ok(value) => value,
            Err(_) => return next.run(req).await,
        },
    };

    req.extensions_mut().insert(RequestId(req_id.clone()));

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, req_id);
    res
}

// Responses are JSON only. Bodies of POST/PUT/PATCH must be JSON, except
// image uploads which arrive as multipart/form-data.
pub async fn content_negotiation(req: Request<Body>, next: Next) -> Response {
    if let Err(err) = validate_accept(req.headers()) {
        return err.into_response();
    }

    let method = req.method();
    let needs_body_type = method == Method::POST || method == Method::PUT || method == Method::PATCH;

    if needs_body_type {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        let content_ok = content_type
            .as_deref()
            .map(|s| s.starts_with("application/json") || s.starts_with("multipart/form-data"))
            .unwrap_or(false);
        if !content_ok {
            return ApiError::unsupported_media_type(
                "Content-Type must be application/json or multipart/form-data",
            )
            .into_response();
        }
    }

    next.run(req).await
}
