pub mod app;
pub mod auth;
pub mod dashboard;
pub mod images;
pub mod import;
pub mod metrics;
pub mod products;

use axum::extract::multipart::MultipartError;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::{ApiError, ConsoleError};
use crate::middleware::is_htmx;

/// Navigate after a successful form post.
pub(crate) fn see_other(request_headers: &HeaderMap, location: &str) -> Response {
    if is_htmx(request_headers) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                let mut headers = HeaderMap::new();
                headers.insert("HX-Redirect", value);
                (StatusCode::OK, headers).into_response()
            }
            Err(_) => Redirect::to(location).into_response(),
        }
    } else {
        Redirect::to(location).into_response()
    }
}

/// Message to show inline for a failed call. A rejected session is not shown
/// inline; it is returned so the teardown layer can end the session.
pub(crate) fn inline_message(err: ApiError) -> Result<String, ConsoleError> {
    match err {
        ApiError::Unauthenticated { .. } => Err(ConsoleError::Api(err)),
        ApiError::Network(_) => Ok("Backend is unreachable".to_string()),
        other => Ok(other.to_string()),
    }
}

/// Failure while reading an uploaded form. Bodies over the upload limit
/// surface here as 413.
pub(crate) fn upload_error(err: MultipartError) -> ConsoleError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConsoleError::PayloadTooLarge("File too large".to_string())
    } else {
        ConsoleError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}
