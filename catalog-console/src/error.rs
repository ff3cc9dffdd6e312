use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use askama::Template;
use thiserror::Error;

/// Message used when the backend rejects the session without saying why.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

/// Failure of a single backend exchange.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the backend. The session must be torn down by the caller.
    #[error("{message}")]
    Unauthenticated { message: String },

    /// Any other non-2xx status.
    #[error("{message}")]
    Request { status: StatusCode, message: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthenticated { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Marker left on a response when the backend rejected the session.
/// The teardown middleware clears the session and redirects on seeing it.
#[derive(Debug, Clone)]
pub struct AuthFailure {
    pub message: String,
}

/// Errors surfaced by console handlers.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ConsoleError {
    /// Human-readable text shown in the error fragment.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Api(ApiError::Network(_)) => "Backend is unreachable".to_string(),
            ConsoleError::Api(ApiError::Decode(_)) => "Unexpected response from backend".to_string(),
            ConsoleError::Api(err) => err.to_string(),
            ConsoleError::Validation(errors) => validation_message(errors),
            ConsoleError::BadRequest(msg) | ConsoleError::PayloadTooLarge(msg) => msg.clone(),
            ConsoleError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::Api(ApiError::Unauthenticated { .. }) => StatusCode::UNAUTHORIZED,
            ConsoleError::Api(ApiError::Request { status, .. }) => *status,
            ConsoleError::Api(ApiError::Network(_)) | ConsoleError::Api(ApiError::Decode(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ConsoleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsoleError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ConsoleError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ConsoleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ConsoleError::Internal(e) => tracing::error!(error = ?e, "Internal error"),
            ConsoleError::Api(e) if status.is_server_error() => {
                tracing::error!(error = %e, "Backend call failed")
            }
            _ => tracing::warn!(status = %status, error = %self, "Request rejected"),
        }

        let message = self.user_message();
        let mut response = (status, Html(error_fragment(&message))).into_response();

        if let ConsoleError::Api(ApiError::Unauthenticated { message }) = self {
            response.extensions_mut().insert(AuthFailure { message });
        }

        response
    }
}

#[derive(Template)]
#[template(source = "<p class='error'>{{ message }}</p>", ext = "html")]
struct ErrorFragment<'a> {
    message: &'a str,
}

/// Small HTML snippet rendered in place of a failed fragment.
pub fn error_fragment(message: &str) -> String {
    ErrorFragment { message }.render().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to render error fragment");
        "<p class='error'>Internal server error</p>".to_string()
    })
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid {field}"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
