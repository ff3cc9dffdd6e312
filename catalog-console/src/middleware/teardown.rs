use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use crate::error::AuthFailure;
use crate::middleware::{login_redirect, LOGIN_PATH};
use crate::session::{CookieSessionStore, SessionStore};

/// Single place where a backend 401 ends the session.
///
/// Handlers only report the failure (see [`AuthFailure`]); this layer clears
/// the session and, unless the browser is already on the login page, replaces
/// the response with one redirect to it.
pub async fn session_teardown(session: Session, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let request_headers = request.headers().clone();

    let response = next.run(request).await;

    let Some(failure) = response.extensions().get::<AuthFailure>().cloned() else {
        return response;
    };

    CookieSessionStore::new(session).clear_session().await;

    if path == LOGIN_PATH {
        return response;
    }

    tracing::info!(path = %path, reason = %failure.message, "Session rejected by backend, redirecting to login");
    login_redirect(&request_headers)
}
