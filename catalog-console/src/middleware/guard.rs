//! Route guard for console pages.
//!
//! A page is admitted only after the backend confirms the stored token with a
//! live identity check. Any failure, including an unreachable backend, clears
//! the session and sends the browser to the login page.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::middleware::{login_redirect, LOGIN_PATH};
use crate::models::{CurrentUser, User};
use crate::services::CatalogApi;

#[derive(Debug)]
pub enum GuardDecision {
    /// Proceed; carries the verified identity unless the page is unguarded.
    Admit(Option<User>),
    RedirectToLogin,
}

pub async fn evaluate(path: &str, api: &CatalogApi) -> GuardDecision {
    if path == LOGIN_PATH {
        return GuardDecision::Admit(None);
    }

    let session = api.session();
    let stored = session.load().await;
    let Some(token) = stored.token else {
        tracing::debug!(path = %path, "No session token, redirecting to login");
        return GuardDecision::RedirectToLogin;
    };

    match api.me().await {
        Ok(user) => {
            // Keep the stored role in step with the backend, unless the
            // session changed while the check was in flight
            let current = session.load().await;
            if current.token.as_deref() == Some(token.as_str()) && current.role() != Some(user.role())
            {
                session.set_session(token, Some(user.role.clone())).await;
            }
            GuardDecision::Admit(Some(user))
        }
        Err(e) => {
            // Expired and unreachable are treated alike
            tracing::warn!(path = %path, error = %e, "Session verification failed");
            session.clear_session().await;
            GuardDecision::RedirectToLogin
        }
    }
}

pub async fn route_guard(api: CatalogApi, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match evaluate(&path, &api).await {
        GuardDecision::Admit(user) => {
            if let Some(user) = user {
                request.extensions_mut().insert(CurrentUser(user));
            }
            next.run(request).await
        }
        GuardDecision::RedirectToLogin => login_redirect(request.headers()),
    }
}
