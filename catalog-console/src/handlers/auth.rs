use askama::Template;
use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form,
};
use validator::Validate;

use crate::error::{ApiError, AuthFailure, ConsoleError};
use crate::handlers::see_other;
use crate::middleware::is_htmx;
use crate::models::LoginRequest;
use crate::services::CatalogApi;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate { error: None }
}

pub async fn login_handler(
    api: CatalogApi,
    headers: HeaderMap,
    Form(payload): Form<LoginRequest>,
) -> Response {
    let result = match payload.validate() {
        Err(e) => Err(ConsoleError::from(e)),
        Ok(()) if !payload.has_password() => {
            Err(ConsoleError::BadRequest("Password is required".to_string()))
        }
        Ok(()) => api.sign_in(&payload).await.map_err(ConsoleError::from),
    };

    match result {
        Ok(_) => see_other(&headers, "/"),
        // htmx swaps the error fragment into the form
        Err(e) if is_htmx(&headers) => e.into_response(),
        Err(e) => login_failed_page(e),
    }
}

/// Full login page with the failure shown inline, for plain form posts.
fn login_failed_page(err: ConsoleError) -> Response {
    let status = err.status_code();
    let message = err.user_message();
    let mut response = (
        status,
        LoginTemplate {
            error: Some(message.clone()),
        },
    )
        .into_response();

    if let ConsoleError::Api(ApiError::Unauthenticated { .. }) = err {
        response.extensions_mut().insert(AuthFailure { message });
    }
    response
}

pub async fn logout_handler(api: CatalogApi, headers: HeaderMap) -> Response {
    api.sign_out().await;
    tracing::info!("User logged out");
    see_other(&headers, "/login")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn failed_login_page_keeps_session_marker() {
        let response = login_failed_page(ConsoleError::Api(ApiError::Unauthenticated {
            message: "Incorrect username or password".into(),
        }));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<AuthFailure>().is_some());
    }

    #[test]
    fn htmx_swaps_server_error_fragments() {
        let page = LoginTemplate { error: None }.render().unwrap();
        assert!(page.contains("evt.detail.xhr.status >= 400)"));
    }

    #[test]
    fn missing_password_is_a_bad_request() {
        let response =
            login_failed_page(ConsoleError::BadRequest("Password is required".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<AuthFailure>().is_none());
    }
}
