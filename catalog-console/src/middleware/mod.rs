pub mod guard;
pub mod request_id;
pub mod teardown;

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

pub const LOGIN_PATH: &str = "/login";

/// Redirect to the login page. htmx requests get `HX-Redirect` so the whole
/// page navigates instead of swapping a fragment.
pub fn login_redirect(request_headers: &HeaderMap) -> Response {
    if is_htmx(request_headers) {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Redirect", HeaderValue::from_static(LOGIN_PATH));
        (StatusCode::OK, headers).into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
