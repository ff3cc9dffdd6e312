//! HTTP client for the catalog backend.
//!
//! Every call goes through [`ApiClient::send`], which attaches the bearer
//! token from the session store, issues the request and classifies the
//! outcome. A 401 is reported as [`ApiError::Unauthenticated`]; tearing the
//! session down and redirecting is left to the top-level handler.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ApiError, SESSION_EXPIRED_MESSAGE};
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::observability::inject_trace_context;
use crate::services::metrics::record_backend_call;
use crate::session::SessionStore;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            field: "file".to_string(),
            file_name: file_name.into(),
            content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart {
        files: Vec<FilePart>,
        fields: Vec<(String, String)>,
    },
}

/// Description of one backend call. Built per call, never stored.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, query string included.
    pub path: String,
    pub body: Option<RequestBody>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a file, switching the request to multipart.
    pub fn file(mut self, file: FilePart) -> Self {
        match &mut self.body {
            Some(RequestBody::Multipart { files, .. }) => files.push(file),
            _ => {
                self.body = Some(RequestBody::Multipart {
                    files: vec![file],
                    fields: Vec::new(),
                })
            }
        }
        self
    }

    /// Add a text field to a multipart request.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = (name.into(), value.into());
        match &mut self.body {
            Some(RequestBody::Multipart { fields, .. }) => fields.push(entry),
            _ => {
                self.body = Some(RequestBody::Multipart {
                    files: Vec::new(),
                    fields: vec![entry],
                })
            }
        }
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Some(RequestBody::Multipart { .. }))
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body declared as JSON.
    Json(Value),
    /// Any other body, unmodified.
    Text(String),
}

impl Payload {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Payload::Json(value) => Ok(serde_json::from_value(value)?),
            Payload::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    request_id: Option<String>,
}

impl ApiClient {
    pub fn new(client: Client, base_url: impl Into<String>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
            request_id: None,
        }
    }

    /// Forward this correlation id on every call.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Perform one exchange with the backend and classify the outcome.
    #[tracing::instrument(
        name = "backend_request",
        skip(self, request),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn send(&self, request: ApiRequest) -> Result<Payload, ApiError> {
        let ApiRequest {
            method,
            path,
            body,
            headers: caller_headers,
        } = request;
        let multipart = matches!(body, Some(RequestBody::Multipart { .. }));

        // Read the token at call time; the snapshot is only valid for this call
        let token = self.session.token().await;
        let mut headers = compose_headers(&caller_headers, token.as_deref(), multipart);
        if let Some(id) = self.request_id.as_deref() {
            if let Ok(value) = HeaderValue::from_str(id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
        }
        inject_trace_context(&mut headers);

        let url = self.url(&path);
        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        match body {
            Some(RequestBody::Json(value)) => {
                builder = builder.body(value.to_string());
            }
            Some(RequestBody::Multipart { files, fields }) => {
                builder = builder.multipart(build_form(files, fields)?);
            }
            None => {}
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                record_backend_call(method.as_str(), &path, "error", started.elapsed());
                tracing::error!(url = %url, error = %e, "Backend request failed");
                return Err(ApiError::Network(e));
            }
        };

        let status = response.status();
        record_backend_call(method.as_str(), &path, status.as_str(), started.elapsed());
        tracing::debug!(status = %status, "Backend responded");

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        let outcome = classify(status, &content_type, body, multipart);
        if let Err(ApiError::Unauthenticated { message }) = &outcome {
            tracing::warn!(message = %message, "Backend rejected the session");
        }
        outcome
    }
}

/// Join base and path, then drop one trailing slash from the result.
pub fn join_url(base: &str, path: &str) -> String {
    let mut url = format!("{}{}", base.trim_end_matches('/'), path);
    if url.ends_with('/') {
        url.pop();
    }
    url
}

/// Outgoing headers: JSON content type (except multipart), caller headers,
/// then the bearer token. A caller-supplied `Authorization` never survives;
/// without a token there is no such header at all.
pub fn compose_headers(caller: &HeaderMap, token: Option<&str>, multipart: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if !multipart {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    // The multipart boundary is chosen by the form encoder
    let keep = |name: &HeaderName| name != AUTHORIZATION && !(multipart && name == CONTENT_TYPE);
    for name in caller.keys().filter(|name| keep(*name)) {
        headers.remove(name);
    }
    for (name, value) in caller.iter().filter(|(name, _)| keep(*name)) {
        headers.append(name.clone(), value.clone());
    }

    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored token is not a valid header value, sending without it"),
        }
    }

    headers
}

/// Map status and body to the call outcome.
pub fn classify(
    status: StatusCode,
    content_type: &str,
    body: String,
    multipart: bool,
) -> Result<Payload, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        let message = extract_message(&body).unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
        return Err(ApiError::Unauthenticated { message });
    }

    if !status.is_success() {
        let message = extract_message(&body).unwrap_or_else(|| {
            if multipart && !body.is_empty() {
                body
            } else {
                status_text(status)
            }
        });
        return Err(ApiError::Request { status, message });
    }

    if content_type.contains(JSON_CONTENT_TYPE) {
        Ok(Payload::Json(serde_json::from_str(&body)?))
    } else {
        Ok(Payload::Text(body))
    }
}

/// `detail`, else `message`, from a JSON error body.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|field| value.get(field).and_then(message_text))
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        // e.g. validation error lists
        other => Some(other.to_string()),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn build_form(files: Vec<FilePart>, fields: Vec<(String, String)>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for file in files {
        let mut part = Part::bytes(file.data).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        form = form.part(file.field, part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_loses_a_single_trailing_slash() {
        assert_eq!(
            join_url("http://api:8000", "/api/products/"),
            "http://api:8000/api/products"
        );
        assert_eq!(
            join_url("http://api:8000/", "/api/auth/me"),
            "http://api:8000/api/auth/me"
        );
        assert_eq!(
            join_url("http://api:8000", "/api/products/?page=1"),
            "http://api:8000/api/products/?page=1"
        );
    }

    #[test]
    fn bearer_header_only_with_token() {
        let with = compose_headers(&HeaderMap::new(), Some("abc"), false);
        assert_eq!(with.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(with.get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);

        let without = compose_headers(&HeaderMap::new(), None, false);
        assert!(without.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn caller_cannot_smuggle_authorization() {
        let mut caller = HeaderMap::new();
        caller.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        caller.insert("x-trace", HeaderValue::from_static("1"));

        let headers = compose_headers(&caller, None, false);
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get("x-trace").unwrap(), "1");

        let headers = compose_headers(&caller, Some("real"), false);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer real");
    }

    #[test]
    fn multipart_leaves_content_type_to_encoder() {
        let mut caller = HeaderMap::new();
        caller.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let headers = compose_headers(&caller, Some("t"), true);
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn caller_content_type_overrides_default() {
        let mut caller = HeaderMap::new();
        caller.insert(CONTENT_TYPE, HeaderValue::from_static("application/merge-patch+json"));
        let headers = compose_headers(&caller, None, false);
        assert_eq!(
            headers.get_all(CONTENT_TYPE).iter().count(),
            1,
            "default content type must be replaced, not duplicated"
        );
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/merge-patch+json");
    }

    #[test]
    fn message_prefers_detail_then_message() {
        assert_eq!(
            extract_message(r#"{"detail":"not found","message":"other"}"#).as_deref(),
            Some("not found")
        );
        assert_eq!(
            extract_message(r#"{"detail":"","message":"fallback"}"#).as_deref(),
            Some("fallback")
        );
        assert_eq!(extract_message(r#"{"error":"x"}"#), None);
        assert_eq!(extract_message("<html>oops</html>"), None);
        assert_eq!(extract_message(r#"["detail"]"#), None);
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let message = extract_message(r#"{"detail":[{"loc":["body","url"]}]}"#).unwrap();
        assert_eq!(message, r#"[{"loc":["body","url"]}]"#);
    }

    #[test]
    fn unauthorized_falls_back_to_fixed_message() {
        let err = classify(StatusCode::UNAUTHORIZED, "text/html", "nope".into(), false).unwrap_err();
        match err {
            ApiError::Unauthenticated { message } => assert_eq!(message, SESSION_EXPIRED_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failures_fall_back_by_call_kind() {
        let json_call = classify(StatusCode::NOT_FOUND, "text/plain", "missing".into(), false);
        match json_call.unwrap_err() {
            ApiError::Request { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected {other:?}"),
        }

        let upload = classify(StatusCode::BAD_REQUEST, "text/plain", "too large".into(), true);
        match upload.unwrap_err() {
            ApiError::Request { message, .. } => assert_eq!(message, "too large"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_decoding_follows_content_type() {
        let json = classify(
            StatusCode::OK,
            "application/json; charset=utf-8",
            r#"{"url":"u"}"#.into(),
            false,
        )
        .unwrap();
        assert_eq!(json, Payload::Json(serde_json::json!({"url": "u"})));

        let text = classify(StatusCode::OK, "text/plain", r#"{"url":"u"}"#.into(), false).unwrap();
        assert_eq!(text, Payload::Text(r#"{"url":"u"}"#.to_string()));

        let empty = classify(StatusCode::NO_CONTENT, "", String::new(), false).unwrap();
        assert_eq!(empty, Payload::Text(String::new()));
    }

    #[test]
    fn invalid_json_success_is_a_decode_error() {
        let err = classify(StatusCode::OK, JSON_CONTENT_TYPE, "{oops".into(), false).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn file_and_field_share_one_multipart_body() {
        let request = ApiRequest::post("/api/images/upload/1")
            .file(FilePart::new("a.png", vec![1, 2, 3]))
            .field("is_cover", "true");
        assert!(request.is_multipart());
        match request.body {
            Some(RequestBody::Multipart { files, fields }) => {
                assert_eq!(files.len(), 1);
                assert_eq!(fields, vec![("is_cover".to_string(), "true".to_string())]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
