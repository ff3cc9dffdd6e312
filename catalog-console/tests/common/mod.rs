#![allow(dead_code)]

use std::sync::Arc;

use catalog_console::config::{BackendSettings, ServerSettings, StorageSettings};
use catalog_console::services::CatalogApi;
use catalog_console::session::{MemorySessionStore, SessionStore};
use catalog_console::AppState;
use serde_json::{json, Value};

pub fn storage() -> StorageSettings {
    StorageSettings {
        public_base: "http://localhost:9000".to_string(),
        internal_bases: vec![
            "http://minio:9000".to_string(),
            "https://minio:9000".to_string(),
        ],
    }
}

pub fn server() -> ServerSettings {
    server_with_upload_limit(50 * 1024 * 1024)
}

pub fn server_with_upload_limit(max_upload_bytes: usize) -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        session_ttl_hours: 24,
        secure_cookies: false,
        max_upload_bytes,
    }
}

pub fn app_state(api_base: &str) -> AppState {
    AppState::new(
        BackendSettings {
            api_base: api_base.to_string(),
        },
        storage(),
    )
}

/// API bound to an in-memory session, optionally signed in.
pub fn api_with_session(api_base: &str, token: Option<&str>) -> (CatalogApi, Arc<MemorySessionStore>) {
    let store = Arc::new(match token {
        Some(token) => MemorySessionStore::with_token(token),
        None => MemorySessionStore::new(),
    });
    let session: Arc<dyn SessionStore> = store.clone();
    (app_state(api_base).api(session, None), store)
}

pub fn user_json(role: &str) -> Value {
    json!({
        "id": 1,
        "username": "alice",
        "role": role,
        "created_at": "2024-05-01T10:00:00"
    })
}

pub fn product_json(id: i64) -> Value {
    json!({
        "id": id,
        "product_name": "Robot figure",
        "price": "4800",
        "release_date": "2024-08",
        "article_content": null,
        "url": format!("https://shop.example/p/{id}"),
        "product_tag": "figure",
        "series": "Mecha",
        "created_at": "2024-05-01T10:00:00"
    })
}

pub const BOUNDARY: &str = "console-test-boundary";

/// `multipart/form-data` body with one part per `(field, file name, bytes)`.
/// A `None` file name makes a plain text field.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn import_report_json() -> Value {
    json!({"total": 1, "created": 1, "updated": 0, "errors": []})
}
