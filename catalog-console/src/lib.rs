pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod session;
pub mod startup;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use crate::config::{BackendSettings, StorageSettings};
use crate::middleware::request_id::RequestId;
use crate::services::{ApiClient, CatalogApi};
use crate::session::{CookieSessionStore, SessionStore};
use std::sync::Arc;
use tower_sessions::Session;

/// Shared application state: one HTTP connection pool and backend settings.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub backend: Arc<BackendSettings>,
    pub storage: Arc<StorageSettings>,
}

impl AppState {
    pub fn new(backend: BackendSettings, storage: StorageSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend: Arc::new(backend),
            storage: Arc::new(storage),
        }
    }

    /// API surface bound to one session, forwarding `request_id` on every call.
    pub fn api(&self, session: Arc<dyn SessionStore>, request_id: Option<String>) -> CatalogApi {
        let client = ApiClient::new(self.http.clone(), self.backend.api_base.clone(), session)
            .with_request_id(request_id);
        CatalogApi::new(client, self.storage.clone())
    }
}

/// Builds the API surface for the browser session of the current request.
#[async_trait]
impl FromRequestParts<AppState> for CatalogApi {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let request_id = parts.extensions.get::<RequestId>().map(|id| id.0.clone());
        let store: Arc<dyn SessionStore> = Arc::new(CookieSessionStore::new(session));

        Ok(state.api(store, request_id))
    }
}
