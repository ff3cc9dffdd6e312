//! Typed operations over the catalog backend's REST endpoints.

use std::sync::Arc;

use crate::config::StorageSettings;
use crate::error::ApiError;
use crate::models::{
    Image, ImportReport, LoginRequest, Page, PresignedUrl, Product, ProductInput, ProductQuery,
    StatsOverview, TokenResponse, User,
};
use crate::services::api_client::{ApiClient, ApiRequest, FilePart};
use crate::session::SessionStore;

pub const DEFAULT_STATS_TOP: u32 = 10;

#[derive(Clone)]
pub struct CatalogApi {
    client: ApiClient,
    storage: Arc<StorageSettings>,
}

impl CatalogApi {
    pub fn new(client: ApiClient, storage: Arc<StorageSettings>) -> Self {
        Self { client, storage }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.client.session()
    }

    // auth

    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError> {
        self.client
            .send(ApiRequest::post("/api/auth/login").json(credentials.to_json()))
            .await?
            .decode()
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.send(ApiRequest::get("/api/auth/me")).await?.decode()
    }

    /// Exchange credentials for a token, store it, then look up the role and
    /// store the pair. Nothing stays in the session if either step fails.
    pub async fn sign_in(&self, credentials: &LoginRequest) -> Result<User, ApiError> {
        let session = self.session();
        let tokens = self.login(credentials).await?;
        session.set_session(tokens.access_token.clone(), None).await;

        match self.me().await {
            Ok(user) => {
                session
                    .set_session(tokens.access_token, Some(user.role.clone()))
                    .await;
                tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in");
                Ok(user)
            }
            Err(e) => {
                session.clear_session().await;
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) {
        self.session().clear_session().await;
    }

    // products

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let path = format!("/api/products/?{}", query.to_query_string());
        self.client.send(ApiRequest::get(path)).await?.decode()
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.client
            .send(ApiRequest::get(format!("/api/products/{id}")))
            .await?
            .decode()
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        self.client
            .send(ApiRequest::post("/api/products/").json(serde_json::to_value(input)?))
            .await?
            .decode()
    }

    pub async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, ApiError> {
        self.client
            .send(ApiRequest::put(format!("/api/products/{id}")).json(serde_json::to_value(input)?))
            .await?
            .decode()
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .send(ApiRequest::delete(format!("/api/products/{id}")))
            .await?;
        Ok(())
    }

    // images

    pub async fn list_images(&self, product_id: i64) -> Result<Vec<Image>, ApiError> {
        self.client
            .send(ApiRequest::get(format!("/api/images/product/{product_id}")))
            .await?
            .decode()
    }

    pub async fn upload_image(
        &self,
        product_id: i64,
        file: FilePart,
        is_cover: bool,
    ) -> Result<Image, ApiError> {
        let request = ApiRequest::post(format!("/api/images/upload/{product_id}"))
            .file(file)
            .field("is_cover", is_cover.to_string());
        self.client.send(request).await?.decode()
    }

    /// Presigned URL with the storage host rewritten to one the browser can reach.
    pub async fn presign(&self, image_id: i64) -> Result<PresignedUrl, ApiError> {
        let presigned: PresignedUrl = self
            .client
            .send(ApiRequest::get(format!("/api/images/presign/{image_id}")))
            .await?
            .decode()?;
        Ok(PresignedUrl {
            url: rewrite_storage_host(&presigned.url, &self.storage),
        })
    }

    pub async fn delete_image(&self, image_id: i64, delete_object: bool) -> Result<(), ApiError> {
        self.client
            .send(ApiRequest::delete(format!(
                "/api/images/{image_id}?delete_object={delete_object}"
            )))
            .await?;
        Ok(())
    }

    pub async fn set_image_as_cover(&self, image_id: i64) -> Result<Image, ApiError> {
        self.client
            .send(ApiRequest::put(format!("/api/images/{image_id}/set-cover")))
            .await?
            .decode()
    }

    // import

    pub async fn import_from_json(&self) -> Result<ImportReport, ApiError> {
        self.client
            .send(ApiRequest::post("/api/import/json"))
            .await?
            .decode()
    }

    pub async fn import_from_zip(&self, archive: FilePart) -> Result<ImportReport, ApiError> {
        self.client
            .send(ApiRequest::post("/api/import/zip").file(archive))
            .await?
            .decode()
    }

    // stats

    pub async fn stats_overview(&self, top: u32) -> Result<StatsOverview, ApiError> {
        self.client
            .send(ApiRequest::get(format!("/api/stats/overview?top={top}")))
            .await?
            .decode()
    }
}

/// Replace the first occurrence of each internal storage base with the public one.
pub fn rewrite_storage_host(url: &str, storage: &StorageSettings) -> String {
    let public = storage.public_base.trim_end_matches('/');
    storage
        .internal_bases
        .iter()
        .filter(|internal| !internal.is_empty())
        .fold(url.to_string(), |acc, internal| {
            acc.replacen(internal.trim_end_matches('/'), public, 1)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(public_base: &str) -> StorageSettings {
        StorageSettings {
            public_base: public_base.to_string(),
            internal_bases: vec![
                "http://minio:9000".to_string(),
                "https://minio:9000".to_string(),
            ],
        }
    }

    #[test]
    fn internal_host_is_replaced() {
        let url = "http://minio:9000/products/1/abc_a.png?X-Amz-Signature=ff";
        assert_eq!(
            rewrite_storage_host(url, &storage("https://cdn.example.com")),
            "https://cdn.example.com/products/1/abc_a.png?X-Amz-Signature=ff"
        );
    }

    #[test]
    fn tls_internal_host_is_replaced() {
        let url = "https://minio:9000/products/a.png";
        assert_eq!(
            rewrite_storage_host(url, &storage("http://localhost:9000/")),
            "http://localhost:9000/products/a.png"
        );
    }

    #[test]
    fn external_urls_pass_through() {
        let url = "https://s3.amazonaws.com/bucket/a.png";
        assert_eq!(rewrite_storage_host(url, &storage("http://localhost:9000")), url);
    }
}
