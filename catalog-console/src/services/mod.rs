pub mod api_client;
pub mod catalog_api;
pub mod metrics;

pub use api_client::{ApiClient, ApiRequest, FilePart, Payload, RequestBody};
pub use catalog_api::CatalogApi;
