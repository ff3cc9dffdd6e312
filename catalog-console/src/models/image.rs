use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub product_id: i64,
    pub image_filename: String,
    pub image_hash: Option<String>,
    pub minio_path: Option<String>,
    #[serde(default)]
    pub is_cover: bool,
    pub created_at: NaiveDateTime,
}

/// Time-limited URL for reading an image object directly from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
}
