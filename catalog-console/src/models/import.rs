use serde::{Deserialize, Serialize};

/// Outcome of a bulk upsert (keyed by product URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub total: u64,
    pub created: u64,
    pub updated: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}
