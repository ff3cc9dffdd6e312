use super::Product;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOverview {
    pub products_total: u64,
    #[serde(default)]
    pub by_tag: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_series: BTreeMap<String, u64>,
    pub with_images: u64,
    pub without_images: u64,
    #[serde(default)]
    pub recent: Vec<Product>,
}
