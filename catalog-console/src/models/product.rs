use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_name: Option<String>,
    pub price: Option<String>,
    pub release_date: Option<String>,
    pub article_content: Option<String>,
    pub url: String,
    pub product_tag: Option<String>,
    pub series: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Product {
    pub fn name_text(&self) -> &str {
        text_or_dash(&self.product_name)
    }

    pub fn price_text(&self) -> &str {
        text_or_dash(&self.price)
    }

    pub fn release_date_text(&self) -> &str {
        text_or_dash(&self.release_date)
    }

    pub fn tag_text(&self) -> &str {
        text_or_dash(&self.product_tag)
    }

    pub fn series_text(&self) -> &str {
        text_or_dash(&self.series)
    }
}

fn text_or_dash(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Create/update payload. Empty optional fields are sent as `null`,
/// which the backend treats as "leave unchanged" on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub article_content: Option<String>,
    #[validate(url(message = "A valid product URL is required"))]
    pub url: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub product_tag: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub series: Option<String>,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            product_name: product.product_name.clone(),
            price: product.price.clone(),
            release_date: product.release_date.clone(),
            article_content: product.article_content.clone(),
            url: product.url.clone(),
            product_tag: product.product_tag.clone(),
            series: product.series.clone(),
        }
    }
}

/// Filters for `GET /api/products/`. Absent and empty values are left out of
/// the query string entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub price_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub price_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub release_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub release_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub created_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub created_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub has_images: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub sort_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "blank_as_none")]
    pub page_size: Option<u32>,
}

impl ProductQuery {
    pub fn to_query_string(&self) -> String {
        // Only scalar fields, so encoding cannot fail
        serde_urlencoded::to_string(self).unwrap_or_default()
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PageMeta {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Form fields arrive as text; blank inputs mean "not set".
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_absent_and_empty_fields() {
        let query: ProductQuery =
            serde_urlencoded::from_str("name=robot&tag=&series=&page=2&page_size=20").unwrap();
        assert_eq!(query.to_query_string(), "name=robot&page=2&page_size=20");
    }

    #[test]
    fn empty_query_encodes_to_nothing() {
        assert_eq!(ProductQuery::default().to_query_string(), "");
    }

    #[test]
    fn blank_numeric_filters_are_ignored() {
        let query: ProductQuery =
            serde_urlencoded::from_str("price_min=&price_max=5000&has_images=").unwrap();
        assert_eq!(query.price_min, None);
        assert_eq!(query.price_max, Some(5000));
        assert_eq!(query.has_images, None);
    }

    #[test]
    fn boolean_filter_is_encoded_as_text() {
        let query = ProductQuery {
            has_images: Some(false),
            ..Default::default()
        };
        assert_eq!(query.to_query_string(), "has_images=false");
    }

    #[test]
    fn page_meta_navigation() {
        let meta = PageMeta {
            page: 2,
            page_size: 20,
            total: 41,
        };
        assert_eq!(meta.total_pages(), 3);
        assert!(meta.has_previous());
        assert!(meta.has_next());

        let empty = PageMeta {
            page: 1,
            page_size: 20,
            total: 0,
        };
        assert_eq!(empty.total_pages(), 1);
        assert!(!empty.has_next());
    }

    #[test]
    fn form_input_blanks_become_null() {
        let input: ProductInput =
            serde_urlencoded::from_str("product_name=&price=1000&url=https%3A%2F%2Fshop.example%2Fp%2F1")
                .unwrap();
        assert!(input.product_name.is_none());
        assert_eq!(input.price.as_deref(), Some("1000"));
        let json = serde_json::to_value(&input).unwrap();
        assert!(json["product_name"].is_null());
    }
}
