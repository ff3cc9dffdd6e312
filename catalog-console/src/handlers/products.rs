use askama::Template;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use validator::Validate;

use crate::error::ConsoleError;
use crate::handlers::{inline_message, see_other};
use crate::models::{CurrentUser, Page, Product, ProductInput, ProductQuery, User};
use crate::services::CatalogApi;

/// Filter values echoed back into the filter form.
#[derive(Debug, Default)]
pub struct ProductFilters {
    pub name: String,
    pub tag: String,
    pub series: String,
    pub price_min: String,
    pub price_max: String,
    pub has_images: String,
    pub sort_by: String,
    pub sort_order: String,
}

impl From<&ProductQuery> for ProductFilters {
    fn from(query: &ProductQuery) -> Self {
        Self {
            name: query.name.clone().unwrap_or_default(),
            tag: query.tag.clone().unwrap_or_default(),
            series: query.series.clone().unwrap_or_default(),
            price_min: query.price_min.map(|v| v.to_string()).unwrap_or_default(),
            price_max: query.price_max.map(|v| v.to_string()).unwrap_or_default(),
            has_images: query.has_images.map(|v| v.to_string()).unwrap_or_default(),
            sort_by: query
                .sort_by
                .clone()
                .unwrap_or_else(|| "created_at".to_string()),
            sort_order: query
                .sort_order
                .clone()
                .unwrap_or_else(|| "desc".to_string()),
        }
    }
}

#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub user: User,
    pub can_edit: bool,
    pub current_page: &'static str,
    pub page: Page<Product>,
    pub filters: ProductFilters,
    pub previous_link: Option<String>,
    pub next_link: Option<String>,
}

/// Text form of a product, as shown in the edit form.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub product_name: String,
    pub url: String,
    pub price: String,
    pub release_date: String,
    pub product_tag: String,
    pub series: String,
    pub article_content: String,
}

impl From<&ProductInput> for ProductForm {
    fn from(input: &ProductInput) -> Self {
        Self {
            product_name: input.product_name.clone().unwrap_or_default(),
            url: input.url.clone(),
            price: input.price.clone().unwrap_or_default(),
            release_date: input.release_date.clone().unwrap_or_default(),
            product_tag: input.product_tag.clone().unwrap_or_default(),
            series: input.series.clone().unwrap_or_default(),
            article_content: input.article_content.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "product_edit.html")]
pub struct ProductEditTemplate {
    pub user: User,
    pub can_edit: bool,
    pub current_page: &'static str,
    pub product_id: Option<i64>,
    pub error: Option<String>,
    pub action: String,
    pub form: ProductForm,
}

impl ProductEditTemplate {
    fn new(user: User, product_id: Option<i64>, input: &ProductInput) -> Self {
        let action = match product_id {
            Some(id) => format!("/products/{id}"),
            None => "/products/new".to_string(),
        };
        Self {
            can_edit: user.role().can_edit(),
            user,
            current_page: "products",
            product_id,
            error: None,
            action,
            form: ProductForm::from(input),
        }
    }

    fn with_error(mut self, message: String) -> Self {
        self.error = Some(message);
        self
    }
}

fn page_link(query: &ProductQuery, page: u32) -> String {
    format!("/products?{}", query.with_page(page).to_query_string())
}

pub async fn list_products_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ConsoleError> {
    let page = api.list_products(&query).await?;

    let previous_link = page
        .meta
        .has_previous()
        .then(|| page_link(&query, page.meta.page - 1));
    let next_link = page
        .meta
        .has_next()
        .then(|| page_link(&query, page.meta.page + 1));

    Ok(ProductsTemplate {
        can_edit: user.role().can_edit(),
        user,
        current_page: "products",
        filters: ProductFilters::from(&query),
        page,
        previous_link,
        next_link,
    })
}

pub async fn new_product_page(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ProductEditTemplate::new(user, None, &ProductInput::default())
}

pub async fn edit_product_page(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ConsoleError> {
    let product = api.get_product(id).await?;
    Ok(ProductEditTemplate::new(
        user,
        Some(product.id),
        &ProductInput::from(&product),
    ))
}

pub async fn create_product_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Form(input): Form<ProductInput>,
) -> Result<Response, ConsoleError> {
    save_product(api, user, headers, None, input).await
}

pub async fn update_product_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(input): Form<ProductInput>,
) -> Result<Response, ConsoleError> {
    save_product(api, user, headers, Some(id), input).await
}

/// Create or update, re-rendering the form with the failure on rejection.
async fn save_product(
    api: CatalogApi,
    user: User,
    headers: HeaderMap,
    id: Option<i64>,
    input: ProductInput,
) -> Result<Response, ConsoleError> {
    let page = ProductEditTemplate::new(user, id, &input);

    if let Err(e) = input.validate() {
        let message = ConsoleError::from(e).user_message();
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page.with_error(message)).into_response());
    }

    let saved = match id {
        Some(id) => api.update_product(id, &input).await,
        None => api.create_product(&input).await,
    };

    match saved {
        Ok(product) => {
            tracing::info!(product_id = product.id, created = id.is_none(), "Product saved");
            Ok(see_other(&headers, "/products"))
        }
        Err(e) => {
            let status = e.status().unwrap_or(StatusCode::BAD_GATEWAY);
            let message = inline_message(e)?;
            Ok((status, page.with_error(message)).into_response())
        }
    }
}

pub async fn delete_product_handler(
    api: CatalogApi,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ConsoleError> {
    api.delete_product(id).await?;
    tracing::info!(product_id = id, "Product deleted");
    Ok(see_other(&headers, "/products"))
}
