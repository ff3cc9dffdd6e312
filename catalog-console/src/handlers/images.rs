use askama::Template;
use axum::{
    extract::{Multipart, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::ConsoleError;
use crate::handlers::{inline_message, see_other, upload_error};
use crate::models::{CurrentUser, Image, Product, User};
use crate::services::{CatalogApi, FilePart};

#[derive(Template)]
#[template(path = "images.html")]
pub struct ImagesTemplate {
    pub user: User,
    pub can_edit: bool,
    pub current_page: &'static str,
    pub product: Product,
    pub images: Vec<Image>,
    pub notices: Vec<String>,
    pub errors: Vec<String>,
}

async fn images_page(
    api: &CatalogApi,
    user: User,
    product_id: i64,
    notices: Vec<String>,
    errors: Vec<String>,
) -> Result<ImagesTemplate, ConsoleError> {
    let product = api.get_product(product_id).await?;
    let images = api.list_images(product_id).await?;

    Ok(ImagesTemplate {
        can_edit: user.role().can_edit(),
        user,
        current_page: "products",
        product,
        images,
        notices,
        errors,
    })
}

pub async fn images_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ConsoleError> {
    images_page(&api, user, product_id, Vec::new(), Vec::new()).await
}

pub async fn upload_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response, ConsoleError> {
    let mut files = Vec::new();
    let mut is_cover = false;
    let mut errors = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(upload_error(e)),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                match field.bytes().await {
                    // Browsers send an empty part when no file was picked
                    Ok(bytes) if bytes.is_empty() => {}
                    Ok(bytes) => files.push(
                        FilePart::new(file_name, bytes.to_vec()).with_content_type(content_type),
                    ),
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return Err(upload_error(e));
                    }
                    Err(e) => {
                        tracing::error!(file_name = %file_name, error = %e, "Failed to read file");
                        errors.push(format!("{file_name}: Failed to read file"));
                    }
                }
            }
            Some("is_cover") => {
                is_cover = field.text().await.is_ok_and(|v| v == "true");
            }
            _ => {}
        }
    }

    if files.is_empty() && errors.is_empty() {
        errors.push("Choose at least one image to upload".to_string());
    }

    let mut notices = Vec::new();
    for (index, file) in files.into_iter().enumerate() {
        let file_name = file.file_name.clone();
        // Only the first file of a batch becomes the cover
        let cover = is_cover && index == 0;

        match api.upload_image(product_id, file, cover).await {
            Ok(image) => {
                tracing::info!(product_id, image_id = image.id, file_name = %file_name, "Image uploaded");
                notices.push(format!("{file_name}: uploaded"));
            }
            Err(e) => {
                let message = inline_message(e)?;
                errors.push(format!("{file_name}: {message}"));
            }
        }
    }

    let status = if notices.is_empty() && !errors.is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    let page = images_page(&api, user, product_id, notices, errors).await?;
    Ok((status, page).into_response())
}

pub async fn preview_handler(
    api: CatalogApi,
    Path(image_id): Path<i64>,
) -> Result<impl IntoResponse, ConsoleError> {
    let presigned = api.presign(image_id).await?;
    Ok(Redirect::to(&presigned.url))
}

#[derive(Debug, Deserialize)]
pub struct ImageAction {
    pub product_id: i64,
    #[serde(default)]
    pub delete_object: Option<String>,
}

impl ImageAction {
    /// Unchecked checkboxes are not submitted at all.
    fn delete_object(&self) -> bool {
        self.delete_object.as_deref() == Some("true")
    }
}

pub async fn set_cover_handler(
    api: CatalogApi,
    headers: HeaderMap,
    Path(image_id): Path<i64>,
    Form(action): Form<ImageAction>,
) -> Result<Response, ConsoleError> {
    api.set_image_as_cover(image_id).await?;
    tracing::info!(image_id, product_id = action.product_id, "Cover image changed");
    Ok(see_other(&headers, &format!("/images/{}", action.product_id)))
}

pub async fn delete_image_handler(
    api: CatalogApi,
    headers: HeaderMap,
    Path(image_id): Path<i64>,
    Form(action): Form<ImageAction>,
) -> Result<Response, ConsoleError> {
    let delete_object = action.delete_object();
    api.delete_image(image_id, delete_object).await?;
    tracing::info!(image_id, delete_object, "Image deleted");
    Ok(see_other(&headers, &format!("/images/{}", action.product_id)))
}
