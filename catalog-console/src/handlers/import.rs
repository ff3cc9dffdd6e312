use askama::Template;
use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ConsoleError};
use crate::handlers::{inline_message, upload_error};
use crate::models::{CurrentUser, ImportReport, User};
use crate::services::{CatalogApi, FilePart};

#[derive(Template)]
#[template(path = "import.html")]
pub struct ImportTemplate {
    pub user: User,
    pub can_edit: bool,
    pub current_page: &'static str,
    pub report: Option<ImportReport>,
    pub error: Option<String>,
}

impl ImportTemplate {
    fn new(user: User) -> Self {
        Self {
            can_edit: user.role().can_edit(),
            user,
            current_page: "import",
            report: None,
            error: None,
        }
    }
}

pub async fn import_page(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ImportTemplate::new(user)
}

pub async fn import_json_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ConsoleError> {
    let result = api.import_from_json().await;
    render_result(ImportTemplate::new(user), result)
}

pub async fn import_zip_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Response, ConsoleError> {
    let mut archive = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("import.zip").to_string();
        let data = field.bytes().await.map_err(upload_error)?;
        if !data.is_empty() {
            archive = Some(
                FilePart::new(file_name, data.to_vec()).with_content_type("application/zip"),
            );
        }
    }

    let page = ImportTemplate::new(user);
    let Some(archive) = archive else {
        let page = ImportTemplate {
            error: Some("Choose a ZIP archive to import".to_string()),
            ..page
        };
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    };

    let result = api.import_from_zip(archive).await;
    render_result(page, result)
}

fn render_result(
    page: ImportTemplate,
    result: Result<ImportReport, ApiError>,
) -> Result<Response, ConsoleError> {
    match result {
        Ok(report) => {
            tracing::info!(
                total = report.total,
                created = report.created,
                updated = report.updated,
                errors = report.errors.len(),
                "Import finished"
            );
            Ok(ImportTemplate {
                report: Some(report),
                ..page
            }
            .into_response())
        }
        Err(e) => {
            let status = e.status().unwrap_or(StatusCode::BAD_GATEWAY);
            let message = inline_message(e)?;
            Ok((
                status,
                ImportTemplate {
                    error: Some(message),
                    ..page
                },
            )
                .into_response())
        }
    }
}
