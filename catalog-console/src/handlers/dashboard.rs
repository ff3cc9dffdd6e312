use askama::Template;
use axum::response::IntoResponse;

use crate::error::ConsoleError;
use crate::models::{CurrentUser, StatsOverview, User};
use crate::services::catalog_api::DEFAULT_STATS_TOP;
use crate::services::CatalogApi;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: User,
    pub can_edit: bool,
    pub current_page: &'static str,
    pub stats: StatsOverview,
}

pub async fn dashboard_handler(
    api: CatalogApi,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ConsoleError> {
    let stats = api.stats_overview(DEFAULT_STATS_TOP).await?;

    Ok(DashboardTemplate {
        can_edit: user.role().can_edit(),
        user,
        current_page: "dashboard",
        stats,
    })
}
