use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ServerSettings;
use crate::handlers::{
    app::health_check,
    auth::{login_handler, login_page, logout_handler},
    dashboard::dashboard_handler,
    images::{
        delete_image_handler, images_handler, preview_handler, set_cover_handler, upload_handler,
    },
    import::{import_json_handler, import_page, import_zip_handler},
    metrics::metrics,
    products::{
        create_product_handler, delete_product_handler, edit_product_page,
        list_products_handler, new_product_page, update_product_handler,
    },
};
use crate::middleware::{
    guard::route_guard,
    request_id::{request_id_middleware, REQUEST_ID_HEADER},
    teardown::session_teardown,
};
use crate::AppState;

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(server.session_ttl_hours)));

    // Uploads replace axum's default 2 MiB cap with the configured one
    let upload_limit = (
        DefaultBodyLimit::disable(),
        RequestBodyLimitLayer::new(server.max_upload_bytes),
    );

    // Every page behind this router needs a verified session
    let protected = Router::new()
        .route("/", get(dashboard_handler))
        .route("/products", get(list_products_handler))
        .route(
            "/products/new",
            get(new_product_page).post(create_product_handler),
        )
        .route(
            "/products/:id",
            get(edit_product_page).post(update_product_handler),
        )
        .route("/products/:id/delete", post(delete_product_handler))
        .route("/images/:product_id", get(images_handler))
        .route(
            "/images/:product_id/upload",
            post(upload_handler).layer(upload_limit.clone()),
        )
        .route("/images/:image_id/preview", get(preview_handler))
        .route("/images/:image_id/set-cover", post(set_cover_handler))
        .route("/images/:image_id/delete", post(delete_image_handler))
        .route("/import", get(import_page))
        .route("/import/json", post(import_json_handler))
        .route(
            "/import/zip",
            post(import_zip_handler).layer(upload_limit),
        )
        .route_layer(from_fn_with_state(state.clone(), route_guard));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .merge(protected)
        .nest_service("/static", ServeDir::new("catalog-console/static"))
        .layer(from_fn(session_teardown))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
