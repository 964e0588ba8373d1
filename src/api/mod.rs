//! HTTP routes for referral-cloud

pub mod admin;
pub mod dashboard;
pub mod health;
pub mod register;
pub mod track;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Admin routes (shared-secret token in query string)
    let admin = Router::new()
        .route("/admin/ambassadors", get(admin::list))
        .route("/admin/ambassadors.csv", get(admin::export_csv))
        .route("/admin/ambassadors.json", get(admin::export_json))
        .route("/admin/conversions", post(admin::record_conversion));

    // Public pages + tracked redirect
    let public = Router::new()
        .route("/", get(register::index))
        .route("/register", get(register::show_form).post(register::register))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/l/{code}", get(track::track));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 302 Found redirect. The browser-facing flows use 302 specifically; axum's
/// `Redirect` helpers emit 303/307/308.
pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}
