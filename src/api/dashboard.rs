//! Ambassador dashboard
//!
//! GET /dashboard?code=|ref=|email= — stats + commission estimate.
//! Code (either `code` or the legacy `ref` parameter) wins over email when
//! both are present. No match is an explicit not-found page, not an error.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::db::ambassadors::{self, Ambassador};
use crate::error::ServiceError;
use crate::referral::commission;
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub code: Option<String>,
    #[serde(rename = "ref")]
    pub ref_code: Option<String>,
    pub email: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, ServiceError> {
    let ambassador = lookup(&state, &query).await?;

    let Some(ambassador) = ambassador else {
        return Ok((StatusCode::NOT_FOUND, Html(views::dashboard_not_found())).into_response());
    };

    let estimate = commission::estimate(ambassador.signups, &state.pricing);
    let short_link = format!(
        "{}/l/{}",
        state.public_base_url.trim_end_matches('/'),
        ambassador.code
    );
    Ok(Html(views::dashboard(&ambassador, &estimate, &short_link)).into_response())
}

async fn lookup(
    state: &AppState,
    query: &DashboardQuery,
) -> Result<Option<Ambassador>, ServiceError> {
    let code = query
        .code
        .as_deref()
        .or(query.ref_code.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(code) = code {
        return Ok(ambassadors::find_by_code(&state.pool, code).await?);
    }
    if let Some(email) = query.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(ambassadors::find_by_email(&state.pool, email).await?);
    }
    Ok(None)
}
