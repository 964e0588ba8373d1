//! Tracked short link
//!
//! GET /l/{code} — credits a click and bounces to the public destination with
//! `?ref={code}`. The redirect is built from the visitor's input code, so an
//! unknown or mangled code still reaches the destination; it just credits
//! nobody. Concurrent hits on one code are counted exactly, see the store's
//! atomic increment.

use axum::extract::{Path, State};
use axum::response::Response;

use crate::api::found;
use crate::db::ambassadors;
use crate::error::ServiceError;
use crate::state::AppState;

pub async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServiceError> {
    let input = code.trim().to_string();

    let credited = ambassadors::increment_clicks(&state.pool, &input).await?;
    if !credited {
        tracing::debug!(code = %input, "Unknown referral code, redirecting uncredited");
    }

    let target = format!(
        "{}?ref={}",
        state.tracking_target_url,
        urlencoding::encode(&input)
    );
    Ok(found(&target))
}
