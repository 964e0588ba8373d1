//! Admin routes
//!
//! All gated by a shared-secret `token` query parameter. A mismatch is a
//! plain 403 with nothing leaked about the expected value.
//!
//! GET  /admin/ambassadors       — HTML table
//! GET  /admin/ambassadors.csv   — CSV export, every field quoted
//! GET  /admin/ambassadors.json  — JSON export with a count envelope
//! POST /admin/conversions       — manual conversion entry (signups += 1)

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::db::ambassadors;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

fn check_token(state: &AppState, query: &TokenQuery) -> ServiceResult<()> {
    match query.token.as_deref() {
        Some(token) if !token.is_empty() && token == state.admin_token => Ok(()),
        _ => Err(ServiceError::Forbidden),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ServiceError> {
    check_token(&state, &query)?;
    let rows = ambassadors::list_all(&state.pool).await?;
    Ok(Html(views::admin_table(&rows)).into_response())
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ServiceError> {
    check_token(&state, &query)?;
    let rows = ambassadors::list_all(&state.pool).await?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record([
        "id",
        "name",
        "email",
        "code",
        "payout_preference",
        "payout_identifier",
        "created_at",
        "updated_at",
        "clicks",
        "signups",
    ])?;
    for a in &rows {
        writer.write_record([
            a.id.as_str(),
            a.name.as_str(),
            a.email.as_str(),
            a.code.as_str(),
            a.payout_preference.as_deref().unwrap_or(""),
            a.payout_identifier.as_deref().unwrap_or(""),
            &views::fmt_ts(a.created_at),
            &views::fmt_ts(a.updated_at),
            &a.clicks.to_string(),
            &a.signups.to_string(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        bytes,
    )
        .into_response())
}

pub async fn export_json(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, ServiceError> {
    check_token(&state, &query)?;
    let count = ambassadors::count(&state.pool).await?;
    let rows = ambassadors::list_all(&state.pool).await?;
    Ok(axum::Json(serde_json::json!({
        "db": state.db_label,
        "count": count,
        "ambassadors": rows,
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ConversionForm {
    #[serde(default)]
    pub code: String,
}

/// Operator hand-entry for a confirmed conversion. The billing system is the
/// canonical writer of `signups`; this exists for entries it missed.
pub async fn record_conversion(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Form(form): Form<ConversionForm>,
) -> Result<Response, ServiceError> {
    check_token(&state, &query)?;

    let code = form.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ServiceError::Validation("A referral code is required.".into()));
    }

    let updated = ambassadors::increment_signups(&state.pool, &code).await?;
    if !updated {
        return Ok((
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "code": code, "updated": false })),
        )
            .into_response());
    }

    tracing::info!(code = %code, "Conversion recorded");
    Ok(axum::Json(serde_json::json!({ "code": code, "updated": true })).into_response())
}
