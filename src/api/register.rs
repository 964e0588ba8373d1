//! Registration flow
//!
//! GET  /          — entry redirect to the form
//! GET  /register  — registration form
//! POST /register  — validate → upsert → best-effort welcome mail → dashboard
//!
//! Validation failures re-render the form and touch nothing in the store.
//! Registering an already-known email is an update, never a duplicate row,
//! and hands back the same code as the first registration.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::api::found;
use crate::db::ambassadors;
use crate::email::WelcomeEmail;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub payout_preference: String,
    #[serde(default)]
    pub payout_identifier: String,
    /// Checkbox: present ("on") when ticked, absent otherwise
    #[serde(default)]
    pub accept_terms: Option<String>,
}

pub async fn index() -> Response {
    found("/register")
}

pub async fn show_form() -> Html<String> {
    Html(views::register_form(None, &views::RegisterFormValues::default()))
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ServiceError> {
    let mut violation = validate(&form).err();

    // A name is mandatory at creation only; repeat registrations may leave it
    // blank and keep the stored one
    if violation.is_none()
        && form.name.trim().is_empty()
        && ambassadors::find_by_email(&state.pool, &form.email).await?.is_none()
    {
        violation = Some("Name is required.".into());
    }

    if let Some(message) = violation {
        // First violated rule only; no store mutation on failure. Everything
        // the user typed is echoed back into the form.
        let values = views::RegisterFormValues {
            name: form.name,
            email: form.email,
            payout_preference: form.payout_preference,
            payout_identifier: form.payout_identifier,
        };
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(views::register_form(Some(&message), &values)),
        )
            .into_response());
    }

    let (ambassador, is_new) = ambassadors::upsert(
        &state.pool,
        &form.name,
        &form.email,
        Some(form.payout_preference.as_str()),
        Some(form.payout_identifier.as_str()),
    )
    .await?;

    tracing::info!(code = %ambassador.code, is_new, "Ambassador registered");

    // Fire-and-forget: delivery failure is logged and never blocks the
    // redirect or unwinds the committed store mutation
    let mailer = state.mailer.clone();
    let mail = welcome_email(&state, &ambassador, is_new);
    tokio::spawn(async move {
        if let Err(e) = mailer.send_welcome(&mail).await {
            tracing::warn!(error = %e, to = %mail.to_email, "Welcome email failed");
        }
    });

    Ok(found(&format!("/dashboard?code={}", ambassador.code)))
}

fn validate(form: &RegisterForm) -> Result<(), String> {
    let email = form.email.trim();
    if email.is_empty() {
        return Err("Email is required.".into());
    }
    if !email.contains('@') || !email.contains('.') {
        return Err("Email address looks invalid.".into());
    }
    let accepted = matches!(
        form.accept_terms.as_deref().map(str::trim),
        Some("on") | Some("true") | Some("1")
    );
    if !accepted {
        return Err("You must accept the terms.".into());
    }
    Ok(())
}

fn welcome_email(state: &AppState, ambassador: &ambassadors::Ambassador, is_new: bool) -> WelcomeEmail {
    let base = state.public_base_url.trim_end_matches('/');
    WelcomeEmail {
        to_email: ambassador.email.clone(),
        firstname: ambassador
            .name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        code: ambassador.code.clone(),
        dashboard_url: format!("{base}/dashboard?code={}", ambassador.code),
        short_link: format!("{base}/l/{}", ambassador.code),
        tracking_target: state.tracking_target_url.clone(),
        is_new,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, terms: Option<&str>) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            payout_preference: String::new(),
            payout_identifier: String::new(),
            accept_terms: terms.map(String::from),
        }
    }

    #[test]
    fn first_violated_rule_wins() {
        assert_eq!(
            validate(&form("Alice", "", None)).unwrap_err(),
            "Email is required."
        );
        assert_eq!(
            validate(&form("Alice", "not-an-email", None)).unwrap_err(),
            "Email address looks invalid."
        );
        assert_eq!(
            validate(&form("Alice", "alice@x.com", None)).unwrap_err(),
            "You must accept the terms."
        );
    }

    #[test]
    fn accepts_checkbox_variants() {
        for terms in ["on", "true", "1"] {
            assert!(validate(&form("Alice", "alice@x.com", Some(terms))).is_ok());
        }
        assert!(validate(&form("Alice", "alice@x.com", Some("off"))).is_err());
    }
}
