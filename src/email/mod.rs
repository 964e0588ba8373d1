//! Outbound email
//!
//! The welcome mail is a best-effort side effect of registration: callers
//! spawn it after the store commit, log failures, and never let delivery
//! block or roll back a registration. `Mailer` is fixed at startup to either
//! a real SES sender or a no-op stub, so callers never check for presence.

use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::BoxError;

/// Everything the welcome mail needs, assembled by the registration flow.
#[derive(Debug, Clone)]
pub struct WelcomeEmail {
    pub to_email: String,
    pub firstname: String,
    pub code: String,
    pub dashboard_url: String,
    pub short_link: String,
    pub tracking_target: String,
    pub is_new: bool,
}

/// Outbound mail capability
#[derive(Clone)]
pub enum Mailer {
    Ses { client: SesClient, from: String },
    Noop,
}

impl Mailer {
    pub async fn send_welcome(&self, mail: &WelcomeEmail) -> Result<(), BoxError> {
        match self {
            Mailer::Noop => {
                tracing::debug!(
                    to = %mail.to_email,
                    code = %mail.code,
                    tracking_target = %mail.tracking_target,
                    "Mailer disabled, skipping welcome email"
                );
                Ok(())
            }
            Mailer::Ses { client, from } => send_via_ses(client, from, mail).await,
        }
    }
}

async fn send_via_ses(ses: &SesClient, from: &str, mail: &WelcomeEmail) -> Result<(), BoxError> {
    let subject_text = if mail.is_new {
        "Your ambassador access (links + dashboard)"
    } else {
        "Reminder: your ambassador access"
    };
    let subject = Content::builder().data(subject_text).build()?;

    let hello = if mail.firstname.is_empty() {
        "Hello,".to_string()
    } else {
        format!("Hello {},", mail.firstname)
    };

    // The bare destination URL is deliberately absent from the body: a shared
    // link must carry the referral code or the click is never credited.
    let body_text = format!(
        "{hello}\n\n\
         Welcome to the ambassador program.\n\n\
         Your personal links (keep this email):\n\
         - Dashboard: {dashboard}\n\
         - Link to share (tracked): {short}\n\
         - Your code: {code}\n",
        dashboard = mail.dashboard_url,
        short = mail.short_link,
        code = mail.code,
    );

    let body = Body::builder()
        .text(Content::builder().data(body_text).build()?)
        .build();

    let message = Message::builder().subject(subject).body(body).build();

    ses.send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(mail.to_email.clone()).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await?;

    tracing::info!(to = %mail.to_email, is_new = mail.is_new, "Welcome email sent");
    Ok(())
}
