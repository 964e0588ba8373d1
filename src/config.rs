//! Service configuration
//!
//! All knobs are loaded once at startup into an immutable `Config` value and
//! passed into the components that need them. There is no ambient global
//! configuration state.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::BoxError;
use crate::referral::commission::Pricing;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Shared-secret token gating the admin routes
    pub admin_token: String,
    /// Base URL this service is reachable at (dashboard links, short links)
    pub public_base_url: String,
    /// Public destination that tracked short links redirect to
    pub tracking_target_url: String,
    /// SES sender address; unset disables outbound email entirely
    pub ses_from_email: Option<String>,
    /// Pricing constants for commission estimates
    pub pricing: Pricing,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn env_decimal(name: &str, default: Decimal) -> Decimal {
        std::env::var(name)
            .ok()
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let defaults = Pricing::default();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/ambassadors.db?mode=rwc".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            admin_token: Self::require_secret("ADMIN_TOKEN", &environment)?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            tracking_target_url: std::env::var("TRACKING_TARGET_URL")
                .unwrap_or_else(|_| "https://app.example.com/signup".into()),
            ses_from_email: std::env::var("SES_FROM_EMAIL").ok().filter(|s| !s.is_empty()),
            pricing: Pricing {
                plan_price: Self::env_decimal("PLAN_PRICE", defaults.plan_price),
                upfront_rate: Self::env_decimal("UPFRONT_RATE", defaults.upfront_rate),
                monthly_per_signup: Self::env_decimal(
                    "MONTHLY_PER_SIGNUP",
                    defaults.monthly_per_signup,
                ),
            },
            environment,
        })
    }
}
