//! Application state for referral-cloud

use std::str::FromStr;
use std::time::Duration;

use aws_sdk_sesv2::Client as SesClient;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::BoxError;
use crate::config::Config;
use crate::email::Mailer;
use crate::referral::commission::Pricing;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Outbound mail capability (SES or a no-op stub, fixed at startup)
    pub mailer: Mailer,
    /// Shared-secret token gating the admin routes
    pub admin_token: String,
    /// Base URL for dashboard and short links
    pub public_base_url: String,
    /// Public destination for tracked redirects
    pub tracking_target_url: String,
    /// Pricing constants for commission estimates
    pub pricing: Pricing,
    /// Database label reported by the JSON export
    pub db_label: String,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        prepare_sqlite_dir(&config.database_url)?;

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let mailer = match &config.ses_from_email {
            Some(from) => {
                let aws_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
                    let ses_config = aws_config
                        .to_builder()
                        .region(aws_config::Region::new(ses_region))
                        .build();
                    SesClient::new(&ses_config)
                } else {
                    SesClient::new(&aws_config)
                };
                tracing::info!(from = %from, "SES mailer enabled");
                Mailer::Ses {
                    client: ses,
                    from: from.clone(),
                }
            }
            None => {
                tracing::info!("SES_FROM_EMAIL not set, outbound email disabled");
                Mailer::Noop
            }
        };

        Ok(Self {
            pool,
            mailer,
            admin_token: config.admin_token.clone(),
            public_base_url: config.public_base_url.clone(),
            tracking_target_url: config.tracking_target_url.clone(),
            pricing: config.pricing.clone(),
            db_label: db_label(&config.database_url),
        })
    }
}

/// Ensure the directory holding a file-backed SQLite database exists.
fn prepare_sqlite_dir(database_url: &str) -> Result<(), BoxError> {
    let path = sqlite_file_path(database_url);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(&path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn sqlite_file_path(database_url: &str) -> String {
    let stripped = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    stripped.split('?').next().unwrap_or("").to_string()
}

fn db_label(database_url: &str) -> String {
    let path = sqlite_file_path(database_url);
    if path.is_empty() || path == ":memory:" {
        return "memory".into();
    }
    std::path::Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(path)
}
