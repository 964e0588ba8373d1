//! referral-cloud — ambassador referral tracking service
//!
//! Visitors register as ambassadors, receive a unique tracking code, and are
//! credited with clicks and signups attributed through that code. Commission
//! figures are display-only estimates, never authoritative financial records.

pub mod api;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod referral;
pub mod state;
pub mod views;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
