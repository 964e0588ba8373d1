//! Database access layer

pub mod ambassadors;

/// Epoch milliseconds, the timestamp convention for every stored column.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
