//! Time utilities.
//!
//! Timestamps throughout the crate are Unix epoch values; the backend
//! speaks epoch milliseconds for access windows and share expirations.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Returns the current Unix timestamp in milliseconds.
pub fn now_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
