//! Shared storage helper functions.

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 UTC string with millisecond precision.
///
/// Matches the timestamp format of rows written by earlier deployments, so
/// `created_at`/`updated_at` sort lexicographically across old and new rows.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Quote a SQL identifier for both SQLite and PostgreSQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
