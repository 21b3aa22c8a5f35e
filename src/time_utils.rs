use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{DigestError, DigestResult};

/// Timestamp layouts accepted in export cells, tried in order.
pub const ACCEPTED_FORMATS: &[&str] = &["%Y/%m/%d %H:%M", "%Y/%m/%d", "%Y-%m-%d %H:%M:%S"];

/// Retourne le timestamp courant en UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an export timestamp; the first matching layout wins.
/// Date-only values resolve to midnight.
pub fn parse_export_timestamp(raw: &str) -> DigestResult<NaiveDateTime> {
    let s = raw.trim();
    for fmt in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
        // chrono refuses a date-only layout for NaiveDateTime
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }
    Err(DigestError::InvalidTimestamp(s.to_string()))
}

/// `YYYY-MM-DD HH:MM`, used in rendered threads.
pub fn to_display(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
