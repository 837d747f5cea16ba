//! Station timestamp localization.
//!
//! Stations send `dateutc` as `YYYY-MM-DD HH:MM:SS` in UTC. The localized
//! string is display text only; downstream code must not parse it again.

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::TimestampError;

/// Input and output pattern of the station timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a UTC station timestamp into `tz`.
pub fn to_local(dateutc: &str, tz: Tz) -> Result<String, TimestampError> {
    let naive = NaiveDateTime::parse_from_str(dateutc.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| TimestampError::Parse {
            value: dateutc.to_string(),
            reason: e.to_string(),
        })?;
    let local = Utc.from_utc_datetime(&naive).with_timezone(&tz);
    Ok(local.format(TIMESTAMP_FORMAT).to_string())
}

/// Localize an optional `dateutc`.
///
/// Absent input yields an empty string; unparsable input is returned verbatim.
pub fn localize(dateutc: Option<&str>, tz: Tz) -> String {
    let Some(raw) = dateutc else {
        return String::new();
    };
    match to_local(raw, tz) {
        Ok(local) => local,
        Err(e) => {
            tracing::debug!(error = %e, "Keeping raw station timestamp");
            raw.to_string()
        }
    }
}
