//! Time utilities: timezone-aware due dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Parse a due date typed by a user in an IANA timezone, returning UTC.
///
/// Accepts RFC3339 (offset wins over `tz`), `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM[:SS]`
/// and a bare `YYYY-MM-DD` (midnight local).
pub fn parse_due_date(input: &str, tz: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let tz: Tz = tz
        .parse()
        .map_err(|_| Error::InvalidDate(format!("invalid timezone: {tz}")))?;

    let ndt = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| Error::InvalidDate(format!("'{input}' (use YYYY-MM-DD or YYYY-MM-DD HH:MM)")))?;

    local_to_utc(ndt, tz)
}

/// Interpret a naive local time in `tz`.
pub fn local_to_utc(ndt: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    let local = tz
        .from_local_datetime(&ndt)
        .earliest()
        .ok_or_else(|| Error::InvalidDate(format!("nonexistent local time (DST?): {ndt} {tz}")))?;
    Ok(local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chicago_due_date() {
        // Feb is CST (UTC-6)
        let utc = parse_due_date("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn bare_date_is_local_midnight() {
        let utc = parse_due_date("2026-07-04", "UTC").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-07-04T00:00:00+00:00");
    }

    #[test]
    fn rfc3339_ignores_timezone_argument() {
        let utc = parse_due_date("2026-07-04T12:00:00+02:00", "Not/AZone").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-07-04T10:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_due_date("next tuesday", "UTC"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_due_date("2026-07-04", "Mars/Base"), Err(Error::InvalidDate(_))));
    }
}
