//! Natural-language dates ("tomorrow", "in 3 weeks", "Mar 5 2026") relative to a local `now`.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%b %d %Y", "%B %d %Y"];

fn midnight(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

/// `amount` months after `now`, at midnight. The day is capped at 28 so every month has it.
fn months_ahead(now: NaiveDateTime, amount: u32) -> Option<NaiveDateTime> {
    let zero_based = now.month0().checked_add(amount)?;
    let year = now.year() + i32::try_from(zero_based / 12).ok()?;
    midnight(year, zero_based % 12 + 1, now.day().min(28))
}

/// Parse a date phrase. Relative phrases win over absolute formats;
/// `Ok(None)` means nothing recognisable.
pub fn parse_natural_date(text: &str, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
    let text = text.trim().to_lowercase();

    if text.contains("today") {
        return Ok(Some(now));
    }
    if text.contains("tomorrow") {
        return Ok(Some(now + Duration::days(1)));
    }
    if text.contains("next week") {
        return Ok(Some(now + Duration::days(7)));
    }
    if text.contains("next month") {
        return Ok(months_ahead(now, 1));
    }

    let in_re = Regex::new(r"in (\d+) (days?|weeks?|months?)")?;
    if let Some(caps) = in_re.captures(&text) {
        let Ok(amount) = caps[1].parse::<u32>() else {
            return Ok(None);
        };
        let date = match &caps[2] {
            "day" | "days" => now.checked_add_signed(Duration::days(amount.into())),
            "week" | "weeks" => now.checked_add_signed(Duration::weeks(amount.into())),
            _ => months_ahead(now, amount),
        };
        return Ok(date);
    }

    Ok(DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN)))
}
