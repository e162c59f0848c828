use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Source of "now" for every time-based rule (backup intervals, reminders,
/// timestamps on new records).
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub fn format_rfc3339(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .expect("RFC3339 formatting for a UTC timestamp should never fail")
}

pub fn now_utc_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn parse_rfc3339(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()
}

/// Accepts a full RFC3339 timestamp or a bare `YYYY-MM-DD` date (read as
/// midnight UTC).
pub fn parse_date_input(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if let Some(parsed) = parse_rfc3339(trimmed) {
        return Some(parsed);
    }
    let format = time::macros::format_description!("[year]-[month]-[day]");
    time::Date::parse(trimmed, &format)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

pub fn whole_days_between(earlier: OffsetDateTime, later: OffsetDateTime) -> i64 {
    (later - earlier).whole_days()
}

#[cfg(test)]
pub use manual::ManualClock;
