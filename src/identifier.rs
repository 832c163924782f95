use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

static NOC_NUMBER: OnceLock<Regex> = OnceLock::new();

/// Certificate number for the current instant, `NOC-YY-MM-DD-XXXXXX`.
///
/// No database lookup is made. Two calls in the same millisecond (or a million
/// milliseconds apart on the same day) collide; the unique index on `nocs.noc_number`
/// turns that into a failed insert.
pub fn generate_noc_number() -> String {
    noc_number_at(Local::now())
}

pub fn noc_number_at<Tz: TimeZone>(at: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let suffix = at.timestamp_millis().rem_euclid(1_000_000);
    format!("NOC-{}-{:06}", at.format("%y-%m-%d"), suffix)
}

pub fn is_noc_number(candidate: &str) -> bool {
    NOC_NUMBER
        .get_or_init(|| Regex::new(r"^NOC-\d{2}-\d{2}-\d{2}-\d{6}$").unwrap())
        .is_match(candidate)
}
