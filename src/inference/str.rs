use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{Primitive, TypeTree};

// Shape gates; chrono validates the calendar/clock values afterwards.
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?$").unwrap());
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2})[Tt ](\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)(?:[Zz]|[+-]\d{2}(?::?\d{2})?)?$",
    )
    .unwrap()
});

/// Type a string scalar. Empty strings carry no value and become `Blank`.
pub fn classify_string(s: &str, infer_datetimes: bool) -> TypeTree {
    if s.is_empty() {
        return TypeTree::Blank;
    }
    if infer_datetimes {
        if let Some(kind) = probe_datetime(s) {
            return TypeTree::Primitive(kind);
        }
    }
    TypeTree::str()
}

/// ISO-8601 date, time or timestamp, if `s` is one.
pub fn probe_datetime(s: &str) -> Option<Primitive> {
    let s = s.trim();
    if DATE.is_match(s) {
        return valid_date(s).then_some(Primitive::Date);
    }
    if TIME.is_match(s) {
        return valid_time(s).then_some(Primitive::Time);
    }
    let caps = TIMESTAMP.captures(s)?;
    (valid_date(&caps[1]) && valid_time(&caps[2])).then_some(Primitive::Timestamp)
}

fn valid_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn valid_time(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok()
        || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}
