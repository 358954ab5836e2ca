//! Cell text rules: placeholder stripping, appending after labels, dates.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Remove underscore placeholder runs ("FECHA: ________") and trailing space.
pub fn strip_placeholder(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| *c != '_') {
        out.push(c);
    }
    out.trim_end().to_string()
}

/// Text for a cell that may already hold a label.
///
/// Non-placeholder text is kept and the value goes after a space; a blank or
/// placeholder-only cell gets the value alone.
pub fn append_after(existing: Option<&str>, value: &str) -> String {
    let kept = existing.map(strip_placeholder).unwrap_or_default();
    if kept.trim().is_empty() {
        value.to_string()
    } else {
        format!("{kept} {value}")
    }
}

/// `"{label} {value}{suffix}"`.
pub fn label_with_value(label: &str, value: &str, suffix: Option<&str>) -> String {
    format!("{} {value}{}", label.trim_end(), suffix.unwrap_or_default())
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time), `DD/MM/YYYY` and
/// `DD-MM-YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            value
                .get(..10)
                .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        })
}

/// Two-digit day, two-digit month, numeric year.
pub fn decompose(date: NaiveDate) -> (String, String, f64) {
    (
        format!("{:02}", date.day()),
        format!("{:02}", date.month()),
        f64::from(date.year()),
    )
}

pub fn format_date(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}
