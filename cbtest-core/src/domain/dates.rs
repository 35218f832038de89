//! Backtest date range in editable (`YYYY-MM-DD`) form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editable date format.
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Which end of the range an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Start => f.write_str("start_date"),
            DateField::End => f.write_str("end_date"),
        }
    }
}

/// Start/end dates as the user typed them. Empty string means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn get(&self, field: DateField) -> &str {
        match field {
            DateField::Start => &self.start_date,
            DateField::End => &self.end_date,
        }
    }

    pub(crate) fn get_mut(&mut self, field: DateField) -> &mut String {
        match field {
            DateField::Start => &mut self.start_date,
            DateField::End => &mut self.end_date,
        }
    }

    /// `Some(false)` only when both dates parse and start is after end.
    pub fn is_ordered(&self) -> Option<bool> {
        let start = parse_iso(&self.start_date)?;
        let end = parse_iso(&self.end_date)?;
        Some(start <= end)
    }
}

/// Parse a zero-padded `YYYY-MM-DD` calendar date.
pub fn parse_iso(value: &str) -> Option<NaiveDate> {
    // chrono accepts `2022-8-1`; the compact form is only injective when padded.
    let padded = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !padded {
        return None;
    }
    NaiveDate::parse_from_str(value, ISO_FORMAT).ok()
}

/// Empty, or a valid calendar date in `YYYY-MM-DD` form.
pub fn is_valid_field(value: &str) -> bool {
    value.is_empty() || parse_iso(value).is_some()
}

/// Strip separators: `2022-08-01` → `20220801`. Empty stays empty.
pub fn compact(value: &str) -> String {
    value.replace('-', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_strips_separators() {
        assert_eq!(compact("2022-08-01"), "20220801");
        assert_eq!(compact(""), "");
    }

    #[test]
    fn field_validation() {
        assert!(is_valid_field(""));
        assert!(is_valid_field("2024-02-29"));
        assert!(!is_valid_field("2023-02-29"));
        assert!(!is_valid_field("20220801"));
        assert!(!is_valid_field("2022-8-01"));
        assert!(!is_valid_field("yesterday"));
    }

    #[test]
    fn ordering_needs_both_dates() {
        assert_eq!(DateRange::new("2022-08-01", "").is_ordered(), None);
        assert_eq!(DateRange::new("2022-08-01", "2025-12-31").is_ordered(), Some(true));
        assert_eq!(DateRange::new("2025-12-31", "2022-08-01").is_ordered(), Some(false));
    }
}
