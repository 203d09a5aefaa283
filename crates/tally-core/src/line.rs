//! Timesheet line classification.
//!
//! Classifies each raw input line as a date header, a time-range entry, or
//! neither, and extracts the structured fields of entry lines.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use thiserror::Error;

/// Pre-compiled regex for date header lines, e.g. `Mon 1.1.2024`.
///
/// A weekday abbreviation (three- or two-letter) followed by a
/// `day.month.year` date with a 2-4 digit year. Anchored at the line start.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(Mon|Tue|Wed|Thu|Fri|Sat|Sun|Mo|Tu|We|Th|Fr|Sa|Su) +([0-3]?[0-9])\.([01]?[0-9])\.([12]?[0-9]?[0-9][0-9])",
    )
    .expect("date regex is valid")
});

/// Pre-compiled regex for entry lines, e.g. `9:00-10:30 Did work (@JOB)`.
///
/// Hours and minutes may be separated by `:` or `.`, independently on each
/// side of the range. The description runs up to (but not including) the
/// first `(` and must be non-empty.
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<from_hour>[0-9]{1,2})[:.](?P<from_min>[0-9]{2})\s*-\s*(?P<to_hour>[0-9]{1,2})[:.](?P<to_min>[0-9]{2}),?\s+(?P<description>[^(]+)",
    )
    .expect("entry regex is valid")
});

/// An entry line whose numeric fields do not form a valid time of day.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day {text:?}")]
pub struct InvalidTime {
    /// The offending `hour:minute` text.
    pub text: String,
}

/// A single time-range entry extracted from a timesheet line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Start of the entry, time-of-day only.
    pub from: NaiveTime,

    /// End of the entry, time-of-day only. May precede `from`; spans are
    /// subtracted without a guard and negative durations propagate as-is.
    pub to: NaiveTime,

    /// Free text between the time range and the category group, trimmed.
    pub description: String,
}

/// Classification of one raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// A day boundary. `label` is the verbatim header line.
    DateHeader { label: String },

    /// A time-range entry.
    Entry(Entry),

    /// Anything else; ignored by aggregation.
    Other,
}

/// Classifies a raw line.
///
/// Leading `*` characters are stripped before the date-header match, so
/// emphasized headers like `**Mon 1.1.2024**` still mark a day boundary.
/// A line matching the entry shape but carrying an impossible time of day
/// (hour 25, minute 71) is an error, not `Other`.
pub fn classify(line: &str) -> Result<LineKind, InvalidTime> {
    if is_date_header(line) {
        return Ok(LineKind::DateHeader {
            label: line.to_string(),
        });
    }

    if let Some(caps) = ENTRY_RE.captures(line) {
        let from = parse_time(&caps["from_hour"], &caps["from_min"])?;
        let to = parse_time(&caps["to_hour"], &caps["to_min"])?;
        return Ok(LineKind::Entry(Entry {
            from,
            to,
            description: caps["description"].trim().to_string(),
        }));
    }

    Ok(LineKind::Other)
}

/// Returns true if the line is a date header.
pub fn is_date_header(line: &str) -> bool {
    DATE_RE.is_match(line.trim_start_matches('*'))
}

/// Returns true if the line has the shape of a time-range entry.
///
/// Shape only: a valid match with an impossible time of day still returns
/// true here and fails later in [`classify`].
pub fn is_entry(line: &str) -> bool {
    ENTRY_RE.is_match(line)
}

fn parse_time(hour: &str, minute: &str) -> Result<NaiveTime, InvalidTime> {
    let invalid = || InvalidTime {
        text: format!("{hour}:{minute}"),
    };
    let h: u32 = hour.parse().map_err(|_| invalid())?;
    let m: u32 = minute.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(invalid)
}
