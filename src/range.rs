use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reporting years are normalised to twelve 30-day months.
pub const YEARLY_FACTOR: u32 = 360;

const CAPTION_DATE: &str = "%b %-d, %Y";
const CAPTION_DATE_TIME: &str = "%b %-d, %Y, %-I:%M %p";
const CAPTION_MONTH_YEAR: &str = "%b %Y";

/// Display period selected by the range toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    #[default]
    Today,
    Monthly,
    Yearly,
}

impl RangeMode {
    pub const ALL: [Self; 3] = [Self::Today, Self::Monthly, Self::Yearly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Button label used by the toggle.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for RangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown range mode `{0}` (expected today, monthly or yearly)")]
pub struct ParseRangeModeError(String);

impl FromStr for RangeMode {
    type Err = ParseRangeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRangeModeError(trimmed.to_string()))
    }
}

pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of calendar days in `month` (1-based) of `year`.
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// How many days a value shown under `mode` stands for.
pub fn range_factor(mode: RangeMode, reference: &impl Datelike) -> u32 {
    match mode {
        RangeMode::Today => 1,
        RangeMode::Monthly => days_in_month(reference.year(), reference.month()),
        RangeMode::Yearly => YEARLY_FACTOR,
    }
}

pub fn scale_number_by_range(value: f64, mode: RangeMode, reference: &impl Datelike) -> f64 {
    value * f64::from(range_factor(mode, reference))
}

/// Caption shown under a KPI panel describing the window its numbers cover.
pub fn format_range_text(mode: RangeMode, now: &NaiveDateTime) -> String {
    match mode {
        RangeMode::Today => format!("Data till {}", now.format(CAPTION_DATE_TIME)),
        RangeMode::Monthly => format!(
            "Data from {} – {}",
            start_of_month(now.date()).format(CAPTION_DATE),
            now.format(CAPTION_DATE)
        ),
        RangeMode::Yearly => format!(
            "Data from {} – {}",
            start_of_year(now.date()).format(CAPTION_DATE),
            now.format(CAPTION_MONTH_YEAR)
        ),
    }
}

fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn start_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}
