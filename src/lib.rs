//! Range scaling and KPI presentation for a yard/terminal operations dashboard.
//!
//! The dashboard shows daily KPIs and lets the operator flip between `today`,
//! `monthly` and `yearly` views. Monthly values are daily values times the days in
//! the current month; yearly values use a 360-day year.
//!
//! ```
//! use chrono::NaiveDate;
//! use yardrange::formatting::{DisplayValue, scale_display_value};
//! use yardrange::range::{RangeMode, range_factor};
//!
//! let feb = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
//! assert_eq!(range_factor(RangeMode::Monthly, &feb), 29);
//! assert_eq!(
//!     scale_display_value("42 min", RangeMode::Yearly, &feb),
//!     DisplayValue::from("15,120 min")
//! );
//! ```

pub mod alerts;
pub mod datetime;
pub mod formatting;
pub mod kpi;
pub mod range;
pub mod report;
pub mod session;
pub mod store;
pub mod summary;

pub use formatting::{DisplayScaler, DisplayValue, NumberLocale, scale_display_value};
pub use range::{RangeMode, format_range_text, range_factor};
