use crate::range::{RangeMode, range_factor};
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ASCII digits only; `\d` would also match other Unicode digit classes.
static NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").unwrap());

const MAX_FRACTION_DIGITS: usize = 3;

/// Digit grouping conventions understood by the number formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberLocale {
    #[default]
    EnUs,
    EnGb,
    DeDe,
    FrFr,
    Plain,
}

impl NumberLocale {
    pub const ALL: [Self; 5] = [Self::EnUs, Self::EnGb, Self::DeDe, Self::FrFr, Self::Plain];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
            Self::Plain => "plain",
        }
    }

    pub const fn group_separator(self) -> Option<char> {
        match self {
            Self::EnUs | Self::EnGb => Some(','),
            Self::DeDe => Some('.'),
            Self::FrFr => Some('\u{202f}'),
            Self::Plain => None,
        }
    }

    pub const fn decimal_separator(self) -> char {
        match self {
            Self::EnUs | Self::EnGb | Self::Plain => '.',
            Self::DeDe | Self::FrFr => ',',
        }
    }
}

impl fmt::Display for NumberLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale `{0}` (expected en-US, en-GB, de-DE, fr-FR or plain)")]
pub struct ParseLocaleError(String);

impl FromStr for NumberLocale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|locale| locale.tag().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseLocaleError(s.trim().to_string()))
    }
}

/// Format a number with the locale's grouping, up to three fraction digits.
pub fn format_number(value: f64, locale: NumberLocale) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return (if value > 0.0 { "∞" } else { "-∞" }).to_string();
    }

    let rendered = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3 + 1);
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, locale.group_separator()));
    if !frac_part.is_empty() {
        out.push(locale.decimal_separator());
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str, separator: Option<char>) -> String {
    let Some(sep) = separator else {
        return digits.to_string();
    };
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(ch);
    }
    grouped
}

/// Signed one-decimal percentage for a trend badge, e.g. `+2.5%`.
pub fn format_trend(direction: TrendDirection, percentage: f64) -> String {
    let sign = match direction {
        TrendDirection::Up => '+',
        TrendDirection::Down => '-',
    };
    format!("{sign}{:.1}%", percentage.abs())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

/// A KPI value as handed to a widget: either a bare number or a pre-formatted
/// template such as `"42 min"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for DisplayValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for DisplayValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DisplayValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Projects daily KPI values onto a display period.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayScaler {
    locale: NumberLocale,
}

impl DisplayScaler {
    pub const fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    pub fn scale(
        &self,
        value: impl Into<DisplayValue>,
        mode: RangeMode,
        reference: &impl Datelike,
    ) -> DisplayValue {
        let value = value.into();
        if mode == RangeMode::Today {
            return value;
        }
        let factor = f64::from(range_factor(mode, reference));
        match value {
            DisplayValue::Number(n) => DisplayValue::Number(n * factor),
            DisplayValue::Text(text) => DisplayValue::Text(self.scale_text(&text, factor)),
        }
    }

    fn scale_text(&self, text: &str, factor: f64) -> String {
        NUMBER_TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                let token = &caps[0];
                match token.parse::<f64>() {
                    Ok(number) => format_number(round_half_up(number * factor), self.locale),
                    Err(err) => {
                        tracing::debug!(token, %err, "leaving unparseable numeric token as-is");
                        token.to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// Scale `value` for `mode` using the default (en-US) grouping.
pub fn scale_display_value(
    value: impl Into<DisplayValue>,
    mode: RangeMode,
    reference: &impl Datelike,
) -> DisplayValue {
    DisplayScaler::default().scale(value, mode, reference)
}

// Halves go toward positive infinity (-2.5 -> -2), matching the dashboard widgets.
// Exact for whole numbers past 2^52, where `value + 0.5` would itself round.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_is_identity() {
        let d = date(2024, 2, 15);
        for value in [
            DisplayValue::Number(12.345),
            DisplayValue::from("42 min"),
            DisplayValue::from("1234567 trucks"),
            DisplayValue::from("no numbers"),
        ] {
            assert_eq!(scale_display_value(value.clone(), RangeMode::Today, &d), value);
        }
    }

    #[test]
    fn numbers_are_multiplied_without_rounding() {
        let scaled = scale_display_value(100.0, RangeMode::Monthly, &date(2023, 2, 1));
        assert_eq!(scaled, DisplayValue::Number(2800.0));
        let scaled = scale_display_value(0.25, RangeMode::Monthly, &date(2024, 1, 9));
        assert_eq!(scaled, DisplayValue::Number(7.75));
    }

    #[test]
    fn text_tokens_are_scaled_and_grouped() {
        let scaled = scale_display_value("42 min", RangeMode::Yearly, &date(2024, 6, 1));
        assert_eq!(scaled, DisplayValue::from("15,120 min"));
    }

    #[test]
    fn each_token_is_scaled_independently() {
        let scaled = scale_display_value("10 in / 5 out", RangeMode::Monthly, &date(2024, 4, 1));
        assert_eq!(scaled, DisplayValue::from("300 in / 150 out"));
    }

    #[test]
    fn decimal_and_negative_tokens_round_to_integers() {
        let d = date(2024, 4, 1);
        let scaled = scale_display_value("avg 1.55 h, delta -0.5", RangeMode::Monthly, &d);
        assert_eq!(scaled, DisplayValue::from("avg 47 h, delta -15"));
        assert_eq!(round_half_up(-1.5), -1.0);
        assert_eq!(round_half_up(2.5), 3.0);
    }

    #[test]
    fn text_without_numbers_is_untouched() {
        let scaled = scale_display_value("n/a", RangeMode::Yearly, &date(2024, 1, 1));
        assert_eq!(scaled, DisplayValue::from("n/a"));
    }

    #[test]
    fn non_ascii_digits_are_not_tokens() {
        let scaled = scale_display_value("٣ trucks", RangeMode::Yearly, &date(2024, 1, 1));
        assert_eq!(scaled, DisplayValue::from("٣ trucks"));
    }

    #[test]
    fn large_whole_products_keep_their_last_digit() {
        // 155296538874845 * 29 = 4503599627370505, odd and above 2^52.
        assert_eq!(
            scale_display_value("155296538874845 t", RangeMode::Monthly, &date(2024, 2, 15)),
            DisplayValue::from("4,503,599,627,370,505 t")
        );
        assert_eq!(round_half_up(4_503_599_627_370_505.0), 4_503_599_627_370_505.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(0.49), 0.0);
    }

    #[test]
    fn rescaling_is_not_idempotent() {
        let d = date(2024, 4, 1);
        let once = scale_display_value("5 out", RangeMode::Monthly, &d);
        let twice = scale_display_value(once.clone(), RangeMode::Monthly, &d);
        assert_ne!(once, twice);
        assert_eq!(twice, DisplayValue::from("4,500 out"));

        let once = scale_display_value(2.0, RangeMode::Yearly, &d);
        let twice = scale_display_value(once.clone(), RangeMode::Yearly, &d);
        assert_ne!(once, twice);
    }

    #[test]
    fn grouped_output_is_rescanned_token_by_token() {
        // "15,120" splits into two tokens once it is formatted.
        let d = date(2024, 4, 1);
        let scaled = scale_display_value("15,120 min", RangeMode::Monthly, &d);
        assert_eq!(scaled, DisplayValue::from("450,3,600 min"));
    }

    #[test]
    fn locale_controls_grouping() {
        let d = date(2024, 1, 1);
        let de = DisplayScaler::new(NumberLocale::DeDe);
        assert_eq!(de.scale("42 min", RangeMode::Yearly, &d), DisplayValue::from("15.120 min"));
        let plain = DisplayScaler::new(NumberLocale::Plain);
        assert_eq!(plain.scale("42 min", RangeMode::Yearly, &d), DisplayValue::from("15120 min"));
    }

    #[test]
    fn format_number_groups_and_trims() {
        assert_eq!(format_number(0.0, NumberLocale::EnUs), "0");
        assert_eq!(format_number(999.0, NumberLocale::EnUs), "999");
        assert_eq!(format_number(1_234_567.0, NumberLocale::EnUs), "1,234,567");
        assert_eq!(format_number(-1_234.5, NumberLocale::EnUs), "-1,234.5");
        assert_eq!(format_number(1_234.5678, NumberLocale::DeDe), "1.234,568");
        assert_eq!(format_number(12_345.0, NumberLocale::FrFr), "12\u{202f}345");
        assert_eq!(format_number(-0.0, NumberLocale::EnUs), "0");
        assert_eq!(format_number(f64::INFINITY, NumberLocale::EnUs), "∞");
    }

    #[test]
    fn parses_locale_tags() {
        assert_eq!("en_us".parse::<NumberLocale>(), Ok(NumberLocale::EnUs));
        assert_eq!("DE-de".parse::<NumberLocale>(), Ok(NumberLocale::DeDe));
        assert!("xx-YY".parse::<NumberLocale>().is_err());
    }

    #[test]
    fn trend_text_carries_direction() {
        assert_eq!(format_trend(TrendDirection::Up, 2.46), "+2.5%");
        assert_eq!(format_trend(TrendDirection::Down, 1.0), "-1.0%");
    }
}
