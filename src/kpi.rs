//! KPI payloads and the cards the dashboard builds from them.
//!
//! Every card value goes through [`DisplayScaler`], so switching the range toggle
//! re-projects the daily numbers without touching the payload.

use crate::formatting::{DisplayScaler, DisplayValue, TrendDirection, format_trend};
use crate::range::{RangeMode, days_in_month, range_factor};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
}

impl Trend {
    pub fn text(&self) -> String {
        format_trend(self.direction, self.percentage)
    }
}

impl Default for Trend {
    fn default() -> Self {
        Self {
            direction: TrendDirection::Up,
            percentage: 0.0,
        }
    }
}

/// Colour band a card is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Green,
    Yellow,
    Red,
    #[default]
    Blue,
}

impl Tone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapacityData {
    pub utilization: f64,
    pub plant_capacity: f64,
    pub trucks_inside: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SparkPoint {
    pub v: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnaroundData {
    pub avg_day: f64,
    pub avg_cum: f64,
    pub last_year: f64,
    pub trend: Trend,
    pub performance_color: Tone,
    pub sparkline: Vec<SparkPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehiclesData {
    pub in_day: f64,
    pub out_day: f64,
    pub in_cum: f64,
    pub out_cum: f64,
    pub trend: Trend,
    pub target: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchData {
    pub today: f64,
    pub cum_month: f64,
    pub target_day: f64,
    pub trend: Trend,
}

/// The `/kpi` payload: one section per dashboard card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiData {
    pub capacity: CapacityData,
    pub turnaround: TurnaroundData,
    pub vehicles: VehiclesData,
    pub dispatch: DispatchData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    fn new(label: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub title: &'static str,
    pub primary: Option<String>,
    pub metrics: Vec<Metric>,
    pub tone: Tone,
    pub trend: Trend,
}

/// Builds the four dashboard cards for one range selection.
#[derive(Debug, Clone, Copy)]
pub struct CardBuilder {
    scaler: DisplayScaler,
    mode: RangeMode,
    reference: NaiveDateTime,
}

impl CardBuilder {
    pub const fn new(scaler: DisplayScaler, mode: RangeMode, reference: NaiveDateTime) -> Self {
        Self {
            scaler,
            mode,
            reference,
        }
    }

    pub fn cards(&self, data: &KpiData) -> Vec<KpiCard> {
        vec![
            self.capacity(&data.capacity),
            self.turnaround(&data.turnaround),
            self.vehicles(&data.vehicles),
            self.dispatch(&data.dispatch),
        ]
    }

    fn scaled(&self, value: impl Into<DisplayValue>) -> DisplayValue {
        self.scaler.scale(value, self.mode, &self.reference)
    }

    pub fn capacity(&self, data: &CapacityData) -> KpiCard {
        let (tone, status) = utilization_status(data.utilization);
        KpiCard {
            title: "Capacity Utilization",
            primary: None,
            metrics: vec![
                Metric::new("Utilization", format!("{}% ({status})", data.utilization)),
                Metric::new("Plant Capacity", self.scaled(data.plant_capacity)),
                Metric::new("Trucks Inside Plant", self.scaled(data.trucks_inside)),
                Metric::new("Trend", data.trend.text()),
            ],
            tone,
            trend: data.trend,
        }
    }

    pub fn turnaround(&self, data: &TurnaroundData) -> KpiCard {
        KpiCard {
            title: "Turnaround Time",
            primary: None,
            metrics: vec![
                Metric::new("Avg TTR (Day)", self.scaled(format!("{} min", data.avg_day))),
                Metric::new("Avg TTR (Cum)", self.scaled(format!("{} min", data.avg_cum))),
                Metric::new("Last Year", self.scaled(format!("{} min", data.last_year))),
            ],
            tone: data.performance_color,
            trend: data.trend,
        }
    }

    pub fn vehicles(&self, data: &VehiclesData) -> KpiCard {
        KpiCard {
            title: "Vehicle Summary",
            primary: None,
            metrics: vec![
                Metric::new("Vehicles IN (Day)", self.scaled(data.in_day)),
                Metric::new("Vehicles OUT (Day)", self.scaled(data.out_day)),
                Metric::new("Vehicles IN (Cum)", self.scaled(data.in_cum)),
                Metric::new("Vehicles OUT (Cum)", self.scaled(data.out_cum)),
            ],
            tone: if data.in_day >= data.target {
                Tone::Green
            } else {
                Tone::Yellow
            },
            trend: data.trend,
        }
    }

    pub fn dispatch(&self, data: &DispatchData) -> KpiCard {
        let prefix = match self.mode {
            RangeMode::Today => "Dispatched Today".to_string(),
            RangeMode::Monthly => format!("Dispatched in {}", month_name(&self.reference)),
            RangeMode::Yearly => format!("Dispatched in {}", self.reference.year()),
        };
        let cum_label = match self.mode {
            RangeMode::Yearly => "Cum for the Year",
            RangeMode::Today | RangeMode::Monthly => "Cum for the Month",
        };
        KpiCard {
            title: "Dispatch Summary",
            primary: Some(format!("{prefix} {}", self.scaled(data.today))),
            metrics: vec![
                Metric::new(cum_label, self.scaled(data.cum_month)),
                Metric::new("Target Day", self.scaled(data.target_day)),
            ],
            tone: dispatch_tone(data),
            trend: data.trend,
        }
    }
}

/// Status band for a utilisation percentage.
pub fn utilization_status(utilization: f64) -> (Tone, &'static str) {
    if utilization >= 80.0 {
        (Tone::Green, "Optimal")
    } else if utilization >= 60.0 {
        (Tone::Yellow, "Moderate")
    } else {
        (Tone::Red, "Low")
    }
}

/// Percentage of the daily dispatch target reached, rounded. A zero target reads as 0%.
pub fn dispatch_progress(data: &DispatchData) -> f64 {
    if data.target_day <= 0.0 {
        return 0.0;
    }
    (data.today / data.target_day * 100.0).round()
}

fn dispatch_tone(data: &DispatchData) -> Tone {
    let pct = dispatch_progress(data);
    if pct >= 100.0 {
        Tone::Green
    } else if pct >= 70.0 {
        Tone::Yellow
    } else {
        Tone::Red
    }
}

/// Number of x-axis points on a sparkline: hours, days of the month or months.
pub fn chart_points(mode: RangeMode, reference: &impl Datelike) -> u32 {
    match mode {
        RangeMode::Today => 24,
        RangeMode::Monthly => days_in_month(reference.year(), reference.month()),
        RangeMode::Yearly => 12,
    }
}

/// The dispatch target line for the selected period.
pub fn dispatch_target(data: &DispatchData, mode: RangeMode, reference: &impl Datelike) -> f64 {
    data.target_day * f64::from(range_factor(mode, reference))
}

fn month_name(reference: &impl Datelike) -> &'static str {
    MONTH_NAMES[reference.month0() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAYLOAD: &str = r#"{
        "capacity": {"utilization": 72, "plantCapacity": 120, "trucksInside": 34,
                     "trend": {"direction": "up", "percentage": 2.4}},
        "turnaround": {"avgDay": 42, "avgCum": 45, "lastYear": 51,
                       "trend": {"direction": "down", "percentage": 1.5},
                       "performanceColor": "green", "sparkline": [{"v": 40}, {"v": 44}]},
        "vehicles": {"inDay": 180, "outDay": 172, "inCum": 4200, "outCum": 4100,
                     "trend": {"direction": "up", "percentage": 3}, "target": 200},
        "dispatch": {"today": 150, "cumMonth": 3300, "targetDay": 160,
                     "trend": {"direction": "up", "percentage": 0.8}}
    }"#;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 10)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn data() -> KpiData {
        serde_json::from_str(PAYLOAD).unwrap()
    }

    fn metric<'a>(card: &'a KpiCard, label: &str) -> &'a str {
        &card
            .metrics
            .iter()
            .find(|m| m.label == label)
            .unwrap()
            .value
    }

    #[test]
    fn payload_parses_with_camel_case_fields() {
        let data = data();
        assert!((data.capacity.plant_capacity - 120.0).abs() < f64::EPSILON);
        assert_eq!(data.turnaround.performance_color, Tone::Green);
        assert_eq!(data.turnaround.sparkline.len(), 2);
        assert_eq!(data.vehicles.trend.direction, TrendDirection::Up);
    }

    #[test]
    fn missing_sections_default_to_zero() {
        let data: KpiData = serde_json::from_str(r#"{"dispatch": {"today": 5}}"#).unwrap();
        assert!((data.dispatch.today - 5.0).abs() < f64::EPSILON);
        assert!(data.capacity.plant_capacity.abs() < f64::EPSILON);
        assert_eq!(data.turnaround.performance_color, Tone::Blue);
    }

    #[test]
    fn today_cards_show_raw_values() {
        let builder = CardBuilder::new(DisplayScaler::default(), RangeMode::Today, reference());
        let cards = builder.cards(&data());
        assert_eq!(cards.len(), 4);

        assert_eq!(metric(&cards[0], "Utilization"), "72% (Moderate)");
        assert_eq!(metric(&cards[0], "Plant Capacity"), "120");
        assert_eq!(metric(&cards[0], "Trend"), "+2.4%");
        assert_eq!(cards[0].tone, Tone::Yellow);

        assert_eq!(metric(&cards[1], "Avg TTR (Day)"), "42 min");
        assert_eq!(cards[1].tone, Tone::Green);

        assert_eq!(cards[2].tone, Tone::Yellow);
        assert_eq!(cards[3].primary.as_deref(), Some("Dispatched Today 150"));
        assert_eq!(metric(&cards[3], "Cum for the Month"), "3300");
    }

    #[test]
    fn monthly_cards_scale_by_days_in_month() {
        let builder = CardBuilder::new(DisplayScaler::default(), RangeMode::Monthly, reference());
        let cards = builder.cards(&data());

        assert_eq!(metric(&cards[0], "Plant Capacity"), "3600");
        assert_eq!(metric(&cards[0], "Utilization"), "72% (Moderate)");
        assert_eq!(metric(&cards[1], "Avg TTR (Day)"), "1,260 min");
        assert_eq!(metric(&cards[2], "Vehicles IN (Cum)"), "126000");
        assert_eq!(cards[3].primary.as_deref(), Some("Dispatched in April 4500"));
    }

    #[test]
    fn yearly_dispatch_labels_switch_to_year() {
        let builder = CardBuilder::new(DisplayScaler::default(), RangeMode::Yearly, reference());
        let card = builder.dispatch(&data().dispatch);
        assert_eq!(card.primary.as_deref(), Some("Dispatched in 2024 54000"));
        assert_eq!(metric(&card, "Cum for the Year"), "1188000");
        assert_eq!(metric(&card, "Target Day"), "57600");
    }

    #[test]
    fn utilization_bands() {
        assert_eq!(utilization_status(80.0), (Tone::Green, "Optimal"));
        assert_eq!(utilization_status(60.0), (Tone::Yellow, "Moderate"));
        assert_eq!(utilization_status(59.9), (Tone::Red, "Low"));
    }

    #[test]
    fn dispatch_tone_tracks_target() {
        let mut dispatch = DispatchData {
            today: 160.0,
            target_day: 160.0,
            ..DispatchData::default()
        };
        assert_eq!(dispatch_tone(&dispatch), Tone::Green);
        dispatch.today = 112.0;
        assert_eq!(dispatch_tone(&dispatch), Tone::Yellow);
        dispatch.today = 20.0;
        assert_eq!(dispatch_tone(&dispatch), Tone::Red);
        dispatch.target_day = 0.0;
        assert!(dispatch_progress(&dispatch).abs() < f64::EPSILON);
    }

    #[test]
    fn chart_axis_follows_range() {
        let leap = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        assert_eq!(chart_points(RangeMode::Today, &leap), 24);
        assert_eq!(chart_points(RangeMode::Monthly, &leap), 29);
        assert_eq!(chart_points(RangeMode::Yearly, &leap), 12);

        let dispatch = data().dispatch;
        assert!((dispatch_target(&dispatch, RangeMode::Monthly, &leap) - 4640.0).abs() < 1e-9);
        assert!((dispatch_target(&dispatch, RangeMode::Yearly, &leap) - 57_600.0).abs() < 1e-9);
    }
}
