use crate::cli::{AlertAction, Cli, Commands};
use crate::output::{save_metrics_csv, write_output_file};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use yardrange::alerts::{AlertConfig, AlertManager, StoredAlert};
use yardrange::datetime::format_date_time_display;
use yardrange::formatting::{DisplayScaler, DisplayValue};
use yardrange::kpi::{CardBuilder, KpiData};
use yardrange::report::{HtmlReportContext, render_html_report};
use yardrange::session::{LastStatsUpdate, TickerClock, TickerPhase};
use yardrange::store::{JsonFileStore, KeyValueStore};
use yardrange::summary::{SummaryContext, print_summary};
use yardrange::{format_range_text, range_factor};

mod cli;
mod output;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    colored::control::set_override(!cli.no_color);

    let reference = cli.reference();
    tracing::debug!(%reference, locale = %cli.locale, "starting");

    match &cli.command {
        Commands::Factor { mode } => {
            println!("{}", range_factor(*mode, &reference));
        }
        Commands::Scale { mode, values } => {
            let scaler = DisplayScaler::new(cli.locale);
            for raw in values {
                println!("{}", scaler.scale(parse_display_value(raw), *mode, &reference));
            }
        }
        Commands::Caption { mode } => {
            println!("{}", format_range_text(*mode, &reference));
        }
        Commands::Kpi {
            input,
            range,
            save_html,
            save_csv,
        } => {
            let data = load_kpi_data(input)?;
            let cards = CardBuilder::new(DisplayScaler::new(cli.locale), *range, reference)
                .cards(&data);
            let caption = format_range_text(*range, &reference);

            let mut store = open_store(&cli.store)?;
            let now = cli.reference_utc();
            let previous = LastStatsUpdate::new(&mut store)
                .get()
                .context("failed to read last stats update")?;

            if let Some(path) = save_csv.as_deref() {
                save_metrics_csv(path, &cards)?;
            }
            if let Some(path) = save_html.as_deref() {
                let alerts = AlertManager::new(&mut store)
                    .list_pending()
                    .context("failed to read pending alerts")?;
                let ticker = report_ticker(&mut store, now)?;
                let html = render_html_report(&HtmlReportContext {
                    mode: *range,
                    caption: &caption,
                    generated_at: &reference,
                    cards: &cards,
                    alerts: &alerts,
                    ticker: Some(ticker),
                });
                write_output_file(path, html.as_bytes())?;
            }

            let last_update = previous.map(|at| display_stamp(&at));
            print_summary(&SummaryContext {
                mode: *range,
                caption: &caption,
                cards: &cards,
                last_update: last_update.as_deref(),
            });

            LastStatsUpdate::new(&mut store)
                .touch(now)
                .context("failed to record stats update")?;
        }
        Commands::Alerts { action } => {
            let store = open_store(&cli.store)?;
            run_alert_action(AlertManager::new(store), action, cli.reference_utc())?;
        }
        Commands::LastUpdate => {
            let mut store = open_store(&cli.store)?;
            let last = LastStatsUpdate::new(&mut store)
                .get()
                .context("failed to read last stats update")?;
            match last {
                Some(at) => println!("{}", display_stamp(&at)),
                None => println!("{}", "No stats update recorded.".bright_black()),
            }
        }
        Commands::Completions {
            shell,
            output_dir,
            install,
        } => cli::generate_completions(*shell, output_dir.clone(), *install)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(path: &Path) -> Result<JsonFileStore> {
    JsonFileStore::open(path).with_context(|| format!("failed to open store {}", path.display()))
}

fn load_kpi_data(path: &Path) -> Result<KpiData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read KPI payload {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse KPI payload {}", path.display()))
}

// The ticker start lives in the store so later reports resume mid-cycle.
fn report_ticker<S: KeyValueStore>(store: &mut S, now: DateTime<Utc>) -> Result<TickerPhase> {
    TickerClock::new(store)
        .phase(now)
        .context("failed to compute ticker phase")
}

// Bare numbers stay numeric so they are scaled without rounding or grouping.
fn parse_display_value(raw: &str) -> DisplayValue {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map_or_else(|| DisplayValue::from(raw), DisplayValue::Number)
}

fn display_stamp(at: &DateTime<Utc>) -> String {
    let local: NaiveDateTime = at.with_timezone(&chrono::Local).naive_local();
    format_date_time_display(&yardrange::datetime::to_storage_timestamp(&local))
}

fn run_alert_action(
    mut manager: AlertManager<JsonFileStore>,
    action: &AlertAction,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        AlertAction::Send {
            vehicle,
            stage,
            wait,
            standard,
            level,
            recipients,
        } => {
            let exceedance_ratio = if *standard == 0 {
                0.0
            } else {
                f64::from(*wait) / f64::from(*standard)
            };
            let stored = manager
                .send_alert(
                    AlertConfig {
                        vehicle_reg_no: vehicle.clone(),
                        stage: stage.clone(),
                        wait_time: *wait,
                        standard_time: *standard,
                        exceedance_ratio,
                        alert_level: *level,
                        timestamp: now,
                        recipients: recipients.clone(),
                    },
                    now,
                )
                .context("failed to store alert")?;
            println!("{} {}", stored.id.bright_yellow().bold(), stored.message);
        }
        AlertAction::List {
            acknowledged,
            history,
        } => {
            let (title, alerts) = if *acknowledged {
                ("Acknowledged", manager.list_acknowledged())
            } else if *history {
                ("History", manager.list_history())
            } else {
                ("Pending", manager.list_pending())
            };
            let alerts = alerts.context("failed to read alerts")?;
            print_alerts(title, &alerts);
        }
        AlertAction::Ack { id } => {
            if manager.acknowledge(id).context("failed to acknowledge alert")? {
                println!("{} {}", "Acknowledged".bright_green().bold(), id);
            } else {
                anyhow::bail!("no pending alert with id {id}");
            }
        }
    }
    Ok(())
}

fn print_alerts(title: &str, alerts: &[StoredAlert]) {
    println!("{}", format!("{title} alerts").bold().bright_magenta());
    if alerts.is_empty() {
        println!("{}", "None.".bright_black());
        return;
    }
    for alert in alerts {
        let ratio = format!("x{:.2}", alert.config.exceedance_ratio);
        println!(
            "{} {:<8} {} {}",
            alert.id.bright_white(),
            alert.config.alert_level.to_string().bright_yellow(),
            alert.message.bright_green(),
            ratio.bright_black()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use yardrange::alerts::AlertLevel;
    use yardrange::range::RangeMode;

    #[test]
    fn bare_numbers_stay_numeric() {
        assert_eq!(parse_display_value("2.5"), DisplayValue::Number(2.5));
        assert_eq!(parse_display_value(" 7 "), DisplayValue::Number(7.0));
        assert_eq!(parse_display_value("-3"), DisplayValue::Number(-3.0));
    }

    #[test]
    fn templates_and_non_finite_input_stay_text() {
        assert_eq!(parse_display_value("42 min"), DisplayValue::from("42 min"));
        assert_eq!(parse_display_value("inf"), DisplayValue::from("inf"));
        assert_eq!(parse_display_value("NaN"), DisplayValue::from("NaN"));
    }

    #[test]
    fn numeric_input_is_scaled_without_grouping() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let scaled =
            DisplayScaler::default().scale(parse_display_value("1000.5"), RangeMode::Monthly, &feb);
        assert_eq!(scaled.to_string(), "29014.5");
    }

    #[test]
    fn report_ticker_resumes_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        let mut store = open_store(&path).unwrap();
        assert_eq!(report_ticker(&mut store, first).unwrap().elapsed_ms, 0);
        AlertManager::new(&mut store)
            .send_alert(
                AlertConfig {
                    vehicle_reg_no: "KA01AB1234".to_string(),
                    stage: "Weighbridge".to_string(),
                    wait_time: 45,
                    standard_time: 15,
                    exceedance_ratio: 3.0,
                    alert_level: AlertLevel::Critical,
                    timestamp: first,
                    recipients: Vec::new(),
                },
                first,
            )
            .unwrap();

        let mut reopened = open_store(&path).unwrap();
        let later = first + Duration::milliseconds(5_000);
        let phase = report_ticker(&mut reopened, later).unwrap();
        assert_eq!(phase.elapsed_ms, 5_000);
        let alerts = AlertManager::new(&mut reopened).list_pending().unwrap();

        let reference = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 5)
            .unwrap();
        let html = render_html_report(&HtmlReportContext {
            mode: RangeMode::Today,
            caption: "May 1, 2024, 8:00 AM",
            generated_at: &reference,
            cards: &[],
            alerts: &alerts,
            ticker: Some(phase),
        });
        assert!(html.contains("animation-delay: -5000ms"));
    }
}
