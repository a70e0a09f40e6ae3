use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate, generate_to};
use yardrange::alerts::AlertLevel;
use yardrange::datetime::parse_timestamp;
use yardrange::formatting::NumberLocale;
use yardrange::range::RangeMode;

pub const DEFAULT_STORE_PATH: &str = "data/yardrange-store.json";
pub const DEFAULT_HTML_PATH: &str = "data/output/kpi-report.html";
pub const DEFAULT_CSV_PATH: &str = "data/output/kpi-metrics.csv";

pub const AT_HELP: &str = "Reference date/time instead of the current local time (RFC 3339, \"YYYY-MM-DD HH:MM:SS\" or \"YYYY-MM-DD\").";
pub const LOCALE_HELP: &str = "Digit grouping for scaled numbers: en-US, en-GB, de-DE, fr-FR or plain.";
pub const STORE_HELP: &str = "JSON file holding alerts and the last stats update (defaults to data/yardrange-store.json).";
pub const SAVE_HTML_HELP: &str = "Save an HTML snapshot of the KPI cards (defaults to data/output/kpi-report.html when no path is provided).";
pub const SAVE_CSV_HELP: &str = "Save the card metrics as CSV (defaults to data/output/kpi-metrics.csv when no path is provided).";

#[derive(Debug, Parser)]
#[command(
    name = "yardrange",
    about = "Project daily yard KPIs onto monthly and yearly views, render range captions and manage delay alerts.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "DATETIME", value_parser = parse_reference, help = AT_HELP)]
    pub at: Option<NaiveDateTime>,
    #[arg(long, global = true, value_name = "TAG", default_value = "en-US", help = LOCALE_HELP)]
    pub locale: NumberLocale,
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_STORE_PATH, help = STORE_HELP)]
    pub store: PathBuf,
    #[arg(long, global = true, help = "Disable colored output.")]
    pub no_color: bool,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence."
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The reference time for this run: `--at` or the local clock.
    pub fn reference(&self) -> NaiveDateTime {
        self.at.unwrap_or_else(|| Local::now().naive_local())
    }

    /// `--at` interpreted in local time, or now.
    pub fn reference_utc(&self) -> DateTime<Utc> {
        self.at
            .map_or_else(Utc::now, |naive| wall_clock_to_utc(naive, &Local))
    }
}

// A wall-clock time skipped by a DST jump has no local instant; keep the digits as UTC.
fn wall_clock_to_utc<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    naive
        .and_local_timezone(tz.clone())
        .earliest()
        .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print how many days a value shown under MODE stands for.
    Factor {
        #[arg(value_parser = parse_mode)]
        mode: RangeMode,
    },
    /// Scale daily values (numbers or text such as "42 min") for MODE.
    Scale {
        #[arg(value_parser = parse_mode)]
        mode: RangeMode,
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<String>,
    },
    /// Print the date-range caption shown under KPI panels.
    Caption {
        #[arg(value_parser = parse_mode)]
        mode: RangeMode,
    },
    /// Render the KPI cards from a dashboard payload (JSON).
    Kpi {
        #[arg(value_name = "FILE", help = "KPI payload as returned by the dashboard API.")]
        input: PathBuf,
        #[arg(long, value_parser = parse_mode, default_value = "today")]
        range: RangeMode,
        #[arg(
            long,
            value_name = "FILE",
            num_args = 0..=1,
            default_missing_value = DEFAULT_HTML_PATH,
            help = SAVE_HTML_HELP
        )]
        save_html: Option<PathBuf>,
        #[arg(
            long,
            value_name = "FILE",
            num_args = 0..=1,
            default_missing_value = DEFAULT_CSV_PATH,
            help = SAVE_CSV_HELP
        )]
        save_csv: Option<PathBuf>,
    },
    /// Raise, list and acknowledge vehicle delay alerts.
    Alerts {
        #[command(subcommand)]
        action: AlertAction,
    },
    /// Show when the KPI statistics were last refreshed.
    LastUpdate,
    /// Generate shell completion scripts, optionally installing them for the current user.
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for.")]
        shell: Shell,
        #[arg(
            long,
            value_name = "DIR",
            help = "Directory to write the completion script to."
        )]
        output_dir: Option<PathBuf>,
        #[arg(
            long,
            help = "Install the completion script into the default location for the selected shell."
        )]
        install: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AlertAction {
    /// Raise an alert for a vehicle waiting too long at a stage.
    Send {
        #[arg(long)]
        vehicle: String,
        #[arg(long)]
        stage: String,
        #[arg(long, value_name = "MINUTES")]
        wait: u32,
        #[arg(long, value_name = "MINUTES")]
        standard: u32,
        #[arg(long, value_parser = parse_level, default_value = "warning")]
        level: AlertLevel,
        #[arg(long = "notify", value_name = "ADDRESS")]
        recipients: Vec<String>,
    },
    /// List alerts.
    List {
        #[arg(long, conflicts_with = "history")]
        acknowledged: bool,
        #[arg(long)]
        history: bool,
    },
    /// Acknowledge a pending alert by id.
    Ack { id: String },
}

fn parse_mode(raw: &str) -> Result<RangeMode, String> {
    raw.parse::<RangeMode>().map_err(|err| err.to_string())
}

fn parse_level(raw: &str) -> Result<AlertLevel, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "info" => Ok(AlertLevel::Info),
        "warning" | "warn" => Ok(AlertLevel::Warning),
        "critical" | "crit" => Ok(AlertLevel::Critical),
        other => Err(format!(
            "unknown alert level `{other}` (expected info, warning or critical)"
        )),
    }
}

fn parse_reference(raw: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(raw).ok_or_else(|| format!("cannot read `{raw}` as a date or date-time"))
}

pub fn generate_completions(
    shell: Shell,
    output_dir: Option<PathBuf>,
    install: bool,
) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    let target_dir = if let Some(dir) = output_dir {
        Some(dir)
    } else if install {
        Some(default_install_dir(shell)?)
    } else {
        None
    };

    if let Some(dir) = target_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create completion directory {}", dir.display()))?;
        let path = generate_to(shell, &mut command, bin_name, &dir)
            .context("failed to write completion file")?;
        println!("Installed {shell:?} completions to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate(shell, &mut command, bin_name, &mut stdout);
        stdout
            .flush()
            .context("failed to flush completion output")?;
    }

    Ok(())
}

fn default_install_dir(shell: Shell) -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        anyhow!("HOME environment variable is not set; use --output-dir to specify a path")
    })?;
    let mut path = PathBuf::from(home);

    match shell {
        Shell::Bash => path.push(".local/share/bash-completion/completions"),
        Shell::Elvish => path.push(".elvish/lib/completions"),
        Shell::Fish => path.push(".config/fish/completions"),
        Shell::PowerShell => path.push(".local/share/powershell/Scripts"),
        Shell::Zsh => path.push(".local/share/zsh/site-functions"),
        other => {
            return Err(anyhow!(
                "no default install location for {other:?}; specify --output-dir"
            ));
        }
    }
    Ok(path)
}
