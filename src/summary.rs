use crate::kpi::{KpiCard, Tone};
use crate::range::RangeMode;
use colored::{ColoredString, Colorize};

pub struct SummaryContext<'a> {
    pub mode: RangeMode,
    pub caption: &'a str,
    pub cards: &'a [KpiCard],
    pub last_update: Option<&'a str>,
}

pub fn print_summary(context: &SummaryContext<'_>) {
    print!("{}", render_summary(context));
}

pub fn render_summary(context: &SummaryContext<'_>) -> String {
    let mut out = String::new();
    out.push('\n');
    push_line(&mut out, render_header(context.mode));
    push_line(&mut out, context.caption.bright_white().bold().to_string());
    if let Some(stamp) = context.last_update {
        push_line(
            &mut out,
            format!("{} {}", "Last update".bright_yellow().bold(), stamp.bright_white()),
        );
    }

    let mut width = 0;
    for card in context.cards {
        out.push('\n');
        width = width.max(render_card(&mut out, card));
    }
    if context.cards.is_empty() {
        push_line(&mut out, "No KPI data available.".bright_black().to_string());
    }
    if width > 0 {
        out.push('\n');
        push_line(&mut out, "=".repeat(width).bright_cyan().to_string());
    }
    out
}

fn render_header(mode: RangeMode) -> String {
    let toggle = RangeMode::ALL
        .iter()
        .map(|candidate| {
            if *candidate == mode {
                format!("[{}]", candidate.label()).bold().bright_white().to_string()
            } else {
                candidate.label().bright_black().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{} {}",
        "================ Yard KPIs ================".bold().bright_cyan(),
        toggle
    )
}

fn render_card(out: &mut String, card: &KpiCard) -> usize {
    let title = format!("{} ({})", card.title, card.trend.text());
    push_line(out, paint(&title, card.tone).bold().to_string());
    let mut width = title.chars().count();
    if let Some(primary) = &card.primary {
        push_line(out, format!("  {}", primary.bright_white().bold()));
        width = width.max(primary.chars().count() + 2);
    }

    let label_width = card
        .metrics
        .iter()
        .map(|metric| metric.label.chars().count())
        .max()
        .unwrap_or(0);
    for metric in &card.metrics {
        let line = format!("  {:<label_width$} | {}", metric.label, metric.value);
        width = width.max(line.chars().count());
        push_line(
            out,
            format!(
                "  {} {} {}",
                format!("{:<label_width$}", metric.label).bright_yellow(),
                "|".bright_black(),
                metric.value.bright_green()
            ),
        );
    }
    width
}

fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Green => text.bright_green(),
        Tone::Yellow => text.bright_yellow(),
        Tone::Red => text.bright_red(),
        Tone::Blue => text.bright_blue(),
    }
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}
