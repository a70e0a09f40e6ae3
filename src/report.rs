use crate::alerts::StoredAlert;
use crate::kpi::KpiCard;
use crate::range::RangeMode;
use crate::session::TickerPhase;
use chrono::NaiveDateTime;

pub struct HtmlReportContext<'a> {
    pub mode: RangeMode,
    pub caption: &'a str,
    pub generated_at: &'a NaiveDateTime,
    pub cards: &'a [KpiCard],
    pub alerts: &'a [StoredAlert],
    pub ticker: Option<TickerPhase>,
}

pub fn render_html_report(context: &HtmlReportContext<'_>) -> String {
    let generated_at = context.generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let title = format!(
        "Yard KPIs - {} - {}",
        context.mode.label(),
        context.generated_at.format("%Y-%m-%d")
    );

    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str("<style>\n");
    html.push_str(REPORT_STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");
    html.push_str("<div class=\"page\">\n");

    html.push_str(&render_ticker(context.alerts, context.ticker));

    html.push_str("<header class=\"hero\">\n");
    html.push_str(&format!(
        "<div class=\"pill\">yardrange v{}</div>\n",
        env!("CARGO_PKG_VERSION")
    ));
    html.push_str("<h1>Yard KPIs</h1>\n");
    html.push_str(&render_toggle(context.mode));
    html.push_str(&format!(
        "<p class=\"hint\">{}</p>\n",
        escape_html(context.caption)
    ));
    html.push_str(&format!(
        "<div class=\"meta\"><span class=\"label\">Generated</span><span class=\"value mono\">{}</span></div>\n",
        escape_html(&generated_at)
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"cards\">\n");
    if context.cards.is_empty() {
        html.push_str("<p class=\"muted\">No KPI data available.</p>\n");
    }
    for card in context.cards {
        html.push_str(&render_card(card));
    }
    html.push_str("</section>\n");

    html.push_str("<footer class=\"footer\">\n");
    html.push_str("<div>Monthly values use calendar days; yearly values use a 360-day year.</div>\n");
    html.push_str("</footer>\n");
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_toggle(mode: RangeMode) -> String {
    let mut toggle = String::from("<div class=\"toggle\">");
    for candidate in RangeMode::ALL {
        let class = if candidate == mode { "btn active" } else { "btn" };
        toggle.push_str(&format!(
            "<span class=\"{class}\">{}</span>",
            candidate.label()
        ));
    }
    toggle.push_str("</div>\n");
    toggle
}

fn render_card(card: &KpiCard) -> String {
    let trend_class = if card.trend.text().starts_with('-') {
        "down"
    } else {
        "up"
    };
    let mut section = String::new();
    section.push_str(&format!("<div class=\"card tone-{}\">\n", card.tone));
    section.push_str(&format!(
        "<div class=\"card-head\"><span class=\"card-label\">{}</span><span class=\"trend {trend_class}\">{}</span></div>\n",
        escape_html(card.title),
        escape_html(&card.trend.text())
    ));
    if let Some(primary) = &card.primary {
        section.push_str(&format!(
            "<div class=\"card-value\">{}</div>\n",
            escape_html(primary)
        ));
    }
    section.push_str("<dl>\n");
    for metric in &card.metrics {
        section.push_str(&format!(
            "<div class=\"row\"><dt>{}</dt><dd class=\"num\">{}</dd></div>\n",
            escape_html(&metric.label),
            escape_html(&metric.value)
        ));
    }
    section.push_str("</dl>\n</div>\n");
    section
}

fn render_ticker(alerts: &[StoredAlert], phase: Option<TickerPhase>) -> String {
    let Some(first) = alerts.first() else {
        return String::new();
    };
    let text = alerts
        .iter()
        .map(|alert| escape_html(&alert.message))
        .collect::<Vec<_>>()
        .join(" &nbsp; • &nbsp; ");
    let style = phase.map_or_else(String::new, |phase| {
        format!(
            " style=\"animation-duration: {}ms; animation-delay: {}\"",
            phase.cycle_ms,
            phase.animation_delay()
        )
    });
    format!(
        "<div class=\"ticker level-{}\" role=\"status\" aria-live=\"polite\"><div class=\"ticker-inner\"{style}>{text} &nbsp; • &nbsp; {text}</div></div>\n",
        first.config.alert_level
    )
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const REPORT_STYLE: &str = r#"
:root {
  color-scheme: light;
  --bg: #f1f5f9;
  --ink: #0f172a;
  --muted: #64748b;
  --card: #ffffff;
  --border: #e2e8f0;
  --green: #059669;
  --yellow: #d97706;
  --red: #dc2626;
  --blue: #2563eb;
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: "Segoe UI", system-ui, sans-serif;
  color: var(--ink);
  background: var(--bg);
}

.page {
  max-width: 1200px;
  margin: 0 auto;
  padding: 32px 24px 48px;
}

.ticker {
  overflow: hidden;
  white-space: nowrap;
  border-radius: 8px;
  margin-bottom: 16px;
  padding: 8px 0;
  color: #fff;
  background: var(--yellow);
}

.ticker.level-critical {
  background: var(--red);
}

.ticker.level-info {
  background: var(--blue);
}

.ticker-inner {
  display: inline-block;
  padding-left: 100%;
  animation: ticker-scroll 22000ms linear infinite;
}

@keyframes ticker-scroll {
  from { transform: translateX(0); }
  to { transform: translateX(-100%); }
}

.hero {
  background: var(--card);
  border: 1px solid var(--border);
  border-radius: 16px;
  padding: 24px 28px;
}

.pill {
  display: inline-block;
  padding: 4px 12px;
  border-radius: 999px;
  background: #e2e8f0;
  font-size: 12px;
  font-weight: 600;
  text-transform: uppercase;
}

.toggle {
  display: flex;
  gap: 8px;
  margin-top: 8px;
}

.btn {
  padding: 6px 12px;
  border-radius: 6px;
  background: #f1f5f9;
  color: #334155;
  font-size: 14px;
}

.btn.active {
  background: #1e293b;
  color: #fff;
}

.hint {
  font-weight: 700;
  color: #334155;
}

.meta .label {
  color: var(--muted);
  margin-right: 8px;
}

.mono {
  font-family: ui-monospace, monospace;
}

.cards {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
  gap: 16px;
  margin-top: 24px;
}

.card {
  background: var(--card);
  border: 1px solid var(--border);
  border-top: 4px solid var(--blue);
  border-radius: 12px;
  padding: 16px;
}

.card.tone-green { border-top-color: var(--green); }
.card.tone-yellow { border-top-color: var(--yellow); }
.card.tone-red { border-top-color: var(--red); }

.card-head {
  display: flex;
  justify-content: space-between;
  font-weight: 600;
}

.card-value {
  font-size: 20px;
  font-weight: 700;
  margin-top: 8px;
}

.row {
  display: flex;
  justify-content: space-between;
  padding: 4px 0;
  border-bottom: 1px dashed var(--border);
}

dd {
  margin: 0;
}

.num {
  font-variant-numeric: tabular-nums;
}

.trend.up { color: var(--green); }
.trend.down { color: var(--red); }

.muted,
.footer {
  color: var(--muted);
  font-size: 13px;
}

.footer {
  margin-top: 24px;
}
"#;
