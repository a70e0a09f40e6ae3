use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::path::Path;
use yardrange::kpi::KpiCard;

#[derive(Debug, Serialize)]
struct MetricRecord<'a> {
    card: &'a str,
    label: &'a str,
    value: &'a str,
}

pub fn write_output_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output file");

    Ok(())
}

pub fn save_metrics_csv(path: &Path, cards: &[KpiCard]) -> Result<()> {
    let serialized = serialize_metrics(cards)?;
    write_output_file(path, &serialized)
}

fn serialize_metrics(cards: &[KpiCard]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for card in cards {
        if let Some(primary) = card.primary.as_deref() {
            writer
                .serialize(MetricRecord {
                    card: card.title,
                    label: "Primary",
                    value: primary,
                })
                .context("failed to serialize metric record")?;
        }
        for metric in &card.metrics {
            writer
                .serialize(MetricRecord {
                    card: card.title,
                    label: &metric.label,
                    value: &metric.value,
                })
                .context("failed to serialize metric record")?;
        }
    }
    finalize_writer(writer, "metrics CSV writer")
}

fn finalize_writer(mut writer: Writer<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
    writer
        .flush()
        .with_context(|| format!("failed to flush {label}"))?;
    writer
        .into_inner()
        .with_context(|| format!("failed to finalize {label}"))
}
