use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use serde::Serialize;
use shiptrack_parser::schema::CLEANED_COLUMNS;
use shiptrack_parser::ShipmentRecord;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditRule, AuditTrail};
use crate::config::{OutputFormat, PipelineConfig};
use crate::error::Result;
use crate::stages::all_stages;
use crate::summary::{records_to_dataframe, PipelineSummary};

pub const MANIFEST_FILE_NAME: &str = "run_manifest.json";

const AUDIT_PREFIX_COLUMNS: [&str; 4] = ["source_row", "rule", "defect", "disposition"];

fn date_cell(date: Option<chrono::NaiveDate>) -> String {
    date.map(|date| date.format(shiptrack_parser::schema::DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Cleaned-output cells for one record. Absent values are empty cells, integers carry no
/// fractional part.
pub(crate) fn record_fields(record: &ShipmentRecord) -> [String; 8] {
    [
        record
            .shipment_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        date_cell(record.ship_date),
        date_cell(record.delivery_date),
        record.origin_region.text().unwrap_or_default().to_string(),
        record
            .destination_region
            .text()
            .unwrap_or_default()
            .to_string(),
        record.holiday_label().to_string(),
        record
            .status
            .map(|status| status.as_str().to_string())
            .unwrap_or_default(),
        record
            .delivery_days
            .map(|days| days.to_string())
            .unwrap_or_default(),
    ]
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_csv(records: &[ShipmentRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CLEANED_COLUMNS)?;
    for record in records {
        writer.write_record(record_fields(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(records: &[ShipmentRecord], path: &Path) -> Result<()> {
    let mut df = records_to_dataframe(records)?;
    let file = File::create(path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut df)?;
    Ok(())
}

/// Writes the cleaned dataset, replacing whatever was at `path`.
pub fn persist_records(records: &[ShipmentRecord], path: &Path, format: OutputFormat) -> Result<()> {
    ensure_parent(path)?;
    match format {
        OutputFormat::Csv => write_csv(records, path)?,
        OutputFormat::Parquet => write_parquet(records, path)?,
    }
    info!(
        path = %path.display(),
        rows = records.len(),
        format = ?format,
        "persisted cleaned shipments"
    );
    Ok(())
}

/// One CSV per rule that reported anything, named after the rule. Rules with no entries
/// leave no file behind.
pub fn write_audit_logs(audit: &AuditTrail, directory: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)?;

    let mut written = Vec::new();
    for rule in AuditRule::ALL {
        let path = directory.join(rule.file_name());
        let mut entries = audit.for_rule(rule).peekable();
        if entries.peek().is_none() {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            continue;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(AUDIT_PREFIX_COLUMNS.iter().chain(CLEANED_COLUMNS.iter()))?;
        let mut rows = 0usize;
        for entry in entries {
            let prefix = [
                entry.record.source_row.to_string(),
                rule.code().to_string(),
                entry.kind().as_str().to_string(),
                entry.disposition.as_str().to_string(),
            ];
            writer.write_record(prefix.iter().chain(record_fields(&entry.record).iter()))?;
            rows += 1;
        }
        writer.flush()?;

        info!(rule = rule.code(), rows, path = %path.display(), "wrote audit log");
        written.push(path);
    }

    Ok(written)
}

pub fn compute_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Reproducibility record for one run: what went in, how it was configured, what came out.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub input_path: PathBuf,
    pub input_blake3: String,
    pub config: PipelineConfig,
    pub summary: PipelineSummary,
    pub stages: Vec<&'static str>,
}

impl RunManifest {
    pub fn new(
        run_id: Uuid,
        config: &PipelineConfig,
        input_blake3: String,
        summary: &PipelineSummary,
    ) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            input_path: config.input_path.clone(),
            input_blake3,
            config: config.clone(),
            summary: summary.clone(),
            stages: all_stages()
                .iter()
                .map(|stage| stage.code_identifier())
                .collect(),
        }
    }
}

pub fn write_run_manifest(manifest: &RunManifest, directory: &Path) -> Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let path = directory.join(MANIFEST_FILE_NAME);
    let bytes = serde_json::to_vec_pretty(manifest)?;
    fs::write(&path, bytes)?;
    Ok(path)
}
