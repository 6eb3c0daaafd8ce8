use std::fs;
use std::path::PathBuf;

use shiptrack_parser::{load_shipments, LoaderError, ShipmentRecord};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::audit::AuditTrail;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::outputs::{self, RunManifest};
use crate::stages::{all_stages, CleaningStage};
use crate::summary::{summarize, PipelineSummary};

/// Result of threading a batch through the cleaning stages. No I/O has happened yet.
#[derive(Debug, Clone)]
pub struct CleaningRun {
    pub records: Vec<ShipmentRecord>,
    pub audit: AuditTrail,
    pub input_rows: usize,
}

/// Runs every registered stage in order. Pure: the result depends only on the records
/// and the config.
pub fn clean_shipments(records: Vec<ShipmentRecord>, config: &PipelineConfig) -> CleaningRun {
    let stages: Vec<&dyn CleaningStage> = all_stages().iter().map(|stage| stage.as_ref()).collect();
    run_stages(records, config, &stages)
}

/// Runs an explicit stage list. Each stage takes the survivors of the previous one by value.
pub fn run_stages(
    records: Vec<ShipmentRecord>,
    config: &PipelineConfig,
    stages: &[&dyn CleaningStage],
) -> CleaningRun {
    let input_rows = records.len();
    let mut audit = AuditTrail::new();
    let mut current = records;

    for stage in stages {
        let span = info_span!("stage", code = stage.code_identifier());
        let _guard = span.enter();

        let before = current.len();
        let outcome = stage.apply(current, config);
        debug!(
            before,
            after = outcome.records.len(),
            reported = outcome.audit.len(),
            "stage finished"
        );

        audit.extend(outcome.audit);
        current = outcome.records;
    }

    CleaningRun {
        records: current,
        audit,
        input_rows,
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub records: Vec<ShipmentRecord>,
    pub summary: PipelineSummary,
    pub output_path: PathBuf,
    pub audit_files: Vec<PathBuf>,
    pub manifest_path: PathBuf,
}

/// Load, clean, and persist one batch: the cleaned dataset, one audit file per rule that
/// fired, and a run manifest in the log directory.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;

    let contents = fs::read(&config.input_path).map_err(|source| LoaderError::Open {
        path: config.input_path.clone(),
        source,
    })?;
    let input_hash = outputs::compute_hash(&contents);
    let records = load_shipments(contents.as_slice())?;
    info!(
        path = %config.input_path.display(),
        rows = records.len(),
        "loaded raw shipment records"
    );

    let run = clean_shipments(records, config);

    let audit_files = outputs::write_audit_logs(&run.audit, &config.log_directory)?;
    outputs::persist_records(&run.records, &config.output_path, config.output_format)?;

    let summary = summarize(&run)?;
    let run_id = Uuid::new_v4();
    let manifest = RunManifest::new(run_id, config, input_hash, &summary);
    let manifest_path = outputs::write_run_manifest(&manifest, &config.log_directory)?;

    info!(
        %run_id,
        input_rows = summary.input_rows,
        surviving_rows = summary.surviving_rows,
        removed_rows = summary.removed_rows,
        output = %config.output_path.display(),
        "pipeline completed"
    );

    Ok(PipelineReport {
        run_id,
        records: run.records,
        summary,
        output_path: config.output_path.clone(),
        audit_files,
        manifest_path,
    })
}
