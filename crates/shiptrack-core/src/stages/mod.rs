pub mod dates;
pub mod durations;
pub mod identifiers;
pub mod regions;

use once_cell::sync::Lazy;
use shiptrack_parser::ShipmentRecord;
use tracing::info;

use crate::audit::{AuditEntry, AuditRule};
use crate::config::PipelineConfig;

/// Surviving records handed to the next stage, plus what this stage reported.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub records: Vec<ShipmentRecord>,
    pub audit: Vec<AuditEntry>,
}

impl StageOutcome {
    pub fn unchanged(records: Vec<ShipmentRecord>) -> Self {
        Self {
            records,
            audit: Vec::new(),
        }
    }
}

pub trait CleaningStage: Send + Sync {
    fn code_identifier(&self) -> &'static str;
    fn apply(&self, records: Vec<ShipmentRecord>, config: &PipelineConfig) -> StageOutcome;
}

type StageFn = fn(Vec<ShipmentRecord>, &PipelineConfig) -> StageOutcome;

struct FnStage {
    code: &'static str,
    run: StageFn,
}

impl CleaningStage for FnStage {
    fn code_identifier(&self) -> &'static str {
        self.code
    }

    fn apply(&self, records: Vec<ShipmentRecord>, config: &PipelineConfig) -> StageOutcome {
        (self.run)(records, config)
    }
}

fn stage(code: &'static str, run: StageFn) -> Box<dyn CleaningStage> {
    Box::new(FnStage { code, run })
}

static STAGES: Lazy<Vec<Box<dyn CleaningStage>>> = Lazy::new(|| {
    vec![
        stage("fix_missing_ids", |records, config| {
            identifiers::fix_missing_ids(records, config.id_floor)
        }),
        stage("remove_duplicate_shipment_ids", |records, _| {
            identifiers::remove_duplicate_shipment_ids(records)
        }),
        stage("handle_missing_ship_dates", |records, _| {
            dates::handle_missing_ship_dates(records)
        }),
        stage("handle_invalid_delivery_date", |records, _| {
            dates::handle_invalid_delivery_date(records)
        }),
        stage("handle_missing_delivery_date", |records, _| {
            dates::handle_missing_delivery_date(records)
        }),
        stage("handle_both_missing_dates", |records, _| {
            dates::handle_both_missing_dates(records)
        }),
        stage("normalize_region_format", |records, _| {
            regions::normalize_region_format(records)
        }),
        stage("log_missing_regions", |records, _| {
            regions::log_missing_regions(records)
        }),
        stage("validate_and_correct_regions", |records, _| {
            regions::validate_and_correct_regions(records)
        }),
        stage("drop_shipments_missing_both_regions", |records, _| {
            regions::drop_shipments_missing_both_regions(records)
        }),
        stage("drop_shipments_with_missing_region", |records, _| {
            regions::drop_shipments_with_missing_region(records)
        }),
        stage("remove_invalid_region_strings", |records, _| {
            regions::remove_invalid_region_strings(records)
        }),
        stage("drop_unrecognized_regions", |records, _| {
            regions::drop_unrecognized_regions(records)
        }),
        stage("calculate_delivery_days", |records, _| {
            durations::calculate_delivery_days(records)
        }),
        stage("detect_outliers", |records, config| {
            durations::detect_outliers(records, config.duration_band)
        }),
        stage("remove_outliers", |records, config| {
            durations::remove_outliers(records, config.duration_band)
        }),
    ]
});

/// Every cleaning stage, in the order the pipeline runs them.
pub fn all_stages() -> &'static [Box<dyn CleaningStage>] {
    STAGES.as_slice()
}

pub fn find_stage(code: &str) -> Option<&'static dyn CleaningStage> {
    all_stages()
        .iter()
        .find(|stage| stage.code_identifier() == code)
        .map(|stage| stage.as_ref())
}

/// Drops every record matching `reject`, logging each one under `rule`. Relative order of
/// the survivors is preserved.
pub(crate) fn remove_where(
    records: Vec<ShipmentRecord>,
    rule: AuditRule,
    reject: impl Fn(&ShipmentRecord) -> bool,
) -> StageOutcome {
    let mut kept = Vec::with_capacity(records.len());
    let mut audit = Vec::new();

    for record in records {
        if reject(&record) {
            audit.push(AuditEntry::removed(rule, record));
        } else {
            kept.push(record);
        }
    }

    if audit.is_empty() {
        info!(rule = rule.code(), "no shipments matched");
    } else {
        info!(rule = rule.code(), removed = audit.len(), "removed shipments");
    }

    StageOutcome {
        records: kept,
        audit,
    }
}

/// Logs copies of every record matching `flag` without touching the collection.
pub(crate) fn flag_where(
    records: &[ShipmentRecord],
    rule: AuditRule,
    flag: impl Fn(&ShipmentRecord) -> bool,
) -> Vec<AuditEntry> {
    let audit: Vec<AuditEntry> = records
        .iter()
        .filter(|record| flag(record))
        .map(|record| AuditEntry::flagged(rule, record.clone()))
        .collect();

    if audit.is_empty() {
        info!(rule = rule.code(), "no shipments matched");
    } else {
        info!(rule = rule.code(), flagged = audit.len(), "flagged shipments");
    }

    audit
}
