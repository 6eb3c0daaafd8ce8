use shiptrack_parser::ShipmentRecord;
use tracing::info;

use super::{flag_where, remove_where, StageOutcome};
use crate::audit::AuditRule;
use crate::config::DurationBand;

pub fn delivery_days(record: &ShipmentRecord) -> Option<i64> {
    match (record.ship_date, record.delivery_date) {
        (Some(shipped), Some(delivered)) => Some((delivered - shipped).num_days()),
        _ => None,
    }
}

pub fn calculate_delivery_days(mut records: Vec<ShipmentRecord>) -> StageOutcome {
    for record in records.iter_mut() {
        record.delivery_days = delivery_days(record);
    }

    let measured = records
        .iter()
        .filter(|record| record.delivery_days.is_some())
        .count();
    info!(measured, "calculated delivery durations");

    StageOutcome::unchanged(records)
}

fn is_outlier(record: &ShipmentRecord, band: DurationBand) -> bool {
    record
        .delivery_days
        .is_some_and(|days| !band.contains(days))
}

/// Flags durations outside the band so the audit trail exists before anything is removed.
pub fn detect_outliers(records: Vec<ShipmentRecord>, band: DurationBand) -> StageOutcome {
    let audit = flag_where(&records, AuditRule::Outliers, |record| {
        is_outlier(record, band)
    });
    StageOutcome { records, audit }
}

/// Keeps in-transit records (unknown duration) and those inside the band.
pub fn remove_outliers(records: Vec<ShipmentRecord>, band: DurationBand) -> StageOutcome {
    remove_where(records, AuditRule::RemovedOutliers, |record| {
        is_outlier(record, band)
    })
}
