use shiptrack_parser::{ShipmentRecord, ShipmentStatus};
use tracing::info;

use super::{remove_where, StageOutcome};
use crate::audit::AuditRule;

pub fn handle_missing_ship_dates(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::MissingShipDate, |record| {
        record.ship_date.is_none()
    })
}

/// Drops records delivered before they shipped. A record without a delivery date always
/// passes, and so does one without a ship date: that case belongs to the ship-date rule.
pub fn handle_invalid_delivery_date(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::InvalidDeliveryDate, |record| {
        matches!(
            (record.ship_date, record.delivery_date),
            (Some(shipped), Some(delivered)) if delivered < shipped
        )
    })
}

/// Derives `status` from the presence of a delivery date. Never removes anything.
pub fn handle_missing_delivery_date(mut records: Vec<ShipmentRecord>) -> StageOutcome {
    let mut in_transit = 0usize;
    for record in records.iter_mut() {
        let status = ShipmentStatus::from_delivery_date(record.delivery_date);
        if status == ShipmentStatus::InTransit {
            in_transit += 1;
        }
        record.status = Some(status);
    }

    info!(
        delivered = records.len() - in_transit,
        in_transit, "derived shipment status"
    );

    StageOutcome::unchanged(records)
}

/// Re-checks that no record lacks both dates, even when the ship-date rule did not run first.
pub fn handle_both_missing_dates(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::MissingBothDates, |record| {
        record.ship_date.is_none() && record.delivery_date.is_none()
    })
}
