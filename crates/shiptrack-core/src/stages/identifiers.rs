use std::collections::{HashMap, HashSet};

use shiptrack_parser::ShipmentRecord;
use tracing::info;

use super::StageOutcome;
use crate::audit::{AuditEntry, AuditRule};

/// Gives every record without an id a fresh one, counting up from
/// `max(highest observed id, id_floor) + 1` in encounter order. Once that count
/// reaches `u64::MAX`, the lowest unused positive ids are handed out instead.
///
/// The audit entries carry the records after repair.
pub fn fix_missing_ids(mut records: Vec<ShipmentRecord>, id_floor: u64) -> StageOutcome {
    let max_id = records
        .iter()
        .filter_map(|record| record.shipment_id)
        .max()
        .unwrap_or(0)
        .max(id_floor);

    let mut used: HashSet<u64> = records.iter().filter_map(|record| record.shipment_id).collect();
    let mut next_id = Some(max_id);
    let mut lowest_free = 0;
    let mut audit = Vec::new();
    for record in records.iter_mut().filter(|record| record.shipment_id.is_none()) {
        next_id = next_id.and_then(|id| id.checked_add(1));
        let id = match next_id {
            Some(id) => id,
            None => {
                lowest_free += 1;
                while used.contains(&lowest_free) {
                    lowest_free += 1;
                }
                lowest_free
            }
        };
        used.insert(id);
        record.shipment_id = Some(id);
        audit.push(AuditEntry::repaired(AuditRule::ReassignedIds, record.clone()));
    }

    if audit.is_empty() {
        info!("no missing shipment ids found");
    } else {
        info!(
            reassigned = audit.len(),
            highest_existing = max_id,
            "reassigned missing shipment ids"
        );
    }

    StageOutcome { records, audit }
}

/// Keeps the first occurrence of each id, in current collection order. Every occurrence of
/// a repeated id is logged: the survivor as flagged, the rest as removed.
pub fn remove_duplicate_shipment_ids(records: Vec<ShipmentRecord>) -> StageOutcome {
    let mut occurrences: HashMap<u64, usize> = HashMap::new();
    for id in records.iter().filter_map(|record| record.shipment_id) {
        *occurrences.entry(id).or_insert(0) += 1;
    }

    let mut seen: HashSet<u64> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut audit = Vec::new();

    for record in records {
        let Some(id) = record.shipment_id else {
            kept.push(record);
            continue;
        };

        if occurrences.get(&id).copied().unwrap_or(0) < 2 {
            kept.push(record);
        } else if seen.insert(id) {
            audit.push(AuditEntry::flagged(AuditRule::DuplicateIds, record.clone()));
            kept.push(record);
        } else {
            audit.push(AuditEntry::removed(AuditRule::DuplicateIds, record));
        }
    }

    if audit.is_empty() {
        info!("no duplicate shipment ids found");
    } else {
        info!(
            duplicate_records = audit.len(),
            duplicated_ids = seen.len(),
            removed = audit.len() - seen.len(),
            "removed duplicate shipment ids"
        );
    }

    StageOutcome {
        records: kept,
        audit,
    }
}
