use shiptrack_core::stages::identifiers::{fix_missing_ids, remove_duplicate_shipment_ids};
use shiptrack_core::{AuditRule, Disposition};
use shiptrack_parser::ShipmentRecord;

fn with_id(source_row: usize, id: Option<u64>) -> ShipmentRecord {
    ShipmentRecord {
        shipment_id: id,
        ..ShipmentRecord::new(source_row)
    }
}

#[test]
fn missing_ids_are_assigned_above_the_maximum_in_encounter_order() {
    let records = vec![
        with_id(1, Some(3)),
        with_id(2, None),
        with_id(3, Some(10)),
        with_id(4, None),
    ];

    let outcome = fix_missing_ids(records, 0);

    let ids: Vec<Option<u64>> = outcome.records.iter().map(|r| r.shipment_id).collect();
    assert_eq!(ids, vec![Some(3), Some(11), Some(10), Some(12)]);

    assert_eq!(outcome.audit.len(), 2);
    assert!(outcome
        .audit
        .iter()
        .all(|entry| entry.rule == AuditRule::ReassignedIds
            && entry.disposition == Disposition::Repaired));
    let logged: Vec<(usize, Option<u64>)> = outcome
        .audit
        .iter()
        .map(|entry| (entry.record.source_row, entry.record.shipment_id))
        .collect();
    assert_eq!(logged, vec![(2, Some(11)), (4, Some(12))]);
}

#[test]
fn id_floor_applies_when_no_ids_exist() {
    let records = vec![with_id(1, None), with_id(2, None)];

    let outcome = fix_missing_ids(records, 100);

    let ids: Vec<Option<u64>> = outcome.records.iter().map(|r| r.shipment_id).collect();
    assert_eq!(ids, vec![Some(101), Some(102)]);
}

#[test]
fn id_floor_below_maximum_has_no_effect() {
    let outcome = fix_missing_ids(vec![with_id(1, Some(50)), with_id(2, None)], 5);
    assert_eq!(outcome.records[1].shipment_id, Some(51));
}

#[test]
fn ids_at_the_top_of_the_range_fall_back_to_unused_low_ids() {
    let records = vec![
        with_id(1, Some(u64::MAX - 1)),
        with_id(2, None),
        with_id(3, Some(1)),
        with_id(4, None),
        with_id(5, None),
    ];

    let outcome = fix_missing_ids(records, 0);

    let ids: Vec<Option<u64>> = outcome.records.iter().map(|r| r.shipment_id).collect();
    assert_eq!(
        ids,
        vec![Some(u64::MAX - 1), Some(u64::MAX), Some(1), Some(2), Some(3)]
    );
    assert_eq!(outcome.audit.len(), 3);
}

#[test]
fn maximum_id_or_floor_does_not_overflow() {
    let outcome = fix_missing_ids(vec![with_id(1, Some(u64::MAX)), with_id(2, None)], 0);
    assert_eq!(outcome.records[1].shipment_id, Some(1));

    let outcome = fix_missing_ids(vec![with_id(1, None), with_id(2, None)], u64::MAX);
    let ids: Vec<Option<u64>> = outcome.records.iter().map(|r| r.shipment_id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
}

#[test]
fn complete_ids_produce_no_audit() {
    let outcome = fix_missing_ids(vec![with_id(1, Some(1)), with_id(2, Some(2))], 0);
    assert!(outcome.audit.is_empty());
    assert_eq!(outcome.records.len(), 2);
}

#[test]
fn duplicates_keep_first_occurrence_and_log_every_copy() {
    let records = vec![
        with_id(1, Some(5)),
        with_id(2, Some(1)),
        with_id(3, Some(5)),
        with_id(4, Some(5)),
        with_id(5, Some(2)),
    ];

    let outcome = remove_duplicate_shipment_ids(records);

    let survivors: Vec<usize> = outcome.records.iter().map(|r| r.source_row).collect();
    assert_eq!(survivors, vec![1, 2, 5]);

    let logged: Vec<(usize, Disposition)> = outcome
        .audit
        .iter()
        .map(|entry| (entry.record.source_row, entry.disposition))
        .collect();
    assert_eq!(
        logged,
        vec![
            (1, Disposition::Flagged),
            (3, Disposition::Removed),
            (4, Disposition::Removed),
        ]
    );
    assert!(outcome
        .audit
        .iter()
        .all(|entry| entry.rule == AuditRule::DuplicateIds));
}

#[test]
fn first_occurrence_follows_current_order_not_source_row() {
    let records = vec![with_id(9, Some(7)), with_id(2, Some(7))];

    let outcome = remove_duplicate_shipment_ids(records);

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].source_row, 9);
}

#[test]
fn records_without_ids_pass_duplicate_check() {
    let outcome = remove_duplicate_shipment_ids(vec![with_id(1, None), with_id(2, None)]);
    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.audit.is_empty());
}
