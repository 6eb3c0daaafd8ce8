use chrono::{Duration, NaiveDate};
use shiptrack_core::stages::durations::{
    calculate_delivery_days, delivery_days, detect_outliers, remove_outliers,
};
use shiptrack_core::{AuditRule, Disposition, DurationBand};
use shiptrack_parser::ShipmentRecord;

fn shipped_for(source_row: usize, days: Option<i64>) -> ShipmentRecord {
    let ship = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    ShipmentRecord {
        shipment_id: Some(source_row as u64),
        ship_date: Some(ship),
        delivery_date: days.map(|days| ship + Duration::days(days)),
        ..ShipmentRecord::new(source_row)
    }
}

fn measured(rows: &[(usize, Option<i64>)]) -> Vec<ShipmentRecord> {
    calculate_delivery_days(
        rows.iter()
            .map(|(row, days)| shipped_for(*row, *days))
            .collect(),
    )
    .records
}

#[test]
fn delivery_days_is_whole_day_difference() {
    assert_eq!(delivery_days(&shipped_for(1, Some(4))), Some(4));
    assert_eq!(delivery_days(&shipped_for(1, Some(-2))), Some(-2));
    assert_eq!(delivery_days(&shipped_for(1, None)), None);

    let mut no_ship = shipped_for(1, Some(3));
    no_ship.ship_date = None;
    assert_eq!(delivery_days(&no_ship), None);
}

#[test]
fn outliers_are_flagged_before_removal() {
    let records = measured(&[(1, Some(0)), (2, Some(1)), (3, Some(10)), (4, Some(14)), (5, None)]);

    let detected = detect_outliers(records, DurationBand::default());

    assert_eq!(detected.records.len(), 5);
    let flagged: Vec<usize> = detected.audit.iter().map(|e| e.record.source_row).collect();
    assert_eq!(flagged, vec![1, 4]);
    assert!(detected
        .audit
        .iter()
        .all(|e| e.rule == AuditRule::Outliers && e.disposition == Disposition::Flagged));

    let removed = remove_outliers(detected.records, DurationBand::default());
    let survivors: Vec<usize> = removed.records.iter().map(|r| r.source_row).collect();
    assert_eq!(survivors, vec![2, 3, 5]);
    assert!(removed
        .audit
        .iter()
        .all(|e| e.rule == AuditRule::RemovedOutliers && e.disposition == Disposition::Removed));
}

#[test]
fn band_is_configurable() {
    let records = measured(&[(1, Some(9)), (2, Some(12)), (3, Some(15))]);
    let band = DurationBand {
        min_days: 1,
        max_days: 12,
    };

    let outcome = remove_outliers(records, band);

    let survivors: Vec<usize> = outcome.records.iter().map(|r| r.source_row).collect();
    assert_eq!(survivors, vec![1, 2]);
}
