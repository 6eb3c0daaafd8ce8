use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::LoaderError;
use crate::loader::{load_shipments, normalize_blank, parse_date, parse_shipment_id};
use crate::model::{Region, RegionField, ShipmentStatus};
use crate::load_shipments_from_path;

fn fixture_path(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(path)
}

fn fixture(path: &str) -> String {
    let full_path = fixture_path(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn loads_every_row_without_dropping() {
    let records = load_shipments_from_path(&fixture_path("shipments_raw.csv")).expect("load failed");

    assert_eq!(records.len(), 8);
    let rows: Vec<usize> = records.iter().map(|record| record.source_row).collect();
    assert_eq!(rows, (1..=8).collect::<Vec<_>>());
    assert!(records.iter().all(|record| record.status.is_none()));
    assert!(records.iter().all(|record| record.delivery_days.is_none()));
}

#[test]
fn parses_typed_fields_from_fixture() {
    let records = load_shipments(fixture("shipments_raw.csv").as_bytes()).expect("load failed");

    let first = &records[0];
    assert_eq!(first.shipment_id, Some(1));
    assert_eq!(first.ship_date, Some(date(2025, 11, 21)));
    assert_eq!(first.delivery_date, Some(date(2025, 11, 25)));
    assert_eq!(first.origin_region, RegionField::Known(Region::North));
    assert_eq!(first.destination_region, RegionField::Known(Region::South));
    assert!(first.holiday_period);

    let float_id = &records[1];
    assert_eq!(float_id.shipment_id, Some(2));
    assert_eq!(float_id.delivery_date, None);
    assert!(!float_id.holiday_period);

    assert_eq!(records[2].shipment_id, None);
}

#[test]
fn blank_cells_normalize_to_absent() {
    let records = load_shipments(fixture("shipments_raw.csv").as_bytes()).expect("load failed");

    let both_dates_missing = &records[4];
    assert_eq!(both_dates_missing.ship_date, None);
    assert_eq!(both_dates_missing.delivery_date, None);

    assert_eq!(records[5].origin_region, RegionField::Missing);
    assert_eq!(records[6].destination_region, RegionField::Missing);
}

#[test]
fn region_text_is_kept_verbatim_until_normalization() {
    let records = load_shipments(fixture("shipments_raw.csv").as_bytes()).expect("load failed");

    assert_eq!(
        records[3].origin_region,
        RegionField::Unrecognized(" north ".to_string())
    );
    assert_eq!(
        records[3].destination_region,
        RegionField::Unrecognized("WEST ".to_string())
    );
    assert_eq!(records[4].origin_region, RegionField::Unrecognized("Noth".to_string()));
    assert_eq!(records[7].destination_region, RegionField::Unrecognized("None".to_string()));
}

#[test]
fn malformed_values_degrade_to_absent() {
    let records = load_shipments(fixture("shipments_raw.csv").as_bytes()).expect("load failed");

    let bad_ship_date = &records[6];
    assert_eq!(bad_ship_date.ship_date, None);
    assert_eq!(bad_ship_date.delivery_date, Some(date(2025, 10, 9)));

    let mixed = &records[7];
    assert_eq!(mixed.shipment_id, None);
    assert_eq!(mixed.ship_date, Some(date(2025, 10, 8)));
    assert_eq!(mixed.delivery_date, None);
    assert!(mixed.holiday_period);
}

#[test]
fn missing_required_column_is_rejected() {
    let content = "shipment_id,ship_date,delivery_date,origin_region,holiday_period\n1,2025-01-01,,North,No\n";
    let err = load_shipments(content.as_bytes()).expect_err("expected missing column");

    assert!(matches!(
        err,
        LoaderError::MissingColumn {
            column: "destination_region"
        }
    ));
}

#[test]
fn derived_columns_from_cleaned_output_are_ignored() {
    let content = "shipment_id,ship_date,delivery_date,origin_region,destination_region,holiday_period,status,delivery_days\n\
                   9,2025-01-10,2025-01-12,North,South,No,Delivered,2\n";
    let records = load_shipments(content.as_bytes()).expect("load failed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].shipment_id, Some(9));
    assert_eq!(records[0].status, None);
    assert_eq!(records[0].delivery_days, None);
}

#[test]
fn shipment_id_parsing_rules() {
    assert_eq!(parse_shipment_id("42"), Some(42));
    assert_eq!(parse_shipment_id(" 42.0 "), Some(42));
    assert_eq!(parse_shipment_id("0"), None);
    assert_eq!(parse_shipment_id("-3"), None);
    assert_eq!(parse_shipment_id("4.5"), None);
    assert_eq!(parse_shipment_id("nan"), None);
}

#[test]
fn date_parsing_accepts_dates_and_timestamps() {
    assert_eq!(parse_date("2025-02-28"), Some(date(2025, 2, 28)));
    assert_eq!(parse_date("2025-02-28 23:59:59"), Some(date(2025, 2, 28)));
    assert_eq!(parse_date("2025-02-30"), None);
    assert_eq!(parse_date("28/02/2025"), None);
}

#[test]
fn normalize_blank_handles_whitespace() {
    assert_eq!(normalize_blank(Some("   ".to_string())), None);
    assert_eq!(normalize_blank(Some("\t".to_string())), None);
    assert_eq!(normalize_blank(Some(" x ".to_string())), Some(" x ".to_string()));
    assert_eq!(normalize_blank(None), None);
}

#[test]
fn region_field_rewrites_resolve_again() {
    let field = RegionField::Unrecognized("north".to_string());
    let rewritten = field.map_text(|text| {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    });
    assert_eq!(rewritten, RegionField::Known(Region::North));

    let blank = RegionField::Unrecognized("x".to_string()).map_text(|_| "  ".to_string());
    assert_eq!(blank, RegionField::Missing);
    assert!(RegionField::Unrecognized(" ".to_string()).is_absent());
}

#[test]
fn status_follows_delivery_date() {
    assert_eq!(
        ShipmentStatus::from_delivery_date(Some(date(2025, 1, 1))),
        ShipmentStatus::Delivered
    );
    assert_eq!(ShipmentStatus::from_delivery_date(None), ShipmentStatus::InTransit);
    assert_eq!(ShipmentStatus::InTransit.as_str(), "In Transit");
}

#[test]
fn short_row_loads_with_trailing_cells_absent() {
    let csv = "\
shipment_id,ship_date,delivery_date,origin_region,destination_region,holiday_period
1,2025-01-10,2025-01-12,North,South,No
2,2025-01-11,2025-01-13,East,West
3,2025-01-12,2025-01-14,South,North,Yes
";
    let records = load_shipments(csv.as_bytes()).expect("short row must not fail the batch");

    assert_eq!(records.len(), 3);
    let short = &records[1];
    assert_eq!(short.source_row, 2);
    assert_eq!(short.shipment_id, Some(2));
    assert_eq!(short.destination_region, RegionField::Known(Region::West));
    assert!(!short.holiday_period);
    assert!(records[2].holiday_period);
}

#[test]
fn exponent_ids_are_absent() {
    assert_eq!(parse_shipment_id("1e3"), None);
    assert_eq!(parse_shipment_id("1.5e1"), None);
    assert_eq!(parse_shipment_id(".0"), None);
    assert_eq!(parse_shipment_id("+17.0"), None);
    assert_eq!(parse_shipment_id("17.00"), Some(17));
}
