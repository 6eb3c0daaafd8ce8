#![cfg(feature = "runtime")]

use std::fs;

use chrono::{Duration, NaiveDate};
use shiptrack_core::outputs::persist_records;
use shiptrack_core::reports::{collect_reports, export_reports, write_reports};
use shiptrack_core::warehouse::{connect, load_cleaned, load_cleaned_csv, DbPool};
use shiptrack_core::{OutputFormat, ReportConfig, Result};
use shiptrack_parser::{Region, RegionField, ShipmentRecord, ShipmentStatus};

fn shipment(
    id: u64,
    origin: Region,
    destination: Region,
    days: Option<i64>,
    holiday: bool,
) -> ShipmentRecord {
    let ship = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap() + Duration::days(id as i64);
    let delivery = days.map(|days| ship + Duration::days(days));
    ShipmentRecord {
        shipment_id: Some(id),
        ship_date: Some(ship),
        delivery_date: delivery,
        origin_region: RegionField::Known(origin),
        destination_region: RegionField::Known(destination),
        holiday_period: holiday,
        status: Some(ShipmentStatus::from_delivery_date(delivery)),
        delivery_days: days,
        ..ShipmentRecord::new(id as usize)
    }
}

fn cleaned_batch() -> Vec<ShipmentRecord> {
    vec![
        shipment(1, Region::North, Region::South, Some(2), false),
        shipment(2, Region::North, Region::South, Some(6), false),
        shipment(3, Region::East, Region::West, Some(3), true),
        shipment(4, Region::East, Region::West, None, true),
        shipment(5, Region::West, Region::South, Some(9), true),
    ]
}

async fn loaded_pool(dir: &std::path::Path) -> Result<DbPool> {
    let url = format!("sqlite://{}", dir.join("db/shipments.db").display());
    let pool = connect(&url).await?;
    load_cleaned(&pool, &cleaned_batch()).await?;
    Ok(pool)
}

#[tokio::test]
async fn load_replaces_table_contents() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = loaded_pool(dir.path()).await?;

    let inserted = load_cleaned(&pool, &cleaned_batch()[..2]).await?;
    assert_eq!(inserted, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shipments_cleaned")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 2);

    let (ship_date, holiday): (String, String) = sqlx::query_as(
        "SELECT ship_date, holiday_period FROM shipments_cleaned WHERE shipment_id = 1",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(ship_date, "2025-01-07");
    assert_eq!(holiday, "No");
    Ok(())
}

#[tokio::test]
async fn in_memory_database_is_supported() -> Result<()> {
    let pool = connect("sqlite::memory:").await?;
    let inserted = load_cleaned(&pool, &cleaned_batch()).await?;
    assert_eq!(inserted, 5);
    Ok(())
}

#[tokio::test]
async fn cleaned_csv_loads_with_derived_columns() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("cleaned.csv");
    persist_records(&cleaned_batch(), &csv_path, OutputFormat::Csv)?;

    let pool = connect("sqlite::memory:").await?;
    let inserted = load_cleaned_csv(&pool, &csv_path).await?;
    assert_eq!(inserted, 5);

    let in_transit: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM shipments_cleaned WHERE status = 'In Transit' AND delivery_days IS NULL",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(in_transit, 1);
    Ok(())
}

#[tokio::test]
async fn reports_aggregate_the_cleaned_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = loaded_pool(dir.path()).await?;

    let reports = collect_reports(&pool, &ReportConfig::default()).await?;

    let overview = &reports.overview;
    assert_eq!(overview.totals.total_shipments, 5);
    assert_eq!(overview.totals.in_transit_count, 1);
    assert_eq!(overview.totals.avg_delivery_days, Some(5.0));
    assert_eq!(overview.totals.avg_late_delivery_days, Some(7.5));
    assert_eq!(overview.by_status[0].status, "Delivered");
    assert_eq!(overview.by_status[0].shipment_count, 4);
    assert_eq!(overview.delivery_day_distribution.len(), 4);

    let regional = &reports.regional;
    assert_eq!(regional.volume_by_origin[0].origin_region, "East");
    assert_eq!(regional.volume_by_origin[0].total_shipments, 2);
    let north_south = regional
        .route_stats
        .iter()
        .find(|route| route.origin_region == "North" && route.destination_region == "South")
        .expect("north-south route");
    assert_eq!(north_south.shipment_volume, 2);
    assert_eq!(north_south.avg_delivery_days, Some(4.0));
    assert_eq!(north_south.min_delivery_days, Some(2));
    assert_eq!(north_south.max_delivery_days, Some(6));
    assert_eq!(regional.slowest_routes[0].origin_region, "West");
    assert_eq!(regional.fastest_routes[0].origin_region, "East");

    let west = regional
        .success_rate_by_destination
        .iter()
        .find(|row| row.destination_region == "West")
        .expect("west destination");
    assert_eq!(west.rate, Some(50.0));

    let holiday = &reports.holiday;
    assert_eq!(holiday.periods[0].holiday_period, "Yes");
    assert_eq!(holiday.periods[0].shipment_volume, 3);
    assert_eq!(holiday.delay_gap, Some(2.0));

    let weeks: i64 = reports.weekly_trend.iter().map(|w| w.total_shipments).sum();
    assert_eq!(weeks, 5);
    Ok(())
}

#[tokio::test]
async fn reports_export_one_csv_per_query() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = loaded_pool(dir.path()).await?;
    let export_dir = dir.path().join("exports");

    let skipped = export_reports(&pool, &ReportConfig::default()).await?;
    assert!(skipped.is_empty());

    let config = ReportConfig {
        export_directory: Some(export_dir.clone()),
        ..ReportConfig::default()
    };
    let written = export_reports(&pool, &config).await?;

    assert_eq!(written.len(), 13);
    let totals = fs::read_to_string(export_dir.join("overview_totals.csv"))?;
    assert!(totals.starts_with("total_shipments,avg_delivery_days"));

    let reports = collect_reports(&pool, &config).await?;
    let rewritten = write_reports(&reports, &export_dir)?;
    assert_eq!(rewritten, written);
    Ok(())
}
