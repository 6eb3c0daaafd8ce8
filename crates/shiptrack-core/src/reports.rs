//! Canned aggregate queries over `shipments_cleaned`.
//!
//! Every query relies on the cleaned-table guarantees: ids unique and present, regions
//! canonical, status set on every row, and `delivery_days` null exactly for in-transit rows.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlx::FromRow;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::Result;
use crate::warehouse::DbPool;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub shipment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeliveryDayCount {
    pub delivery_days: i64,
    pub shipment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewTotals {
    pub total_shipments: i64,
    pub avg_delivery_days: Option<f64>,
    /// Average over deliveries slower than the SLA.
    pub avg_late_delivery_days: Option<f64>,
    pub in_transit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub totals: OverviewTotals,
    pub by_status: Vec<StatusCount>,
    pub delivery_day_distribution: Vec<DeliveryDayCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OriginVolume {
    pub origin_region: String,
    pub total_shipments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DestinationRate {
    pub destination_region: String,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RouteStats {
    pub origin_region: String,
    pub destination_region: String,
    pub shipment_volume: i64,
    pub avg_delivery_days: Option<f64>,
    pub min_delivery_days: Option<i64>,
    pub max_delivery_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RouteSpeed {
    pub origin_region: String,
    pub destination_region: String,
    pub avg_delivery_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DestinationSummary {
    pub destination_region: String,
    pub total_shipments: i64,
    pub delivered_shipments: i64,
    pub in_transit_shipments: i64,
    pub delivery_success_rate: Option<f64>,
    pub avg_delivery_days: Option<f64>,
    pub min_delivery_days: Option<i64>,
    pub max_delivery_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalReport {
    pub volume_by_origin: Vec<OriginVolume>,
    pub success_rate_by_destination: Vec<DestinationRate>,
    pub on_time_rate_by_destination: Vec<DestinationRate>,
    pub route_stats: Vec<RouteStats>,
    pub slowest_routes: Vec<RouteSpeed>,
    pub fastest_routes: Vec<RouteSpeed>,
    pub destination_summary: Vec<DestinationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct HolidayPeriodStats {
    pub holiday_period: String,
    pub shipment_volume: i64,
    pub avg_delivery_days: Option<f64>,
    pub delivery_success_rate: Option<f64>,
    pub in_transit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayReport {
    pub periods: Vec<HolidayPeriodStats>,
    /// Holiday average minus regular average, in days. `None` when either side is empty.
    pub delay_gap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeeklyTrend {
    pub week_number: String,
    pub total_shipments: i64,
    pub avg_delivery_days: Option<f64>,
    pub in_transit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reports {
    pub overview: Overview,
    pub regional: RegionalReport,
    pub holiday: HolidayReport,
    pub weekly_trend: Vec<WeeklyTrend>,
}

pub async fn overview(pool: &DbPool, sla_days: i64) -> Result<Overview> {
    let total_shipments: i64 =
        sqlx::query_scalar("SELECT COUNT(shipment_id) FROM shipments_cleaned")
            .fetch_one(pool)
            .await?;

    let by_status = sqlx::query_as::<_, StatusCount>(
        r#"
            SELECT status, COUNT(*) AS shipment_count
            FROM shipments_cleaned
            GROUP BY status
            ORDER BY shipment_count DESC, status
        "#,
    )
    .fetch_all(pool)
    .await?;

    let delivery_day_distribution = sqlx::query_as::<_, DeliveryDayCount>(
        r#"
            SELECT delivery_days, COUNT(*) AS shipment_count
            FROM shipments_cleaned
            WHERE delivery_days IS NOT NULL
            GROUP BY delivery_days
            ORDER BY delivery_days
        "#,
    )
    .fetch_all(pool)
    .await?;

    let avg_delivery_days: Option<f64> =
        sqlx::query_scalar("SELECT ROUND(AVG(delivery_days), 2) FROM shipments_cleaned")
            .fetch_one(pool)
            .await?;

    let avg_late_delivery_days: Option<f64> = sqlx::query_scalar(
        "SELECT ROUND(AVG(delivery_days), 2) FROM shipments_cleaned WHERE delivery_days > ?",
    )
    .bind(sla_days)
    .fetch_one(pool)
    .await?;

    let in_transit_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shipments_cleaned WHERE status = 'In Transit'")
            .fetch_one(pool)
            .await?;

    Ok(Overview {
        totals: OverviewTotals {
            total_shipments,
            avg_delivery_days,
            avg_late_delivery_days,
            in_transit_count,
        },
        by_status,
        delivery_day_distribution,
    })
}

const ROUTE_SPEED_SQL: &str = r#"
    SELECT origin_region, destination_region,
           ROUND(AVG(delivery_days), 2) AS avg_delivery_days
    FROM shipments_cleaned
    WHERE status = 'Delivered'
    GROUP BY origin_region, destination_region
"#;

pub async fn regional(pool: &DbPool, sla_days: i64, route_limit: i64) -> Result<RegionalReport> {
    let volume_by_origin = sqlx::query_as::<_, OriginVolume>(
        r#"
            SELECT origin_region, COUNT(*) AS total_shipments
            FROM shipments_cleaned
            GROUP BY origin_region
            ORDER BY total_shipments DESC, origin_region
        "#,
    )
    .fetch_all(pool)
    .await?;

    let success_rate_by_destination = sqlx::query_as::<_, DestinationRate>(
        r#"
            SELECT destination_region,
                   ROUND(COUNT(CASE WHEN status = 'Delivered' THEN 1 END) * 100.0 / COUNT(*), 2)
                       AS rate
            FROM shipments_cleaned
            GROUP BY destination_region
            ORDER BY rate DESC, destination_region
        "#,
    )
    .fetch_all(pool)
    .await?;

    let on_time_rate_by_destination = sqlx::query_as::<_, DestinationRate>(
        r#"
            SELECT destination_region,
                   ROUND(SUM(CASE WHEN delivery_days <= ? THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 2)
                       AS rate
            FROM shipments_cleaned
            GROUP BY destination_region
            ORDER BY rate DESC, destination_region
        "#,
    )
    .bind(sla_days)
    .fetch_all(pool)
    .await?;

    let route_stats = sqlx::query_as::<_, RouteStats>(
        r#"
            SELECT origin_region, destination_region,
                   COUNT(*) AS shipment_volume,
                   ROUND(AVG(delivery_days), 2) AS avg_delivery_days,
                   MIN(delivery_days) AS min_delivery_days,
                   MAX(delivery_days) AS max_delivery_days
            FROM shipments_cleaned
            WHERE status = 'Delivered'
            GROUP BY origin_region, destination_region
            ORDER BY avg_delivery_days, origin_region, destination_region
        "#,
    )
    .fetch_all(pool)
    .await?;

    let slowest_sql = format!(
        "{ROUTE_SPEED_SQL} ORDER BY avg_delivery_days DESC, origin_region, destination_region LIMIT ?"
    );
    let slowest_routes = sqlx::query_as::<_, RouteSpeed>(&slowest_sql)
        .bind(route_limit)
        .fetch_all(pool)
        .await?;

    let fastest_sql = format!(
        "{ROUTE_SPEED_SQL} ORDER BY avg_delivery_days ASC, origin_region, destination_region LIMIT ?"
    );
    let fastest_routes = sqlx::query_as::<_, RouteSpeed>(&fastest_sql)
        .bind(route_limit)
        .fetch_all(pool)
        .await?;

    let destination_summary = sqlx::query_as::<_, DestinationSummary>(
        r#"
            SELECT destination_region,
                   COUNT(shipment_id) AS total_shipments,
                   COUNT(CASE WHEN status = 'Delivered' THEN 1 END) AS delivered_shipments,
                   COUNT(CASE WHEN status = 'In Transit' THEN 1 END) AS in_transit_shipments,
                   ROUND(COUNT(CASE WHEN status = 'Delivered' THEN 1 END) * 100.0 / COUNT(*), 2)
                       AS delivery_success_rate,
                   ROUND(AVG(delivery_days), 2) AS avg_delivery_days,
                   MIN(delivery_days) AS min_delivery_days,
                   MAX(delivery_days) AS max_delivery_days
            FROM shipments_cleaned
            GROUP BY destination_region
            ORDER BY delivery_success_rate DESC, destination_region
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(RegionalReport {
        volume_by_origin,
        success_rate_by_destination,
        on_time_rate_by_destination,
        route_stats,
        slowest_routes,
        fastest_routes,
        destination_summary,
    })
}

pub async fn holiday(pool: &DbPool) -> Result<HolidayReport> {
    let periods = sqlx::query_as::<_, HolidayPeriodStats>(
        r#"
            SELECT holiday_period,
                   COUNT(*) AS shipment_volume,
                   ROUND(AVG(delivery_days), 2) AS avg_delivery_days,
                   ROUND(COUNT(CASE WHEN status = 'Delivered' THEN 1 END) * 100.0 / COUNT(*), 2)
                       AS delivery_success_rate,
                   COUNT(CASE WHEN status = 'In Transit' THEN 1 END) AS in_transit_count
            FROM shipments_cleaned
            GROUP BY holiday_period
            ORDER BY holiday_period DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let delay_gap: Option<f64> = sqlx::query_scalar(
        r#"
            SELECT ROUND(
                (SELECT AVG(delivery_days) FROM shipments_cleaned WHERE holiday_period = 'Yes')
                -
                (SELECT AVG(delivery_days) FROM shipments_cleaned WHERE holiday_period = 'No'),
                2
            )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(HolidayReport { periods, delay_gap })
}

pub async fn weekly_trend(pool: &DbPool) -> Result<Vec<WeeklyTrend>> {
    let rows = sqlx::query_as::<_, WeeklyTrend>(
        r#"
            SELECT strftime('%W', ship_date) AS week_number,
                   COUNT(*) AS total_shipments,
                   ROUND(AVG(delivery_days), 2) AS avg_delivery_days,
                   COUNT(CASE WHEN status = 'In Transit' THEN 1 END) AS in_transit_count
            FROM shipments_cleaned
            GROUP BY week_number
            ORDER BY week_number
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn collect_reports(pool: &DbPool, config: &ReportConfig) -> Result<Reports> {
    config.validate()?;
    Ok(Reports {
        overview: overview(pool, config.sla_days).await?,
        regional: regional(pool, config.sla_days, config.route_limit).await?,
        holiday: holiday(pool).await?,
        weekly_trend: weekly_trend(pool).await?,
    })
}

fn write_rows<T: Serialize>(directory: &Path, name: &str, rows: &[T]) -> Result<PathBuf> {
    let path = directory.join(format!("{name}.csv"));
    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path)
}

/// One CSV per query result. An empty result produces an empty file.
pub fn write_reports(reports: &Reports, directory: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)?;

    let overview = &reports.overview;
    let regional = &reports.regional;
    let written = vec![
        write_rows(directory, "overview_totals", std::slice::from_ref(&overview.totals))?,
        write_rows(directory, "count_by_status", &overview.by_status)?,
        write_rows(
            directory,
            "delivery_day_distribution",
            &overview.delivery_day_distribution,
        )?,
        write_rows(directory, "volume_by_origin", &regional.volume_by_origin)?,
        write_rows(
            directory,
            "success_rate_by_destination",
            &regional.success_rate_by_destination,
        )?,
        write_rows(
            directory,
            "on_time_rate_by_destination",
            &regional.on_time_rate_by_destination,
        )?,
        write_rows(directory, "route_stats", &regional.route_stats)?,
        write_rows(directory, "slowest_routes", &regional.slowest_routes)?,
        write_rows(directory, "fastest_routes", &regional.fastest_routes)?,
        write_rows(directory, "destination_summary", &regional.destination_summary)?,
        write_rows(directory, "holiday_periods", &reports.holiday.periods)?,
        write_rows(
            directory,
            "holiday_delay_gap",
            &[HolidayGapRow {
                delay_gap: reports.holiday.delay_gap,
            }],
        )?,
        write_rows(directory, "weekly_trend", &reports.weekly_trend)?,
    ];

    info!(
        directory = %directory.display(),
        files = written.len(),
        "exported report tables"
    );
    Ok(written)
}

#[derive(Serialize)]
struct HolidayGapRow {
    delay_gap: Option<f64>,
}

/// Runs every canned query and writes the results into `config.export_directory`.
/// Returns no paths when no export directory is configured.
pub async fn export_reports(pool: &DbPool, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let Some(directory) = config.export_directory.as_deref() else {
        info!("no export directory configured, skipping report export");
        return Ok(Vec::new());
    };
    let reports = collect_reports(pool, config).await?;
    write_reports(&reports, directory)
}
