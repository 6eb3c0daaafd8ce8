use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use shiptrack_parser::{load_shipments_from_path, ShipmentRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::outputs::record_fields;

pub type DbPool = Pool<Sqlite>;

pub const CLEANED_TABLE: &str = "shipments_cleaned";

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Open a SQLite pool, creating the database file and its directory when needed.
///
/// An in-memory database only lives as long as its connection, so such URLs get a
/// single-connection pool.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let in_memory = is_in_memory(database_url);
    if !in_memory {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;
    Ok(pool)
}

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE shipments_cleaned (
        shipment_id INTEGER,
        ship_date TEXT,
        delivery_date TEXT,
        origin_region TEXT,
        destination_region TEXT,
        holiday_period TEXT,
        status TEXT,
        delivery_days INTEGER
    )
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO shipments_cleaned (
        shipment_id, ship_date, delivery_date, origin_region,
        destination_region, holiday_period, status, delivery_days
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn optional_text(cell: String) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell)
    }
}

/// Replace `shipments_cleaned` with `records`. Runs in a single transaction, so a failed
/// load leaves the previous table in place.
pub async fn load_cleaned(pool: &DbPool, records: &[ShipmentRecord]) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS shipments_cleaned")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_TABLE_SQL).execute(&mut *tx).await?;

    let mut inserted = 0u64;
    for record in records {
        let shipment_id = record
            .shipment_id
            .map(i64::try_from)
            .transpose()
            .map_err(|_| {
                PipelineError::Warehouse(format!(
                    "shipment id from row {} does not fit in a SQLite integer",
                    record.source_row
                ))
            })?;
        let [_, ship_date, delivery_date, origin, destination, holiday, status, _] =
            record_fields(record);

        let result = sqlx::query(INSERT_SQL)
            .bind(shipment_id)
            .bind(optional_text(ship_date))
            .bind(optional_text(delivery_date))
            .bind(optional_text(origin))
            .bind(optional_text(destination))
            .bind(holiday)
            .bind(optional_text(status))
            .bind(record.delivery_days)
            .execute(&mut *tx)
            .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    info!(table = CLEANED_TABLE, rows = inserted, "loaded cleaned shipments");
    Ok(inserted)
}

/// Load a persisted cleaned CSV. The derived columns are recomputed from the dates, which
/// yields the same values the cleaning run wrote.
pub async fn load_cleaned_csv(pool: &DbPool, path: &Path) -> Result<u64> {
    let mut records = load_shipments_from_path(path)?;
    for record in records.iter_mut() {
        record.status = Some(shiptrack_parser::ShipmentStatus::from_delivery_date(
            record.delivery_date,
        ));
        record.delivery_days = crate::stages::durations::delivery_days(record);
    }
    load_cleaned(pool, &records).await
}
