use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::LoaderError;
use crate::model::{RegionField, ShipmentRecord};
use crate::schema::{DATE_FORMAT, RAW_COLUMNS, TIMESTAMP_FORMAT};

/// Raw CSV row. Every cell is text so that malformed values can degrade to absent
/// instead of failing the whole batch. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct RawShipmentRow {
    shipment_id: Option<String>,
    ship_date: Option<String>,
    delivery_date: Option<String>,
    origin_region: Option<String>,
    destination_region: Option<String>,
    holiday_period: Option<String>,
}

impl RawShipmentRow {
    fn into_record(self, source_row: usize) -> ShipmentRecord {
        let shipment_id = normalize_blank(self.shipment_id);
        let ship_date = normalize_blank(self.ship_date);
        let delivery_date = normalize_blank(self.delivery_date);
        let origin_region = normalize_blank(self.origin_region);
        let destination_region = normalize_blank(self.destination_region);
        let holiday_period = normalize_blank(self.holiday_period);

        ShipmentRecord {
            source_row,
            shipment_id: shipment_id.as_deref().and_then(parse_shipment_id),
            ship_date: ship_date.as_deref().and_then(parse_date),
            delivery_date: delivery_date.as_deref().and_then(parse_date),
            origin_region: RegionField::from_text(origin_region.as_deref()),
            destination_region: RegionField::from_text(destination_region.as_deref()),
            holiday_period: holiday_period.as_deref().is_some_and(parse_holiday_flag),
            status: None,
            delivery_days: None,
        }
    }
}

pub fn load_shipments_from_path(path: &Path) -> Result<Vec<ShipmentRecord>, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let records = load_shipments(file)?;
    info!(
        path = %path.display(),
        rows = records.len(),
        "loaded raw shipment records"
    );
    Ok(records)
}

/// Reads every data row into a record. No row is dropped here; blank cells become
/// absent values and unparseable ids or dates degrade to absent. Short rows load
/// with their missing trailing cells absent.
pub fn load_shipments<R: Read>(reader: R) -> Result<Vec<ShipmentRecord>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::None)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in RAW_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoaderError::MissingColumn { column });
        }
    }

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<RawShipmentRow>().enumerate() {
        let source_row = index + 1;
        let row = row.map_err(|source| LoaderError::DataRow {
            row: source_row,
            source,
        })?;
        records.push(row.into_record(source_row));
    }

    debug!(rows = records.len(), "parsed shipment rows");
    Ok(records)
}

/// Maps empty and whitespace-only text to the single absent marker.
pub fn normalize_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Accepts integral text (`"17"`) and integral floats (`"17.0"`). Anything else,
/// exponent forms included, is treated as absent.
pub fn parse_shipment_id(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        return (id > 0).then_some(id);
    }

    let (whole, fraction) = trimmed.split_once('.')?;
    if whole.is_empty()
        || !whole.bytes().all(|byte| byte.is_ascii_digit())
        || !fraction.bytes().all(|byte| byte == b'0')
    {
        return None;
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT)
                .ok()
                .map(|timestamp| timestamp.date())
        })
}

pub fn parse_holiday_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}
