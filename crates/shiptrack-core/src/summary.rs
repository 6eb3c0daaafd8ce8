use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use shiptrack_parser::ShipmentRecord;

use crate::audit::{Disposition, RuleCount};
use crate::pipeline::CleaningRun;

/// Days between 0001-01-01 and 1970-01-01, the offset polars dates are stored against.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryDayStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub input_rows: usize,
    pub surviving_rows: usize,
    pub removed_rows: usize,
    pub repaired_rows: usize,
    pub rules: BTreeMap<String, RuleCount>,
    pub status_counts: BTreeMap<String, usize>,
    pub delivery_days: DeliveryDayStats,
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Columnar view of the records, in cleaned-output column order.
pub fn records_to_dataframe(records: &[ShipmentRecord]) -> PolarsResult<DataFrame> {
    let shipment_ids: Vec<Option<u64>> = records.iter().map(|r| r.shipment_id).collect();
    let ship_dates: Vec<Option<i32>> = records
        .iter()
        .map(|r| r.ship_date.map(days_since_epoch))
        .collect();
    let delivery_dates: Vec<Option<i32>> = records
        .iter()
        .map(|r| r.delivery_date.map(days_since_epoch))
        .collect();
    let origins: Vec<Option<&str>> = records.iter().map(|r| r.origin_region.text()).collect();
    let destinations: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.destination_region.text())
        .collect();
    let holidays: Vec<&str> = records.iter().map(|r| r.holiday_label()).collect();
    let statuses: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.status.map(|status| status.as_str()))
        .collect();
    let delivery_days: Vec<Option<i64>> = records.iter().map(|r| r.delivery_days).collect();

    let ship_series = Series::new("ship_date".into(), ship_dates).cast(&DataType::Date)?;
    let delivery_series =
        Series::new("delivery_date".into(), delivery_dates).cast(&DataType::Date)?;

    DataFrame::new(vec![
        Series::new("shipment_id".into(), shipment_ids).into(),
        ship_series.into(),
        delivery_series.into(),
        Series::new("origin_region".into(), origins).into(),
        Series::new("destination_region".into(), destinations).into(),
        Series::new("holiday_period".into(), holidays).into(),
        Series::new("status".into(), statuses).into(),
        Series::new("delivery_days".into(), delivery_days).into(),
    ])
}

fn status_counts(df: &DataFrame) -> PolarsResult<BTreeMap<String, usize>> {
    let counts = df
        .clone()
        .lazy()
        .group_by([col("status")])
        .agg([len().cast(DataType::UInt64).alias("count")])
        .sort(["status"], SortMultipleOptions::default())
        .collect()?;

    let statuses = counts.column("status")?.str()?;
    let totals = counts.column("count")?.u64()?;

    let mut output = BTreeMap::new();
    for (status, total) in statuses.into_iter().zip(totals.into_iter()) {
        output.insert(
            status.unwrap_or("Unknown").to_string(),
            total.unwrap_or(0) as usize,
        );
    }
    Ok(output)
}

fn delivery_day_stats(df: &DataFrame) -> PolarsResult<DeliveryDayStats> {
    let days = df.column("delivery_days")?.i64()?;
    Ok(DeliveryDayStats {
        count: days.len() - days.null_count(),
        mean: days.mean(),
        min: days.min(),
        max: days.max(),
    })
}

pub fn summarize(run: &CleaningRun) -> PolarsResult<PipelineSummary> {
    let df = records_to_dataframe(&run.records)?;

    let rules = run
        .audit
        .rule_counts()
        .into_iter()
        .map(|(rule, count)| (rule.code().to_string(), count))
        .collect();
    let repaired_rows = run
        .audit
        .entries()
        .iter()
        .filter(|entry| entry.disposition == Disposition::Repaired)
        .count();

    Ok(PipelineSummary {
        input_rows: run.input_rows,
        surviving_rows: run.records.len(),
        removed_rows: run.audit.removed_count(),
        repaired_rows,
        rules,
        status_counts: status_counts(&df)?,
        delivery_days: delivery_day_stats(&df)?,
    })
}
