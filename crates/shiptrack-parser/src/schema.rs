/// Columns every raw shipment file must carry, in generator order.
pub const RAW_COLUMNS: [&str; 6] = [
    "shipment_id",
    "ship_date",
    "delivery_date",
    "origin_region",
    "destination_region",
    "holiday_period",
];

/// Columns of the cleaned output: the raw columns plus the derived fields.
pub const CLEANED_COLUMNS: [&str; 8] = [
    "shipment_id",
    "ship_date",
    "delivery_date",
    "origin_region",
    "destination_region",
    "holiday_period",
    "status",
    "delivery_days",
];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
