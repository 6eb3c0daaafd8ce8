pub mod errors;
pub mod loader;
pub mod model;
pub mod schema;

pub use errors::LoaderError;
pub use loader::{
    load_shipments, load_shipments_from_path, normalize_blank, parse_date, parse_holiday_flag,
    parse_shipment_id,
};
pub use model::{Region, RegionField, ShipmentRecord, ShipmentStatus};

#[cfg(test)]
mod tests;
