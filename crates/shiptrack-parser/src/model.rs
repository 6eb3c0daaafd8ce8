use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the canonical spelling resolves; casing and whitespace repair belongs to the
/// region normalizer.
impl TryFrom<&str> for Region {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == value)
            .ok_or_else(|| format!("unknown region '{value}'"))
    }
}

/// A region column as it moves through the cleaning stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RegionField {
    #[default]
    Missing,
    Known(Region),
    Unrecognized(String),
}

impl RegionField {
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            None => RegionField::Missing,
            Some(value) if value.trim().is_empty() => RegionField::Missing,
            Some(value) => match Region::try_from(value) {
                Ok(region) => RegionField::Known(region),
                Err(_) => RegionField::Unrecognized(value.to_string()),
            },
        }
    }

    /// True for the canonical absent marker and for blank text that slipped past the loader.
    pub fn is_absent(&self) -> bool {
        match self {
            RegionField::Missing => true,
            RegionField::Known(_) => false,
            RegionField::Unrecognized(text) => text.trim().is_empty(),
        }
    }

    pub fn known(&self) -> Option<Region> {
        match self {
            RegionField::Known(region) => Some(*region),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            RegionField::Missing => None,
            RegionField::Known(region) => Some(region.as_str()),
            RegionField::Unrecognized(text) => Some(text.as_str()),
        }
    }

    /// Rewrites unrecognized text and resolves the result again. Known regions are kept.
    pub fn map_text(self, rewrite: impl FnOnce(&str) -> String) -> Self {
        match self {
            RegionField::Unrecognized(text) => {
                let rewritten = rewrite(&text);
                RegionField::from_text(Some(&rewritten))
            }
            other => other,
        }
    }
}

impl From<Region> for RegionField {
    fn from(region: Region) -> Self {
        RegionField::Known(region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Delivered,
    InTransit,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::InTransit => "In Transit",
        }
    }

    pub fn from_delivery_date(delivery_date: Option<NaiveDate>) -> Self {
        if delivery_date.is_some() {
            ShipmentStatus::Delivered
        } else {
            ShipmentStatus::InTransit
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shipment row. `source_row` is the 1-based data row in the input file and is
/// only used for audit provenance; it never reaches the cleaned output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentRecord {
    pub source_row: usize,
    pub shipment_id: Option<u64>,
    pub ship_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub origin_region: RegionField,
    pub destination_region: RegionField,
    pub holiday_period: bool,
    pub status: Option<ShipmentStatus>,
    pub delivery_days: Option<i64>,
}

impl ShipmentRecord {
    pub fn new(source_row: usize) -> Self {
        Self {
            source_row,
            ..Self::default()
        }
    }

    pub fn holiday_label(&self) -> &'static str {
        if self.holiday_period {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn has_region_gap(&self) -> bool {
        self.origin_region.is_absent() || self.destination_region.is_absent()
    }
}
