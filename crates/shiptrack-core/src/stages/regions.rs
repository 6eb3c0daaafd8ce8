use shiptrack_parser::{Region, RegionField, ShipmentRecord, ShipmentStatus};
use tracing::info;

use super::{flag_where, remove_where, StageOutcome};
use crate::audit::AuditRule;

/// Known misspellings and the region they stand for. Matched against title-cased text.
pub const REGION_CORRECTIONS: [(&str, Region); 4] = [
    ("Noth", Region::North),
    ("Soth", Region::South),
    ("Eest", Region::East),
    ("Wes", Region::West),
];

/// Stringified-null artifacts, compared case-insensitively.
pub const PLACEHOLDER_TOKENS: [&str; 6] = ["none", "nan", "null", "undefined", "missing", " "];

/// Uppercases the first letter of every alphabetic run and lowercases the rest, so
/// `"north-EAST"` becomes `"North-East"`.
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                output.extend(ch.to_uppercase());
            } else {
                output.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            output.push(ch);
            at_word_start = true;
        }
    }
    output
}

pub fn normalize_region_text(text: &str) -> String {
    title_case(text.trim())
}

fn correct_region(field: RegionField) -> RegionField {
    match field {
        RegionField::Unrecognized(text) => REGION_CORRECTIONS
            .iter()
            .find(|(misspelling, _)| *misspelling == text)
            .map(|(_, region)| RegionField::Known(*region))
            .unwrap_or(RegionField::Unrecognized(text)),
        other => other,
    }
}

fn is_placeholder(field: &RegionField) -> bool {
    match field {
        RegionField::Unrecognized(text) => {
            let lowered = text.to_lowercase();
            PLACEHOLDER_TOKENS.contains(&lowered.as_str())
        }
        _ => false,
    }
}

pub fn normalize_region_format(mut records: Vec<ShipmentRecord>) -> StageOutcome {
    let mut resolved = 0usize;
    for record in records.iter_mut() {
        for field in [&mut record.origin_region, &mut record.destination_region] {
            let was_known = field.known().is_some();
            *field = std::mem::take(field).map_text(normalize_region_text);
            if !was_known && field.known().is_some() {
                resolved += 1;
            }
        }
    }

    info!(resolved, "normalized region formatting");
    StageOutcome::unchanged(records)
}

/// Three non-destructive views: missing origin, missing destination, and delivered
/// shipments missing either region.
pub fn log_missing_regions(records: Vec<ShipmentRecord>) -> StageOutcome {
    let mut audit = flag_where(&records, AuditRule::MissingOriginRegion, |record| {
        record.origin_region.is_absent()
    });
    audit.extend(flag_where(
        &records,
        AuditRule::MissingDestinationRegion,
        |record| record.destination_region.is_absent(),
    ));
    audit.extend(flag_where(&records, AuditRule::InconsistentRegions, |record| {
        record.status == Some(ShipmentStatus::Delivered) && record.has_region_gap()
    }));

    StageOutcome { records, audit }
}

/// Applies the misspelling table to both region fields, then flags every record that still
/// has a region outside the four canonical values. Nothing is removed here.
pub fn validate_and_correct_regions(mut records: Vec<ShipmentRecord>) -> StageOutcome {
    let mut corrected = 0usize;
    for record in records.iter_mut() {
        for field in [&mut record.origin_region, &mut record.destination_region] {
            let before_known = field.known().is_some();
            *field = correct_region(std::mem::take(field));
            if !before_known && field.known().is_some() {
                corrected += 1;
            }
        }
    }
    if corrected > 0 {
        info!(corrected, "corrected misspelled regions");
    }

    let audit = flag_where(&records, AuditRule::InvalidRegions, |record| {
        record.origin_region.known().is_none() || record.destination_region.known().is_none()
    });

    StageOutcome { records, audit }
}

pub fn drop_shipments_missing_both_regions(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::MissingBothRegions, |record| {
        record.origin_region.is_absent() && record.destination_region.is_absent()
    })
}

pub fn drop_shipments_with_missing_region(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::MissingRegion, ShipmentRecord::has_region_gap)
}

pub fn remove_invalid_region_strings(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::InvalidRegionText, |record| {
        is_placeholder(&record.origin_region) || is_placeholder(&record.destination_region)
    })
}

/// Final region pass: whatever is still not one of the four canonical regions goes.
pub fn drop_unrecognized_regions(records: Vec<ShipmentRecord>) -> StageOutcome {
    remove_where(records, AuditRule::UnrecognizedRegion, |record| {
        record.origin_region.known().is_none() || record.destination_region.known().is_none()
    })
}
