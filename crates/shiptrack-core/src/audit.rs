use std::collections::BTreeMap;

use serde::Serialize;
use shiptrack_parser::ShipmentRecord;

/// Data-quality defect taxonomy. Every defect is recovered locally by repair, flagging or
/// removal; none of them aborts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    MissingIdentifier,
    DuplicateIdentifier,
    MissingShipDate,
    InvertedDateOrder,
    MissingBothDates,
    MissingRegion,
    InvalidRegionToken,
    ImplausibleDuration,
}

impl DefectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectKind::MissingIdentifier => "missing_identifier",
            DefectKind::DuplicateIdentifier => "duplicate_identifier",
            DefectKind::MissingShipDate => "missing_ship_date",
            DefectKind::InvertedDateOrder => "inverted_date_order",
            DefectKind::MissingBothDates => "missing_both_dates",
            DefectKind::MissingRegion => "missing_region",
            DefectKind::InvalidRegionToken => "invalid_region_token",
            DefectKind::ImplausibleDuration => "implausible_duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Removed,
    Repaired,
    Flagged,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Removed => "removed",
            Disposition::Repaired => "repaired",
            Disposition::Flagged => "flagged",
        }
    }
}

/// One rule per audit artifact. Two rules never share a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRule {
    ReassignedIds,
    DuplicateIds,
    MissingShipDate,
    InvalidDeliveryDate,
    MissingBothDates,
    MissingOriginRegion,
    MissingDestinationRegion,
    InconsistentRegions,
    InvalidRegions,
    MissingBothRegions,
    MissingRegion,
    InvalidRegionText,
    UnrecognizedRegion,
    Outliers,
    RemovedOutliers,
}

impl AuditRule {
    pub const ALL: [AuditRule; 15] = [
        AuditRule::ReassignedIds,
        AuditRule::DuplicateIds,
        AuditRule::MissingShipDate,
        AuditRule::InvalidDeliveryDate,
        AuditRule::MissingBothDates,
        AuditRule::MissingOriginRegion,
        AuditRule::MissingDestinationRegion,
        AuditRule::InconsistentRegions,
        AuditRule::InvalidRegions,
        AuditRule::MissingBothRegions,
        AuditRule::MissingRegion,
        AuditRule::InvalidRegionText,
        AuditRule::UnrecognizedRegion,
        AuditRule::Outliers,
        AuditRule::RemovedOutliers,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AuditRule::ReassignedIds => "reassigned_ids",
            AuditRule::DuplicateIds => "duplicate_ids",
            AuditRule::MissingShipDate => "missing_ship_date",
            AuditRule::InvalidDeliveryDate => "invalid_delivery_dates",
            AuditRule::MissingBothDates => "missing_both_dates",
            AuditRule::MissingOriginRegion => "missing_origin_region",
            AuditRule::MissingDestinationRegion => "missing_destination_region",
            AuditRule::InconsistentRegions => "inconsistent_regions",
            AuditRule::InvalidRegions => "invalid_regions",
            AuditRule::MissingBothRegions => "missing_both_regions",
            AuditRule::MissingRegion => "missing_region",
            AuditRule::InvalidRegionText => "invalid_region_text",
            AuditRule::UnrecognizedRegion => "unrecognized_region",
            AuditRule::Outliers => "outliers",
            AuditRule::RemovedOutliers => "removed_outliers",
        }
    }

    pub fn file_name(&self) -> String {
        format!("shipments_{}.csv", self.code())
    }

    pub fn kind(&self) -> DefectKind {
        match self {
            AuditRule::ReassignedIds => DefectKind::MissingIdentifier,
            AuditRule::DuplicateIds => DefectKind::DuplicateIdentifier,
            AuditRule::MissingShipDate => DefectKind::MissingShipDate,
            AuditRule::InvalidDeliveryDate => DefectKind::InvertedDateOrder,
            AuditRule::MissingBothDates => DefectKind::MissingBothDates,
            AuditRule::MissingOriginRegion
            | AuditRule::MissingDestinationRegion
            | AuditRule::InconsistentRegions
            | AuditRule::MissingBothRegions
            | AuditRule::MissingRegion => DefectKind::MissingRegion,
            AuditRule::InvalidRegions
            | AuditRule::InvalidRegionText
            | AuditRule::UnrecognizedRegion => DefectKind::InvalidRegionToken,
            AuditRule::Outliers | AuditRule::RemovedOutliers => DefectKind::ImplausibleDuration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub rule: AuditRule,
    pub disposition: Disposition,
    pub record: ShipmentRecord,
}

impl AuditEntry {
    pub fn removed(rule: AuditRule, record: ShipmentRecord) -> Self {
        Self {
            rule,
            disposition: Disposition::Removed,
            record,
        }
    }

    pub fn repaired(rule: AuditRule, record: ShipmentRecord) -> Self {
        Self {
            rule,
            disposition: Disposition::Repaired,
            record,
        }
    }

    pub fn flagged(rule: AuditRule, record: ShipmentRecord) -> Self {
        Self {
            rule,
            disposition: Disposition::Flagged,
            record,
        }
    }

    pub fn kind(&self) -> DefectKind {
        self.rule.kind()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleCount {
    pub removed: usize,
    pub repaired: usize,
    pub flagged: usize,
}

/// Everything the stages reported during one run, in the order it was reported.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = AuditEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_rule(&self, rule: AuditRule) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.rule == rule)
    }

    pub fn removed(&self) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.disposition == Disposition::Removed)
    }

    pub fn removed_count(&self) -> usize {
        self.removed().count()
    }

    pub fn rule_counts(&self) -> BTreeMap<AuditRule, RuleCount> {
        let mut counts: BTreeMap<AuditRule, RuleCount> = BTreeMap::new();
        for entry in &self.entries {
            let count = counts.entry(entry.rule).or_default();
            match entry.disposition {
                Disposition::Removed => count.removed += 1,
                Disposition::Repaired => count.repaired += 1,
                Disposition::Flagged => count.flagged += 1,
            }
        }
        counts
    }
}
