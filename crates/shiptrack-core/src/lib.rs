pub mod audit;
pub mod config;
pub mod error;
pub mod outputs;
pub mod pipeline;
pub mod stages;
pub mod summary;

#[cfg(feature = "runtime")]
pub mod reports;
#[cfg(feature = "runtime")]
pub mod warehouse;

pub use audit::{AuditEntry, AuditRule, AuditTrail, DefectKind, Disposition};
pub use config::{DurationBand, OutputFormat, PipelineConfig, ReportConfig, ShiptrackConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{clean_shipments, run_pipeline, run_stages, CleaningRun, PipelineReport};
