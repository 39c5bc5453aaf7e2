#![warn(missing_docs)]
//! SFPO Report - Result Records and Export
//!
//! Flattens engine results into plain numeric records suitable for tabular
//! export, and generates the machine-readable formats:
//! - JSON (full report with schema metadata)
//! - CSV (one section per result table)
//!
//! Plot rendering and spreadsheet formatting live with external
//! collaborators; this crate only owns the record shapes they consume.

mod csv;
mod json;
mod report;

pub use csv::generate_csv_report;
pub use json::{ReportSchema, generate_json_report};
pub use report::{
    AnovaRecord, BootstrapRecord, IntervalRecord, PosthocRecord, Report, ReportMeta,
    SeriesFeatureRecord, SpecimenRecord,
};
