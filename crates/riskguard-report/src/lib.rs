//! riskguard-report - board-level risk posture reporting
//!
//! Aggregates the breach ledger over a period into a [`BoardReport`]:
//! breach counts, a 0–100 risk posture score, resolution rate, and
//! templated findings. Reports are plain data for a rendering
//! collaborator; the approval lifecycle lives in [`ReportRegistry`].

#![warn(unreachable_pub)]

pub mod builder;
pub mod error;
pub mod registry;
pub mod report;

pub use builder::{PostureReportBuilder, ScoreWeights};
pub use error::ReportError;
pub use registry::ReportRegistry;
pub use report::{BoardReport, BreachCounts, ReportId, ReportStatus, ReportType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
