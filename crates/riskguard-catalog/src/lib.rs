//! riskguard-catalog - risk categories and appetite thresholds
//!
//! The leaf crate of the riskguard workspace:
//! - [`RiskCategory`] / [`CategoryKind`] - how risks are grouped
//! - [`MetricKey`] - the `(category, metric)` pair everything is keyed by
//! - [`ThresholdDefinition`] - appetite value plus warning/critical bands
//! - [`ThresholdCatalog`] - the engine's read-only configuration view
//!
//! The catalog is owned by an external configuration collaborator; the
//! breach engine only reads it and never fabricates a missing threshold.

#![warn(unreachable_pub)]

pub mod catalog;
pub mod category;
pub mod error;
pub mod threshold;

pub use catalog::ThresholdCatalog;
pub use category::{CategoryId, CategoryKind, MetricKey, RiskCategory};
pub use error::CatalogError;
pub use threshold::{
    MeasurementFrequency, ThresholdDefinition, DEFAULT_CRITICAL_BAND_PCT, DEFAULT_WARNING_BAND_PCT,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
