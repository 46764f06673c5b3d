//! Appetite threshold definitions
//!
//! A [`ThresholdDefinition`] records the organization's appetite for one
//! metric plus the warning/critical variance bands around it. Bands are
//! absolute percentage deviations from the appetite value: a measurement
//! whose |variance| reaches the warning band is a breach, the critical
//! band a critical breach.

use crate::error::CatalogError;
use crate::MetricKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default warning band: |variance| >= 10% of appetite
pub const DEFAULT_WARNING_BAND_PCT: f64 = 10.0;

/// Default critical band: |variance| >= 20% of appetite
pub const DEFAULT_CRITICAL_BAND_PCT: f64 = 20.0;

/// How often a metric is expected to be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementFrequency {
    /// Streamed as produced
    RealTime,
    /// Once per hour
    Hourly,
    /// Once per day
    Daily,
    /// Once per week
    Weekly,
    /// Once per month
    Monthly,
    /// Once per quarter
    Quarterly,
}

impl fmt::Display for MeasurementFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RealTime => "real_time",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        };
        write!(f, "{s}")
    }
}

/// Appetite and tolerance bands for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdDefinition {
    /// The organization's accepted/target level for the metric
    pub appetite_value: f64,
    /// Warning band, as absolute variance percentage
    pub warning_threshold: f64,
    /// Critical band, as absolute variance percentage
    pub critical_threshold: f64,
    /// Expected measurement cadence
    pub measurement_frequency: MeasurementFrequency,
    /// Where measurements come from (system of record name)
    pub data_source: String,
}

impl ThresholdDefinition {
    /// Create a definition with the default warning/critical bands
    #[must_use]
    pub fn new(appetite_value: f64, frequency: MeasurementFrequency, source: impl Into<String>) -> Self {
        Self {
            appetite_value,
            warning_threshold: DEFAULT_WARNING_BAND_PCT,
            critical_threshold: DEFAULT_CRITICAL_BAND_PCT,
            measurement_frequency: frequency,
            data_source: source.into(),
        }
    }

    /// Override the warning/critical bands
    #[must_use]
    pub fn with_bands(mut self, warning: f64, critical: f64) -> Self {
        self.warning_threshold = warning;
        self.critical_threshold = critical;
        self
    }

    /// Validate the definition before it enters the catalog
    ///
    /// # Errors
    /// - zero appetite (variance would be undefined)
    /// - non-positive or non-finite bands
    /// - warning band not strictly below the critical band
    pub fn validate(&self, key: &MetricKey) -> Result<(), CatalogError> {
        if !self.appetite_value.is_finite() || self.appetite_value == 0.0 {
            return Err(CatalogError::invalid(
                key.clone(),
                "appetite_value must be finite and non-zero",
            ));
        }
        if !self.warning_threshold.is_finite() || self.warning_threshold <= 0.0 {
            return Err(CatalogError::invalid(
                key.clone(),
                "warning_threshold must be positive",
            ));
        }
        if !self.critical_threshold.is_finite() || self.critical_threshold <= 0.0 {
            return Err(CatalogError::invalid(
                key.clone(),
                "critical_threshold must be positive",
            ));
        }
        if self.warning_threshold >= self.critical_threshold {
            return Err(CatalogError::invalid(
                key.clone(),
                "warning_threshold must be below critical_threshold",
            ));
        }
        Ok(())
    }
}
