//! Error types for the threshold catalog

use crate::MetricKey;

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Threshold definition failed validation
    #[error("invalid threshold definition for {key}: {reason}")]
    InvalidDefinition {
        /// Metric key the definition was submitted for
        key: MetricKey,
        /// What the validation rejected
        reason: String,
    },

    /// Category not registered
    #[error("unknown category: {0}")]
    UnknownCategory(uuid::Uuid),
}

impl CatalogError {
    pub(crate) fn invalid(key: MetricKey, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            key,
            reason: reason.into(),
        }
    }
}
