//! The threshold catalog
//!
//! [`ThresholdCatalog`] is the engine's read-only view of appetite
//! configuration. The configuration collaborator owns mutation
//! (`register_category` / `upsert` / `remove`); the evaluator only ever
//! calls [`ThresholdCatalog::definition`].

use crate::category::{CategoryId, MetricKey, RiskCategory};
use crate::error::CatalogError;
use crate::threshold::ThresholdDefinition;
use dashmap::DashMap;
use tracing::debug;

/// Catalog of risk categories and per-metric appetite thresholds
#[derive(Debug, Default)]
pub struct ThresholdCatalog {
    categories: DashMap<CategoryId, RiskCategory>,
    definitions: DashMap<MetricKey, ThresholdDefinition>,
}

impl ThresholdCatalog {
    /// Create an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a risk category
    ///
    /// Re-registering an existing ID replaces the stored category wholesale,
    /// `kind` included; callers own category identity.
    pub fn register_category(&self, category: RiskCategory) {
        debug!(category = %category.id, name = %category.name, "category registered");
        self.categories.insert(category.id, category);
    }

    /// Look up a category
    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<RiskCategory> {
        self.categories.get(&id).map(|c| c.clone())
    }

    /// Insert or replace the threshold definition for a metric
    ///
    /// # Errors
    /// - [`CatalogError::UnknownCategory`] if the key's category is not
    ///   registered
    /// - [`CatalogError::InvalidDefinition`] if validation fails
    pub fn upsert(&self, key: MetricKey, definition: ThresholdDefinition) -> Result<(), CatalogError> {
        if !self.categories.contains_key(&key.category_id) {
            return Err(CatalogError::UnknownCategory(key.category_id.as_uuid()));
        }
        definition.validate(&key)?;
        debug!(
            metric = %key,
            appetite = definition.appetite_value,
            warning = definition.warning_threshold,
            critical = definition.critical_threshold,
            "threshold upserted"
        );
        self.definitions.insert(key, definition);
        Ok(())
    }

    /// Remove a metric's threshold definition
    pub fn remove(&self, key: &MetricKey) -> Option<ThresholdDefinition> {
        self.definitions.remove(key).map(|(_, def)| def)
    }

    /// Read the threshold definition for a metric, if configured
    ///
    /// This is the only call the engine makes against the catalog.
    #[must_use]
    pub fn definition(&self, key: &MetricKey) -> Option<ThresholdDefinition> {
        self.definitions.get(key).map(|d| d.clone())
    }

    /// Number of configured metrics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether any metrics are configured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All configured metric keys
    #[must_use]
    pub fn metric_keys(&self) -> Vec<MetricKey> {
        self.definitions.iter().map(|e| e.key().clone()).collect()
    }
}
