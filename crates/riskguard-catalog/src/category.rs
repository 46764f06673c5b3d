//! Risk categories and metric keys
//!
//! A [`RiskCategory`] groups related metrics (e.g. "Credit Exposure" under
//! the financial kind). A [`MetricKey`] is the `(category, metric_name)`
//! pair every threshold and breach is keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique risk category identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Generate a new random category ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    #[inline]
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of risk a category covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Process, people, and system risks
    Operational,
    /// Market, credit, and liquidity risks
    Financial,
    /// Regulatory and legal risks
    Compliance,
    /// Long-horizon business risks
    Strategic,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Operational => "operational",
            Self::Financial => "financial",
            Self::Compliance => "compliance",
            Self::Strategic => "strategic",
        };
        write!(f, "{s}")
    }
}

/// A risk category
///
/// Identity (`id`, `kind`) is immutable once breaches reference the
/// category; `name` and `description` are descriptive and may be updated
/// by the configuration collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCategory {
    /// Category identifier
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// Risk kind
    pub kind: CategoryKind,
    /// Optional longer description
    pub description: Option<String>,
}

impl RiskCategory {
    /// Create a new category
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            kind,
            description: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Key identifying one measured metric: `(category, metric_name)`
///
/// All engine state (thresholds, open breaches, per-key serialization) is
/// keyed by this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    /// Owning category
    pub category_id: CategoryId,
    /// Metric name, unique within the category
    pub metric_name: String,
}

impl MetricKey {
    /// Create a new metric key
    #[must_use]
    pub fn new(category_id: CategoryId, metric_name: impl Into<String>) -> Self {
        Self {
            category_id,
            metric_name: metric_name.into(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category_id, self.metric_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_key_equality_covers_both_parts() {
        let cat = CategoryId::new();
        let a = MetricKey::new(cat, "loss-ratio");
        let b = MetricKey::new(cat, "loss-ratio");
        let c = MetricKey::new(cat, "var-95");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(MetricKey::new(CategoryId::new(), "loss-ratio"), a);
    }

    #[test]
    fn category_builder() {
        let cat = RiskCategory::new("Credit Exposure", CategoryKind::Financial)
            .with_description("counterparty concentration limits");
        assert_eq!(cat.kind, CategoryKind::Financial);
        assert!(cat.description.is_some());
    }

    #[test]
    fn category_kind_serde_round_trip() {
        let json = serde_json::to_string(&CategoryKind::Compliance).unwrap();
        assert_eq!(json, "\"compliance\"");
        let back: CategoryKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CategoryKind::Compliance);
    }
}
