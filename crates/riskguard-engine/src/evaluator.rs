//! Breach evaluation
//!
//! [`BreachEvaluator`] is the single place measurements are classified
//! against appetite. Classification lives here and nowhere else; report
//! and formatting call sites consume the severity the evaluator stamped
//! on the record.

use crate::error::EngineError;
use crate::ledger::{BreachDisposition, BreachLedger};
use crate::types::{variance_percentage, Measurement, Severity};
use riskguard_catalog::{ThresholdCatalog, ThresholdDefinition};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of evaluating one measurement
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Value inside the warning band; no record created, no auto-resolve
    /// of any existing open record (noisy single readings must not flap
    /// a breach closed)
    WithinAppetite {
        /// Signed variance of the measurement
        variance: f64,
    },
    /// No threshold configured for the metric: configuration gap, the
    /// measurement is skipped and counted, never turned into a breach
    SkippedMissingThreshold,
    /// The measurement breached; a record was created or updated
    Breached {
        /// Ledger disposition (opened vs. updated)
        disposition: BreachDisposition,
        /// Classified severity (advisory form, before persistence mapping)
        severity: Severity,
        /// Signed variance of the measurement
        variance: f64,
    },
}

/// Classify a signed variance against a threshold definition
///
/// Returns `None` while the value sits inside the warning band.
#[must_use]
pub fn classify(variance: f64, definition: &ThresholdDefinition) -> Option<Severity> {
    let magnitude = variance.abs();
    if magnitude >= definition.critical_threshold {
        Some(Severity::Critical)
    } else if magnitude >= definition.warning_threshold {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// Evaluates measurements against the threshold catalog
pub struct BreachEvaluator {
    catalog: Arc<ThresholdCatalog>,
    ledger: Arc<BreachLedger>,
    configuration_gaps: AtomicU64,
}

impl BreachEvaluator {
    /// Create an evaluator over a catalog and ledger
    #[must_use]
    pub fn new(catalog: Arc<ThresholdCatalog>, ledger: Arc<BreachLedger>) -> Self {
        Self {
            catalog,
            ledger,
            configuration_gaps: AtomicU64::new(0),
        }
    }

    /// Evaluate one measurement
    ///
    /// A missing threshold definition is recovered locally: the
    /// measurement is skipped, logged, and counted - never fabricated
    /// into a breach. Writers on the same metric serialize inside the
    /// ledger, so concurrent evaluations cannot open two records.
    ///
    /// # Errors
    /// Only ledger-internal failures propagate; classification itself
    /// never fails.
    pub fn evaluate(&self, measurement: &Measurement) -> Result<Evaluation, EngineError> {
        let Some(definition) = self.catalog.definition(&measurement.metric) else {
            self.configuration_gaps.fetch_add(1, Ordering::Relaxed);
            warn!(metric = %measurement.metric, "measurement skipped: no threshold definition");
            return Ok(Evaluation::SkippedMissingThreshold);
        };

        let variance = variance_percentage(measurement.actual_value, definition.appetite_value);
        let Some(severity) = classify(variance, &definition) else {
            debug!(metric = %measurement.metric, variance, "measurement within appetite");
            return Ok(Evaluation::WithinAppetite { variance });
        };

        let disposition = self.ledger.record_breach(
            measurement.metric.clone(),
            measurement.actual_value,
            definition.appetite_value,
            severity,
            measurement.measured_at,
        )?;

        Ok(Evaluation::Breached {
            disposition,
            severity,
            variance,
        })
    }

    /// Measurements skipped because no threshold was configured
    #[inline]
    #[must_use]
    pub fn configuration_gaps(&self) -> u64 {
        self.configuration_gaps.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EscalationRoute;
    use crate::types::ResolutionStatus;
    use chrono::Utc;
    use riskguard_catalog::{
        CategoryKind, MeasurementFrequency, MetricKey, RiskCategory,
    };

    fn fixture() -> (BreachEvaluator, Arc<BreachLedger>, MetricKey) {
        let catalog = Arc::new(ThresholdCatalog::new());
        let category = RiskCategory::new("Operational Losses", CategoryKind::Operational);
        let key = MetricKey::new(category.id, "loss-ratio");
        catalog.register_category(category);
        catalog
            .upsert(
                key.clone(),
                ThresholdDefinition::new(100.0, MeasurementFrequency::Daily, "risk-mart")
                    .with_bands(10.0, 20.0),
            )
            .unwrap();

        let ledger = Arc::new(BreachLedger::new(EscalationRoute::default(), 16));
        let evaluator = BreachEvaluator::new(catalog, Arc::clone(&ledger));
        (evaluator, ledger, key)
    }

    #[test]
    fn critical_excursion_opens_breach() {
        // Appetite 100, warning at |10|%, critical at |20|%; 125 is +25%.
        let (evaluator, ledger, key) = fixture();
        let outcome = evaluator
            .evaluate(&Measurement::new(key.clone(), 125.0))
            .unwrap();

        let Evaluation::Breached {
            disposition,
            severity,
            variance,
        } = outcome
        else {
            panic!("expected a breach");
        };
        assert_eq!(severity, Severity::Critical);
        assert_eq!(variance, 25.0);

        let record = ledger.get(disposition.breach_id()).unwrap();
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.resolution_status, ResolutionStatus::Open);
        assert_eq!(record.variance_percentage, 25.0);
    }

    #[test]
    fn warning_band_persists_as_breach_severity() {
        let (evaluator, ledger, key) = fixture();
        let outcome = evaluator
            .evaluate(&Measurement::new(key, 112.0))
            .unwrap();

        let Evaluation::Breached {
            disposition,
            severity,
            ..
        } = outcome
        else {
            panic!("expected a breach");
        };
        assert_eq!(severity, Severity::Warning);
        assert_eq!(
            ledger.get(disposition.breach_id()).unwrap().severity,
            Severity::Breach
        );
    }

    #[test]
    fn negative_variance_breaches_too() {
        let (evaluator, _, key) = fixture();
        let outcome = evaluator.evaluate(&Measurement::new(key, 75.0)).unwrap();
        assert!(matches!(
            outcome,
            Evaluation::Breached {
                severity: Severity::Critical,
                variance,
                ..
            } if variance == -25.0
        ));
    }

    #[test]
    fn within_appetite_never_auto_resolves() {
        let (evaluator, ledger, key) = fixture();

        let breached = evaluator
            .evaluate(&Measurement::new(key.clone(), 125.0))
            .unwrap();
        let Evaluation::Breached { disposition, .. } = breached else {
            panic!("expected a breach");
        };

        // A single in-appetite reading must not flap the record closed.
        let calm = evaluator.evaluate(&Measurement::new(key, 101.0)).unwrap();
        assert!(matches!(calm, Evaluation::WithinAppetite { .. }));
        assert_eq!(
            ledger.get(disposition.breach_id()).unwrap().resolution_status,
            ResolutionStatus::Open
        );
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn missing_threshold_is_a_counted_gap() {
        let (evaluator, ledger, key) = fixture();
        let unconfigured = MetricKey::new(key.category_id, "not-configured");

        let outcome = evaluator
            .evaluate(&Measurement::new(unconfigured, 999.0))
            .unwrap();
        assert_eq!(outcome, Evaluation::SkippedMissingThreshold);
        assert_eq!(evaluator.configuration_gaps(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn repeat_breach_updates_not_duplicates() {
        let (evaluator, ledger, key) = fixture();

        let first = evaluator
            .evaluate(&Measurement::new(key.clone(), 125.0))
            .unwrap();
        let Evaluation::Breached { disposition: BreachDisposition::Opened(id), .. } = first else {
            panic!("expected a new record");
        };

        let second = evaluator
            .evaluate(&Measurement::new(key, 115.0))
            .unwrap();
        let Evaluation::Breached {
            disposition: BreachDisposition::Updated(updated),
            severity,
            ..
        } = second
        else {
            panic!("expected an update");
        };
        assert_eq!(updated, id);
        assert_eq!(severity, Severity::Warning);

        let record = ledger.get(id).unwrap();
        assert_eq!(record.severity, Severity::Breach);
        assert_eq!(record.variance_percentage, 15.0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn classification_band_edges() {
        let def = ThresholdDefinition::new(100.0, MeasurementFrequency::Daily, "risk-mart")
            .with_bands(10.0, 20.0);
        assert_eq!(classify(9.9, &def), None);
        assert_eq!(classify(10.0, &def), Some(Severity::Warning));
        assert_eq!(classify(-19.9, &def), Some(Severity::Warning));
        assert_eq!(classify(20.0, &def), Some(Severity::Critical));
        assert_eq!(classify(-25.0, &def), Some(Severity::Critical));
    }
}
