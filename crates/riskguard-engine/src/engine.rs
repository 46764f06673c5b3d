//! Engine facade
//!
//! [`RiskEngine`] wires the catalog, ledger, and evaluator together and
//! exposes the command surface collaborators call: evaluate, acknowledge,
//! escalate, resolve, query, subscribe.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::{BreachEvaluator, Evaluation};
use crate::events::{BreachEvent, EscalationTrigger};
use crate::ledger::{BreachLedger, EscalationOutcome};
use crate::notify::Notifier;
use crate::scheduler::EscalationScheduler;
use crate::types::{BreachId, BreachQuery, BreachRecord, Measurement};
use riskguard_catalog::{MetricKey, ThresholdCatalog, ThresholdDefinition};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// The assembled breach and escalation engine
pub struct RiskEngine {
    config: EngineConfig,
    catalog: Arc<ThresholdCatalog>,
    ledger: Arc<BreachLedger>,
    evaluator: BreachEvaluator,
}

impl RiskEngine {
    /// Assemble an engine over an externally-owned catalog
    #[must_use]
    pub fn new(config: EngineConfig, catalog: Arc<ThresholdCatalog>) -> Self {
        let ledger = Arc::new(BreachLedger::new(
            config.escalation_route.clone(),
            config.event_channel_capacity,
        ));
        let evaluator = BreachEvaluator::new(Arc::clone(&catalog), Arc::clone(&ledger));
        Self {
            config,
            catalog,
            ledger,
            evaluator,
        }
    }

    /// The read-only threshold catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<ThresholdCatalog> {
        &self.catalog
    }

    /// The breach ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<BreachLedger> {
        &self.ledger
    }

    /// Strict threshold lookup
    ///
    /// Unlike the evaluator, which skips unconfigured metrics, callers of
    /// the command surface get a hard error for a missing definition.
    ///
    /// # Errors
    /// [`EngineError::MissingThreshold`] when the metric has no definition.
    pub fn threshold(&self, metric: &MetricKey) -> Result<ThresholdDefinition, EngineError> {
        self.catalog
            .definition(metric)
            .ok_or_else(|| EngineError::MissingThreshold(metric.clone()))
    }

    /// Evaluate one measurement from the measurement source
    ///
    /// # Errors
    /// Ledger-internal failures only; see [`BreachEvaluator::evaluate`].
    pub fn evaluate(&self, measurement: &Measurement) -> Result<Evaluation, EngineError> {
        self.evaluator.evaluate(measurement)
    }

    /// Acknowledge a breach (command surface)
    ///
    /// # Errors
    /// See [`BreachLedger::acknowledge`].
    pub fn acknowledge(&self, breach_id: BreachId) -> Result<(), EngineError> {
        self.ledger.acknowledge(breach_id)
    }

    /// Manually escalate a breach (command surface)
    ///
    /// # Errors
    /// See [`BreachLedger::escalate`].
    pub fn escalate(&self, breach_id: BreachId) -> Result<EscalationOutcome, EngineError> {
        self.ledger.escalate(breach_id, EscalationTrigger::Manual)
    }

    /// Resolve a breach with closing notes (command surface)
    ///
    /// # Errors
    /// See [`BreachLedger::resolve`].
    pub fn resolve(&self, breach_id: BreachId, notes: impl Into<String>) -> Result<(), EngineError> {
        self.ledger.resolve(breach_id, notes)
    }

    /// Attach a business-impact note to a breach
    ///
    /// # Errors
    /// See [`BreachLedger::annotate_impact`].
    pub fn annotate_impact(
        &self,
        breach_id: BreachId,
        impact: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.ledger.annotate_impact(breach_id, impact)
    }

    /// Query surface for the audit/alert UI
    #[must_use]
    pub fn query(&self, query: &BreachQuery) -> Vec<BreachRecord> {
        self.ledger.query(query)
    }

    /// Fetch one record
    #[must_use]
    pub fn get(&self, breach_id: BreachId) -> Option<BreachRecord> {
        self.ledger.get(breach_id)
    }

    /// Subscribe to breach change events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BreachEvent> {
        self.ledger.subscribe()
    }

    /// Measurements skipped for lack of a threshold definition
    #[inline]
    #[must_use]
    pub fn configuration_gaps(&self) -> u64 {
        self.evaluator.configuration_gaps()
    }

    /// Build the escalation scheduler for this engine
    #[must_use]
    pub fn scheduler(&self) -> EscalationScheduler {
        EscalationScheduler::new(Arc::clone(&self.ledger), &self.config)
    }

    /// Build the scheduler with a custom notification collaborator
    #[must_use]
    pub fn scheduler_with_notifier(&self, notifier: Arc<dyn Notifier>) -> EscalationScheduler {
        self.scheduler().with_notifier(notifier)
    }

    /// Spawn the scheduler loop; flip the returned sender to `true` to
    /// stop it
    #[must_use]
    pub fn spawn_scheduler(&self) -> (watch::Sender<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(self.scheduler().run(rx));
        (tx, handle)
    }
}
