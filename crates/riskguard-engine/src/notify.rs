//! Escalation notification seam
//!
//! The engine emits the target identity and message payload only;
//! delivery (email, paging, chat) belongs to the external notification
//! collaborator, which implements [`Notifier`].

use crate::types::{BreachId, EscalationLevel};
use async_trait::async_trait;
use riskguard_catalog::MetricKey;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Payload handed to the notification collaborator on escalation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationNotice {
    /// Escalated record
    pub breach_id: BreachId,
    /// Breaching metric
    pub metric: MetricKey,
    /// Level after the escalation
    pub level: EscalationLevel,
    /// Identity to deliver to
    pub target: String,
    /// Human-readable summary
    pub message: String,
}

/// Delivery collaborator for escalation notices
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice; delivery failures are the collaborator's
    /// concern and must not fail the escalation itself
    async fn notify(&self, notice: EscalationNotice);
}

/// Default notifier that records notices in the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: EscalationNotice) {
        info!(
            breach = %notice.breach_id,
            metric = %notice.metric,
            level = %notice.level,
            target = %notice.target,
            "escalation notice: {}",
            notice.message
        );
    }
}
