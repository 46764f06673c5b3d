//! Engine configuration

use crate::types::EscalationLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identities escalations are addressed to, per level
///
/// The engine only emits these targets; resolving them to real people and
/// delivering notifications belongs to the identity/notification
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRoute {
    /// Level 1 target
    pub management: String,
    /// Level 2 target
    pub senior_management: String,
    /// Level 3 target
    pub board: String,
}

impl EscalationRoute {
    /// Target identity for a level; level 0 has no target
    #[must_use]
    pub fn target(&self, level: EscalationLevel) -> Option<&str> {
        match level.as_u8() {
            1 => Some(&self.management),
            2 => Some(&self.senior_management),
            3 => Some(&self.board),
            _ => None,
        }
    }
}

impl Default for EscalationRoute {
    fn default() -> Self {
        Self {
            management: "management".to_string(),
            senior_management: "senior-management".to_string(),
            board: "board".to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheduler sweep cadence in seconds
    pub sweep_interval_secs: u64,
    /// Time an unactioned critical breach may sit before auto-escalation,
    /// in seconds
    pub sla_budget_secs: u64,
    /// Escalation target per level
    pub escalation_route: EscalationRoute,
    /// Capacity of the breach event broadcast channel
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With sweep interval
    #[inline]
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_secs = interval.as_secs();
        self
    }

    /// With SLA budget
    #[inline]
    #[must_use]
    pub fn with_sla_budget(mut self, budget: Duration) -> Self {
        self.sla_budget_secs = budget.as_secs();
        self
    }

    /// With escalation route
    #[inline]
    #[must_use]
    pub fn with_escalation_route(mut self, route: EscalationRoute) -> Self {
        self.escalation_route = route;
        self
    }

    /// Sweep interval as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// SLA budget as a [`chrono::Duration`] for timestamp arithmetic
    #[inline]
    #[must_use]
    pub fn sla_budget(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.sla_budget_secs as i64)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Hourly sweep, four-hour SLA for unactioned critical breaches
            sweep_interval_secs: 3_600,
            sla_budget_secs: 4 * 3_600,
            escalation_route: EscalationRoute::default(),
            event_channel_capacity: 256,
        }
    }
}
