use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable behavior for the planner core.
///
/// Every field has a sensible default, so configuration files only need to
/// name the values they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Servings given to a component created through the normal add form.
    pub default_servings: u32,
    /// Servings given to a component created through quick-add.
    pub quick_add_servings: u32,
    /// Servings added to an existing component when a template restocks it.
    pub restock_servings: u32,
    /// Servings given to a component newly created by a template import.
    pub seed_servings: u32,
    pub sync: SyncConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_servings: 1,
            quick_add_servings: 3,
            restock_servings: 3,
            seed_servings: 3,
            sync: SyncConfig::default(),
        }
    }
}

/// Cadence and failure limits for the background save loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period after a mutation before a save is attempted, so bursts
    /// of edits collapse into one write.
    pub debounce_ms: u64,
    /// Delay between retries after a failed save.
    pub retry_delay_ms: u64,
    /// Consecutive failures tolerated before the scheduler stalls and
    /// waits for the next mutation instead of retrying forever.
    pub max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 750,
            retry_delay_ms: 2_000,
            max_attempts: 5,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
