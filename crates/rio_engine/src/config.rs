//! Engine configuration

use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target tick rate
    pub target_fps: u32,
    /// Upper bound on commands drained in one tick; the rest wait
    pub max_commands_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_commands_per_tick: 256,
        }
    }
}

impl EngineConfig {
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    /// Tick interval in milliseconds
    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }
}
