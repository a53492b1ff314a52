//! Tuning knobs for the fleet controller

use super::types::{
    DEFAULT_AGENT_SPEED, DEFAULT_ROUTE_RETRIES, DEFAULT_TICK_RATE_HZ, NO_PATH_WAIT_SECS,
};

/// Fleet-wide simulation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FleetConfig {
    /// Distance each agent covers per tick
    pub agent_speed: f64,
    /// Ticks an agent waits when its destination is unreachable
    pub no_path_wait_ticks: u32,
    /// Re-routing attempts after a wait before the agent gives up
    pub route_retries: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self::with_tick_rate(DEFAULT_TICK_RATE_HZ)
    }
}

impl FleetConfig {
    /// Build a config whose wait duration matches `tick_rate_hz` ticks per
    /// simulated second
    pub fn with_tick_rate(tick_rate_hz: u32) -> Self {
        Self {
            agent_speed: DEFAULT_AGENT_SPEED,
            no_path_wait_ticks: (NO_PATH_WAIT_SECS * tick_rate_hz as f64).round() as u32,
            route_retries: DEFAULT_ROUTE_RETRIES,
        }
    }

    pub fn agent_speed(mut self, speed: f64) -> Self {
        self.agent_speed = speed;
        self
    }

    pub fn no_path_wait_ticks(mut self, ticks: u32) -> Self {
        self.no_path_wait_ticks = ticks;
        self
    }

    pub fn route_retries(mut self, retries: u32) -> Self {
        self.route_retries = retries;
        self
    }
}
