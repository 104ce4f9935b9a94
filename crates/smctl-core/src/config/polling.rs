//! Polling configuration for long-running operations
//!
//! Stored per profile; converted to a [`PollPolicy`] when a wait starts.

use crate::operation::PollPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `operation wait` polls for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between status requests
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Polls before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollingConfig {
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.interval_secs), self.max_attempts)
    }
}

// Default value functions for serde
fn default_interval_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    30
}
