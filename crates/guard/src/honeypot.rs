use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A honeypot trips on any non-empty value, whitespace included.
pub fn honeypot_triggered(value: &str) -> bool {
    !value.is_empty()
}

/// Random pause applied before answering a tripped honeypot so its response
/// time resembles a submission that went through verification and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camouflage {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Camouflage {
    fn default() -> Self {
        Self {
            min_delay_ms: 150,
            max_delay_ms: 450,
        }
    }
}

impl Camouflage {
    pub fn none() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn pick_delay(&self) -> Duration {
        let (lo, hi) = if self.min_delay_ms <= self.max_delay_ms {
            (self.min_delay_ms, self.max_delay_ms)
        } else {
            (self.max_delay_ms, self.min_delay_ms)
        };
        Duration::from_millis(fastrand::u64(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.pick_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
