//! Configuration for the charge lifecycle and the expiry sweeper

use crate::utils::{get_env_with_prefix, parse_env_with_prefix};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens when an already confirmed charge is confirmed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconfirmPolicy {
    /// Apply the new decision (a declined charge can still be accepted)
    #[default]
    Allow,
    /// Refuse with a conflict once the charge left `pending`
    Reject,
}

/// Charge defaults and lifecycle policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChargesConfig {
    #[serde(default)]
    pub reconfirm: ReconfirmPolicy,

    /// Capped amount used when a create request omits one
    #[serde(default = "default_capped_amount")]
    pub default_capped_amount: String,
}

impl Default for ChargesConfig {
    fn default() -> Self {
        Self {
            reconfirm: ReconfirmPolicy::default(),
            default_capped_amount: default_capped_amount(),
        }
    }
}

impl ChargesConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(policy) = get_env_with_prefix("RECONFIRM_POLICY") {
            config.reconfirm = match policy.to_lowercase().as_str() {
                "reject" => ReconfirmPolicy::Reject,
                "allow" => ReconfirmPolicy::Allow,
                other => {
                    tracing::warn!(policy = other, "Unknown reconfirm policy, using allow");
                    ReconfirmPolicy::Allow
                }
            };
        }

        if let Some(amount) = get_env_with_prefix("DEFAULT_CAPPED_AMOUNT") {
            config.default_capped_amount = amount;
        }

        config
    }
}

/// Upper bound for the sweeper interval and retention (100 years)
pub const MAX_SWEEPER_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Configuration for the expiry sweeper
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweeperConfig {
    #[serde(default = "default_sweeper_enabled")]
    pub enabled: bool,

    /// Seconds between two sweeps; the first sweep runs one interval after start
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Charges older than this many seconds are evicted
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweeper_enabled(),
            interval_seconds: default_interval_seconds(),
            retention_seconds: default_retention_seconds(),
        }
    }
}

impl SweeperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(enabled) = get_env_with_prefix("SWEEPER_ENABLED") {
            config.enabled = enabled.parse().unwrap_or(true);
        }
        if let Some(interval) = parse_env_with_prefix("SWEEPER_INTERVAL_SECONDS") {
            config.interval_seconds = interval;
        }
        if let Some(retention) = parse_env_with_prefix("SWEEPER_RETENTION_SECONDS") {
            config.retention_seconds = retention;
        }

        config
    }

    /// Values above [`MAX_SWEEPER_SECONDS`] are clamped.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.min(MAX_SWEEPER_SECONDS))
    }

    /// Values above [`MAX_SWEEPER_SECONDS`] are clamped.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_seconds.min(MAX_SWEEPER_SECONDS) as i64)
    }
}

fn default_capped_amount() -> String {
    "100".to_string()
}

fn default_sweeper_enabled() -> bool {
    true
}

fn default_interval_seconds() -> u64 {
    24 * 60 * 60
}

fn default_retention_seconds() -> u64 {
    24 * 60 * 60
}
