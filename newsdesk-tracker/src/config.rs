//! Tracker configuration
//!
//! Defines the polling cadence used to follow fetch jobs to completion.

use std::time::Duration;

/// Default wait between two ticks of a polling session
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of ticks before a session gives up
pub const DEFAULT_MAX_TICKS: u32 = 30;

/// Tracker configuration
///
/// `poll_interval * max_ticks` is the worst-case time a fetch job can take
/// before its session times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Wait between two ticks of a session
    pub poll_interval: Duration,

    /// Maximum number of ticks per session
    pub max_ticks: u32,
}

impl TrackerConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables:
    /// - NEWSDESK_POLL_INTERVAL (optional, seconds, default: 2)
    /// - NEWSDESK_POLL_MAX_TICKS (optional, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();

        if let Ok(raw) = std::env::var("NEWSDESK_POLL_INTERVAL") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("NEWSDESK_POLL_INTERVAL must be a whole number of seconds")
            })?;
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("NEWSDESK_POLL_MAX_TICKS") {
            config.max_ticks = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow::anyhow!("NEWSDESK_POLL_MAX_TICKS must be a positive integer"))?;
        }

        Ok(config)
    }

    /// Overrides the poll interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Overrides the tick budget
    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Worst-case time a session keeps polling
    ///
    /// Saturates at `Duration::MAX`; `validate` rejects such configurations.
    pub fn timeout_budget(&self) -> Duration {
        self.poll_interval
            .checked_mul(self.max_ticks)
            .unwrap_or(Duration::MAX)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_ticks == 0 {
            anyhow::bail!("max_ticks must be greater than 0");
        }

        if self.poll_interval.checked_mul(self.max_ticks).is_none() {
            anyhow::bail!("poll_interval * max_ticks overflows");
        }

        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}
