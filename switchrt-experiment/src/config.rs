use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchrt_core::SessionKind;

use crate::error::ConfigError;

/// How timed-out trials enter the mean reaction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Back-filled timeouts count at the full interval.
    #[default]
    Include,
    /// Only trials that received a key are averaged.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub short_iterations: usize,
    pub long_iterations: usize,
    pub trial_interval_ms: u64,
    pub countdown_ticks: u32,
    pub countdown_tick_ms: u64,
    pub timeout_policy: TimeoutPolicy,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            short_iterations: SessionKind::Short.default_iterations(),
            long_iterations: SessionKind::Long.default_iterations(),
            trial_interval_ms: 1500,
            countdown_ticks: 4,
            countdown_tick_ms: 1000,
            timeout_policy: TimeoutPolicy::Include,
        }
    }
}

/// Longest interval whose nanosecond count still fits the clock's `u64`.
pub const MAX_INTERVAL_MS: u64 = u64::MAX / 1_000_000;

impl ExperimentConfig {
    pub fn iterations_for(&self, kind: SessionKind) -> usize {
        match kind {
            SessionKind::Short => self.short_iterations,
            SessionKind::Long => self.long_iterations,
        }
    }

    pub fn trial_interval(&self) -> Duration {
        Duration::from_millis(self.trial_interval_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    /// Parses a JSON document; omitted fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("short_iterations", self.short_iterations as u64),
            ("long_iterations", self.long_iterations as u64),
            ("trial_interval_ms", self.trial_interval_ms),
            ("countdown_tick_ms", self.countdown_tick_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        let intervals = [
            ("trial_interval_ms", self.trial_interval_ms),
            ("countdown_tick_ms", self.countdown_tick_ms),
        ];
        for (field, value) in intervals {
            if value > MAX_INTERVAL_MS {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be at most {MAX_INTERVAL_MS} ms"),
                });
            }
        }
        if self.countdown_ticks > u32::from(u8::MAX) {
            return Err(ConfigError::Invalid {
                field: "countdown_ticks",
                reason: format!("at most {} ticks can be displayed", u8::MAX),
            });
        }
        Ok(())
    }
}
