//! Simulator configuration.
//!
//! Defaults match the reference behavior: every channel buffers up to ten
//! messages and a run waits for its processes without any bound. Both values
//! can be overridden from the environment.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

pub const CHANNEL_CAPACITY_VAR: &str = "LAMPORT_CHANNEL_CAPACITY";
pub const LIVENESS_TIMEOUT_VAR: &str = "LAMPORT_LIVENESS_TIMEOUT_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Messages each (sender, receiver) channel buffers before `send` waits.
    pub channel_capacity: NonZeroUsize,
    /// How long a run may take before unfinished processes are cancelled.
    ///
    /// `None` waits forever, so a receive with no matching send hangs the run.
    pub liveness_timeout: Option<Duration>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: NonZeroUsize::new(DEFAULT_CHANNEL_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            liveness_timeout: None,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `LAMPORT_CHANNEL_CAPACITY` -- per-pair channel capacity (default 10)
    /// - `LAMPORT_LIVENESS_TIMEOUT_MS` -- liveness bound in milliseconds (default none)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`SimulatorConfig::from_env`] with a custom variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(CHANNEL_CAPACITY_VAR) {
            let capacity: usize = value.trim().parse().map_err(|e| ConfigError::Invalid {
                key: CHANNEL_CAPACITY_VAR,
                value: value.clone(),
                reason: format!("{e}"),
            })?;
            config = config.with_channel_capacity(capacity)?;
        }

        if let Some(value) = lookup(LIVENESS_TIMEOUT_VAR) {
            let millis: u64 = value.trim().parse().map_err(|e| ConfigError::Invalid {
                key: LIVENESS_TIMEOUT_VAR,
                value: value.clone(),
                reason: format!("{e}"),
            })?;
            config = config.with_liveness_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        self.channel_capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity)?;
        Ok(self)
    }

    pub fn with_liveness_timeout(mut self, timeout: Duration) -> Self {
        self.liveness_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = SimulatorConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, SimulatorConfig::default());
        assert_eq!(config.channel_capacity.get(), 10);
        assert_eq!(config.liveness_timeout, None);
    }

    #[test]
    fn reads_overrides() {
        let config = SimulatorConfig::from_vars(vars(&[
            (CHANNEL_CAPACITY_VAR, "2"),
            (LIVENESS_TIMEOUT_VAR, " 250 "),
        ]))
        .unwrap();
        assert_eq!(config.channel_capacity.get(), 2);
        assert_eq!(config.liveness_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(
            SimulatorConfig::from_vars(vars(&[(CHANNEL_CAPACITY_VAR, "0")])),
            Err(ConfigError::ZeroCapacity)
        );
    }

    #[test]
    fn rejects_unparsable_values() {
        let err = SimulatorConfig::from_vars(vars(&[(LIVENESS_TIMEOUT_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: LIVENESS_TIMEOUT_VAR,
                ..
            }
        ));
    }
}
