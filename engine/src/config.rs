//! Engine configuration.

use std::time::Duration;

use banksim_common::{BankError, Result};

/// Configuration for the transfer pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of executor workers. Any size >= 1 is correct; the size
    /// only affects throughput.
    pub executors: usize,
    /// Fixed backoff slept by the manager when an account is contested.
    pub retry_backoff: Duration,
    /// Capacity of the intake and ready queues. Sized to the expected
    /// transfer volume so the manager never blocks on a full ready
    /// queue while holding locks.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executors: 6,
            retry_backoff: Duration::from_millis(10),
            queue_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(executors) = std::env::var("BANKSIM_EXECUTORS") {
            if let Ok(executors) = executors.parse() {
                config.executors = executors;
            }
        }

        if let Ok(backoff_ms) = std::env::var("BANKSIM_BACKOFF_MS") {
            if let Ok(backoff_ms) = backoff_ms.parse() {
                config.retry_backoff = Duration::from_millis(backoff_ms);
            }
        }

        if let Ok(capacity) = std::env::var("BANKSIM_QUEUE_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.queue_capacity = capacity;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.executors == 0 {
            return Err(BankError::ConfigError(
                "executor pool size cannot be 0".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(BankError::ConfigError(
                "queue capacity cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    // One test touches the process environment; keeping it a single
    // test avoids races between parallel test threads.
    #[test]
    fn test_from_env_overrides_defaults() {
        std::env::set_var("BANKSIM_EXECUTORS", "3");
        std::env::set_var("BANKSIM_BACKOFF_MS", "5");
        std::env::set_var("BANKSIM_QUEUE_CAPACITY", "99");

        let config = EngineConfig::from_env();
        assert_eq!(config.executors, 3);
        assert_eq!(config.retry_backoff, Duration::from_millis(5));
        assert_eq!(config.queue_capacity, 99);

        // Unparseable values fall back to the default.
        std::env::set_var("BANKSIM_EXECUTORS", "lots");
        let config = EngineConfig::from_env();
        assert_eq!(config.executors, EngineConfig::default().executors);

        std::env::remove_var("BANKSIM_EXECUTORS");
        std::env::remove_var("BANKSIM_BACKOFF_MS");
        std::env::remove_var("BANKSIM_QUEUE_CAPACITY");

        let config = EngineConfig::from_env();
        assert_eq!(config.queue_capacity, EngineConfig::default().queue_capacity);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.executors = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.queue_capacity = 0;
        assert!(config.validate().is_err());
    }
}
