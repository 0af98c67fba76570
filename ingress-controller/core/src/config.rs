use crate::{Error, Result};

/// Engine configuration. Passed explicitly; there is no process-global configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    partition: String,
}

// === impl Config ===

impl Config {
    pub fn new(partition: impl Into<String>) -> Result<Self> {
        let partition = partition.into();
        if partition.trim().is_empty() {
            return Err(Error::InvalidConfig("partition must not be empty".to_string()));
        }
        Ok(Self { partition })
    }

    /// The ADC partition that scopes the current-state projection.
    #[inline]
    pub fn partition(&self) -> &str {
        &self.partition
    }
}
