//! Engine tunables.
//!
//! Every field has a default, so a partial JSON object (or none at all) is a
//! valid configuration:
//!
//! ```json
//! { "debounce_ms": 50, "indent_width": 4 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after the last tree change before markup is re-rendered.
    pub debounce_ms: u64,

    /// Diagnostics starting within this many characters of a kept one are dropped.
    pub diagnostic_proximity: u32,

    /// Spaces per nesting level in rendered markup.
    pub indent_width: usize,

    /// Maximum element nesting the parser accepts.
    pub recursion_fuel: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 30,
            diagnostic_proximity: 12,
            indent_width: 2,
            recursion_fuel: 256,
        }
    }
}

impl EngineConfig {
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_diagnostic_proximity(mut self, proximity: u32) -> Self {
        self.diagnostic_proximity = proximity;
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_recursion_fuel(mut self, fuel: u32) -> Self {
        self.recursion_fuel = fuel;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recursion_fuel == 0 {
            return Err(Error::InvalidConfig(
                "recursion_fuel must be at least 1".to_string(),
            ));
        }
        if self.indent_width > 16 {
            return Err(Error::InvalidConfig(format!(
                "indent_width {} is larger than 16",
                self.indent_width
            )));
        }
        if self.debounce_ms > 10_000 {
            return Err(Error::InvalidConfig(format!(
                "debounce_ms {} is longer than 10s",
                self.debounce_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "indent_width": 4 }"#).unwrap();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.diagnostic_proximity, 12);
    }

    #[test]
    fn zero_fuel_is_rejected() {
        let err = EngineConfig::default()
            .with_recursion_fuel(0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: recursion_fuel must be at least 1"
        );
    }
}
