use serde::{Deserialize, Serialize};

use super::logging::Config as LoggingConfig;
use super::scheduler::Config as SchedulerConfig;
use super::serial::Config as SerialConfig;
use super::types::Protocol;

/// Top-level configuration for a Modbus client: everything needed to open a
/// link and run the scheduler against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub protocol: Protocol,
    pub serial: SerialConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            serial: SerialConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        self.serial.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = Config::default();
        let raw = config.to_json_pretty().expect("serialize");
        let parsed = Config::from_json_str(&raw).expect("deserialize");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
