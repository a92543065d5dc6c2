//! Tunables for a [`crate::MideaAcSession`]'s scheduler, serialisable so an embedder
//! can load one with `toml` the way a higher-level CLI/service wrapper would.
//!
//! This crate never opens a config file itself; owning persistence is a
//! higher-level concern left to the embedder.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum spacing between the end of one request and the start of the
    /// next.
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// How long to wait for a response before retrying or failing.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Total send attempts per request, including the first.
    pub num_attempts: u32,
    /// Whether the appliance should beep on an accepted command.
    pub beeper: bool,
    /// Whether Wi-Fi autoconfiguration should be requested on connect.
    pub autoconf: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1000),
            timeout: Duration::from_millis(2000),
            num_attempts: 3,
            beeper: true,
            autoconf: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_tunables() {
        let config = SchedulerConfig::default();
        assert_eq!(config.period, Duration::from_millis(1000));
        assert_eq!(config.timeout, Duration::from_millis(2000));
        assert_eq!(config.num_attempts, 3);
        assert!(config.beeper);
        assert!(!config.autoconf);
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = SchedulerConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let restored: SchedulerConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, restored);
    }
}
