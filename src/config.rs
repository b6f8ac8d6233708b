use std::path::Path;
use std::time::Duration;

use crate::capture::AcquirePolicy;
use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "/etc/etherlink.conf";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings for the etherlink tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface used when none is given on the command line
    pub interface: Option<String>,
    pub bpf_units: u32,
    pub acquire_attempts: u32,
    pub acquire_interval_ms: u64,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let policy = AcquirePolicy::default();
        Self {
            interface: None,
            bpf_units: policy.units,
            acquire_attempts: policy.attempts,
            acquire_interval_ms: policy.interval.as_millis() as u64,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load the config file named by `ETHERLINK_CONFIG` (or the default path),
    /// then apply `ETHERLINK_*` environment overrides. A missing file is not an
    /// error.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ETHERLINK_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::parse(&std::fs::read_to_string(&config_path)?)?
        } else {
            Self::default()
        };

        // Allow environment variable overrides
        if let Ok(val) = std::env::var("ETHERLINK_INTERFACE") {
            config.interface = Some(val);
        }
        if let Ok(val) = std::env::var("ETHERLINK_BPF_UNITS") {
            config.bpf_units = parse_number("ETHERLINK_BPF_UNITS", &val)?;
        }
        if let Ok(val) = std::env::var("ETHERLINK_ACQUIRE_ATTEMPTS") {
            config.acquire_attempts = parse_number("ETHERLINK_ACQUIRE_ATTEMPTS", &val)?;
        }
        if let Ok(val) = std::env::var("ETHERLINK_ACQUIRE_INTERVAL_MS") {
            config.acquire_interval_ms = parse_number("ETHERLINK_ACQUIRE_INTERVAL_MS", &val)?;
        }
        if let Ok(val) = std::env::var("ETHERLINK_LOG_LEVEL") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Parse `key = value` lines. Blank lines and `#` comments are skipped, as
    /// are unknown keys.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                match key {
                    "interface" => config.interface = Some(value.to_string()),
                    "bpf_units" => config.bpf_units = parse_number("bpf_units", value)?,
                    "acquire_attempts" => {
                        config.acquire_attempts = parse_number("acquire_attempts", value)?
                    }
                    "acquire_interval_ms" => {
                        config.acquire_interval_ms = parse_number("acquire_interval_ms", value)?
                    }
                    "log_level" => config.log_level = value.to_string(),
                    _ => {}
                }
            }
        }

        Ok(config)
    }

    pub fn acquire_policy(&self) -> AcquirePolicy {
        AcquirePolicy {
            units: self.bpf_units,
            attempts: self.acquire_attempts,
            interval: Duration::from_millis(self.acquire_interval_ms),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
