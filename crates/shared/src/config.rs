//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Exchange-rate source configuration.
    #[serde(default)]
    pub rates: RateSourceConfig,
    /// Escalation configuration.
    #[serde(default)]
    pub escalation: EscalationConfig,
}

/// Exchange-rate source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateSourceConfig {
    /// Base URL of the rate source; the base currency code is appended.
    #[serde(default = "default_rates_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (single attempt, no retries).
    #[serde(default = "default_rates_timeout")]
    pub timeout_secs: u64,
}

fn default_rates_base_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

fn default_rates_timeout() -> u64 {
    10
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_rates_base_url(),
            timeout_secs: default_rates_timeout(),
        }
    }
}

/// Escalation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EscalationConfig {
    /// Hours an expense may sit unactioned before it escalates to admin.
    #[serde(default = "default_escalation_window")]
    pub window_hours: i64,
}

fn default_escalation_window() -> i64 {
    48
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            window_hours: default_escalation_window(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("OUTLAY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rates.timeout_secs, 10);
        assert_eq!(config.escalation.window_hours, 48);
        assert!(config.rates.base_url.starts_with("https://"));
    }

    #[test]
    fn test_deserialize_partial_overrides() {
        let config: AppConfig =
            serde_json::from_str(r#"{"escalation": {"window_hours": 24}}"#).unwrap();
        assert_eq!(config.escalation.window_hours, 24);
        assert_eq!(config.rates.timeout_secs, 10);
    }
}
