use crate::error::{config_error, env_error, PlannerResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;

/// Default interval between reminder refreshes, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default HTTP request timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default first day of the week (0 = Sunday, 1 = Monday)
pub const DEFAULT_WEEK_START_DAY: u32 = 1;

const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the planner client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote planner API
    pub api_url: String,
    /// Redis URL backing the local string store; in-memory store when unset
    pub redis_url: Option<String>,
    /// Prefix prepended to every store key
    pub store_key_prefix: String,
    /// Seconds between reminder refreshes
    pub reminder_poll_interval_secs: u64,
    /// Seconds before an API request is abandoned
    pub request_timeout_secs: u64,
    /// First day of the week for generated week dates
    pub week_start_day: u32,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> PlannerResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let api_url = env::var("API_URL").map_err(|_| env_error("API_URL"))?;
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let store_key_prefix =
            env::var("STORE_KEY_PREFIX").unwrap_or_else(|_| String::from("lukkari:"));

        let reminder_poll_interval_secs =
            parse_env_or("REMINDER_POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS)?;
        let request_timeout_secs = parse_env_or("REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let week_start_day = parse_env_or("WEEK_START_DAY", DEFAULT_WEEK_START_DAY)?;

        let mut components = HashMap::new();
        components.insert("reminders".to_string(), true);

        // Merge component toggles from file over the defaults
        if let Ok(content) = fs::read_to_string(COMPONENTS_FILE) {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            components.extend(file_components);
        }

        let config = Config {
            api_url,
            redis_url,
            store_key_prefix,
            reminder_poll_interval_secs,
            request_timeout_secs,
            week_start_day,
            components,
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject values that would make the client misbehave at runtime
    pub fn validate(&self) -> PlannerResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(config_error("API_URL must not be empty"));
        }
        if url::Url::parse(&self.api_url).is_err() {
            return Err(config_error(&format!(
                "API_URL is not a valid URL: {}",
                self.api_url
            )));
        }
        if self.reminder_poll_interval_secs == 0 {
            return Err(config_error("REMINDER_POLL_INTERVAL must be at least 1"));
        }
        if self.week_start_day > 6 {
            return Err(config_error("WEEK_START_DAY must be between 0 and 6"));
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> PlannerResult<T> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format: {}", var, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            api_url: "http://localhost:5000/api".to_string(),
            redis_url: None,
            store_key_prefix: "test:".to_string(),
            reminder_poll_interval_secs: 60,
            request_timeout_secs: 30,
            week_start_day: 1,
            components: HashMap::from([("reminders".to_string(), true)]),
        }
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut config = sample();
        config.api_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(crate::error::Error::Config(_))));

        let mut config = sample();
        config.reminder_poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.week_start_day = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_component_enabled() {
        let config = sample();
        assert!(config.is_component_enabled("reminders"));
        assert!(!config.is_component_enabled("unknown"));
    }
}
