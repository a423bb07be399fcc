//! Configuration types for dualcall
//!
//! This module defines all configuration structures used throughout the crate.

use crate::error::{Error, Result};
use crate::mode::ApiMode;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable selecting the interaction mode
pub const MODE_ENV: &str = "DUALCALL_MODE";

/// Environment variable overriding the default page size
pub const PAGE_SIZE_ENV: &str = "DUALCALL_PAGE_SIZE";

/// API instance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interaction mode for every operation decorated by the instance
    #[serde(default)]
    pub mode: ApiMode,

    /// Page size used by [`Api::page`](crate::Api::page)
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl ApiConfig {
    /// Create a configuration for the given mode with defaults
    pub fn new(mode: ApiMode) -> Self {
        Self {
            mode,
            default_page_size: default_page_size(),
        }
    }

    /// Set the default page size
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Load configuration from environment variables
    ///
    /// - `DUALCALL_MODE`: `one-shot` (alias `promise`) or `subscription`
    ///   (alias `rxjs`); defaults to one-shot
    /// - `DUALCALL_PAGE_SIZE`: positive integer; defaults to 100
    pub fn from_env() -> Result<Self> {
        let mode = match env::var(MODE_ENV) {
            Ok(raw) => raw.parse()?,
            Err(_) => ApiMode::default(),
        };

        let default_page_size = match env::var(PAGE_SIZE_ENV) {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                Error::config(format!("{} must be a positive integer. Got: {}", PAGE_SIZE_ENV, raw))
            })?,
            Err(_) => default_page_size(),
        };

        let config = Self {
            mode,
            default_page_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::config("default_page_size must be > 0"));
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(ApiMode::default())
    }
}

/// Memory store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of past revisions kept per key for historic reads
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Capacity of the change feed shared by all watchers
    ///
    /// A watcher that falls further behind than this skips the missed
    /// changes (with a warning log) and resumes from the key's latest value.
    #[serde(default = "default_change_channel_capacity")]
    pub change_channel_capacity: usize,
}

impl StoreConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(Error::config("history_limit must be > 0"));
        }
        if self.change_channel_capacity == 0 {
            return Err(Error::config("change_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            change_channel_capacity: default_change_channel_capacity(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_history_limit() -> usize {
    64
}

fn default_change_channel_capacity() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ApiConfig::default().validate().is_ok());
        assert!(StoreConfig::default().validate().is_ok());
        assert_eq!(ApiConfig::default().mode, ApiMode::OneShot);
    }

    #[test]
    fn zero_values_are_rejected() {
        let api = ApiConfig::new(ApiMode::Subscription).with_default_page_size(0);
        assert!(matches!(api.validate(), Err(Error::Config(_))));

        let store = StoreConfig {
            history_limit: 0,
            ..StoreConfig::default()
        };
        assert!(store.validate().is_err());
    }

    #[test]
    fn from_env_reads_mode_and_page_size() {
        // The only test touching these variables, so every case lives here.
        unsafe {
            env::set_var(MODE_ENV, "rxjs");
            env::set_var(PAGE_SIZE_ENV, " 25 ");
        }
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.mode, ApiMode::Subscription);
        assert_eq!(config.default_page_size, 25);

        unsafe { env::set_var(PAGE_SIZE_ENV, "many") };
        assert!(matches!(ApiConfig::from_env(), Err(Error::Config(_))));

        unsafe { env::set_var(PAGE_SIZE_ENV, "0") };
        assert!(matches!(ApiConfig::from_env(), Err(Error::Config(_))));

        unsafe {
            env::set_var(MODE_ENV, "poll");
            env::remove_var(PAGE_SIZE_ENV);
        }
        assert!(matches!(ApiConfig::from_env(), Err(Error::Config(_))));

        unsafe { env::remove_var(MODE_ENV) };
        assert_eq!(ApiConfig::from_env().unwrap(), ApiConfig::default());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"mode":"rxjs"}"#).unwrap();
        assert_eq!(config.mode, ApiMode::Subscription);
        assert_eq!(config.default_page_size, 100);

        let store: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(store, StoreConfig::default());
    }
}
