use crate::error::{FormError, Result};
use crate::marks::DEFAULT_MAX_RANGE_MARKS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration, usually read from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Configuration for field synthesis and request compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Label shown on the date range control
    #[serde(default = "default_range_label")]
    pub range_label: String,

    /// Terms logic used when the toggle was never touched (true = AND)
    #[serde(default = "default_true")]
    pub default_terms_logic: bool,

    /// Ranges wider than this render the slider without marks
    #[serde(default = "default_max_range_marks")]
    pub max_range_marks: usize,
}

/// Configuration for the HTTP schema fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the portal backend, without the `/api` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_range_label() -> String {
    "Date range".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_range_marks() -> usize {
    DEFAULT_MAX_RANGE_MARKS
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            range_label: default_range_label(),
            default_terms_logic: true,
            max_range_marks: default_max_range_marks(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FormConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.range_label.trim().is_empty() {
            return Err("range_label must not be empty".to_string());
        }
        if self.max_range_marks == 0 {
            return Err("max_range_marks must be > 0".to_string());
        }
        Ok(())
    }
}

impl FetcherConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("base_url {:?} is not a valid URL: {e}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            ));
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PortalConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.form.validate().map_err(FormError::InvalidConfig)?;
        self.fetcher.validate().map_err(FormError::InvalidConfig)?;
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
