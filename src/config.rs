//! Extractor configuration
//!
//! Loaded from TOML. Every key is optional; missing keys take the defaults
//! below.

use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub const DEFAULT_RAW_HTML_LIMIT: usize = 50_000;
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 2_000;
pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Characters of the raw document kept on the record
    pub raw_html_limit: usize,
    /// Characters kept of the listing description
    pub description_limit: usize,
    /// Year-built values above `reference_year + 1` are rejected
    pub reference_year: i32,
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            raw_html_limit: DEFAULT_RAW_HTML_LIMIT,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            reference_year: chrono::Utc::now().year(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
            user_agent: format!("listing-extract/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_GEOCODER_TIMEOUT_SECS,
        }
    }
}

impl ExtractorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ExtractError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ExtractError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let source = std::fs::read_to_string(path).map_err(|e| ExtractError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source).map_err(|e| ExtractError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ExtractError> {
        if self.geocoder.timeout_secs == 0 {
            return Err(ExtractError::ConfigInvalid(
                "geocoder.timeout_secs must be at least 1".into(),
            ));
        }
        if self.geocoder.enabled {
            let endpoint = url::Url::parse(&self.geocoder.endpoint).map_err(|e| {
                ExtractError::ConfigInvalid(format!("geocoder.endpoint: {e}"))
            })?;
            if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
                return Err(ExtractError::ConfigInvalid(
                    "geocoder.endpoint must be an http(s) URL".into(),
                ));
            }
            if self.geocoder.user_agent.trim().is_empty() {
                return Err(ExtractError::ConfigInvalid(
                    "geocoder.user_agent must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ExtractorConfig::from_toml_str("").unwrap();
        assert_eq!(config.raw_html_limit, DEFAULT_RAW_HTML_LIMIT);
        assert_eq!(config.description_limit, DEFAULT_DESCRIPTION_LIMIT);
        assert!(!config.geocoder.enabled);
        assert_eq!(config.geocoder.timeout_secs, 10);
    }

    #[test]
    fn test_partial_toml() {
        let config = ExtractorConfig::from_toml_str(
            r#"
            raw_html_limit = 1000
            reference_year = 2024

            [geocoder]
            enabled = true
            endpoint = "http://localhost:8080"
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.raw_html_limit, 1000);
        assert_eq!(config.reference_year, 2024);
        assert!(config.geocoder.enabled);
        assert_eq!(config.geocoder.endpoint, "http://localhost:8080");
        assert_eq!(config.geocoder.timeout_secs, 3);
        assert!(config.geocoder.user_agent.starts_with("listing-extract/"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ExtractorConfig::from_toml_str("[geocoder]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, ExtractError::ConfigInvalid(_)));
    }

    #[test]
    fn test_rejects_bad_endpoint_when_enabled() {
        let err = ExtractorConfig::from_toml_str(
            "[geocoder]\nenabled = true\nendpoint = \"not a url\"",
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::ConfigInvalid(_)));
    }
}
