//! Runtime configuration for the background context.
//!
//! API keys come from the environment or a JSON document, never from code.

use serde::Deserialize;
use url::Url;

use crate::fetch::FetchSettings;
use crate::types::GifSource;

pub const GIPHY_BASE_URL: &str = "https://api.giphy.com/v1/gifs/";
pub const TENOR_BASE_URL: &str = "https://api.tenor.com/v1/";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no API key configured for {0}")]
    MissingApiKey(GifSource),
    #[error("invalid base url for {provider}: {message}")]
    InvalidBaseUrl { provider: GifSource, message: String },
    #[error("malformed config document: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Endpoint names are resolved against this; always ends in `/`.
    pub base_url: Url,
    pub api_key: String,
}

impl ProviderConfig {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub giphy: ProviderConfig,
    pub tenor: ProviderConfig,
    pub fetch: FetchSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProvider {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    giphy: RawProvider,
    #[serde(default)]
    tenor: RawProvider,
}

impl BridgeConfig {
    /// Reads `DECK_GIPHY_API_KEY`, `DECK_TENOR_API_KEY` and the optional
    /// `DECK_GIPHY_BASE_URL` / `DECK_TENOR_BASE_URL` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = RawConfig {
            giphy: RawProvider {
                api_key: lookup("DECK_GIPHY_API_KEY"),
                base_url: lookup("DECK_GIPHY_BASE_URL"),
            },
            tenor: RawProvider {
                api_key: lookup("DECK_TENOR_API_KEY"),
                base_url: lookup("DECK_TENOR_BASE_URL"),
            },
        };
        Self::resolve(raw)
    }

    /// Parses `{"giphy": {"apiKey": ..., "baseUrl": ...}, "tenor": {...}}`.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|err| ConfigError::Malformed(err.to_string()))?;
        Self::resolve(raw)
    }

    pub fn provider(&self, source: GifSource) -> &ProviderConfig {
        match source {
            GifSource::Giphy => &self.giphy,
            GifSource::Tenor => &self.tenor,
        }
    }

    fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            giphy: resolve_provider(GifSource::Giphy, raw.giphy, GIPHY_BASE_URL)?,
            tenor: resolve_provider(GifSource::Tenor, raw.tenor, TENOR_BASE_URL)?,
            fetch: FetchSettings::default(),
        })
    }
}

fn resolve_provider(
    source: GifSource,
    raw: RawProvider,
    default_base: &str,
) -> Result<ProviderConfig, ConfigError> {
    let api_key = raw
        .api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey(source))?;
    let base = raw.base_url.as_deref().unwrap_or(default_base);
    ProviderConfig::new(base, api_key).map_err(|err| ConfigError::InvalidBaseUrl {
        provider: source,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_uses_default_endpoints() {
        let env: HashMap<&str, &str> = [
            ("DECK_GIPHY_API_KEY", "g-key"),
            ("DECK_TENOR_API_KEY", "t-key"),
        ]
        .into_iter()
        .collect();
        let config = BridgeConfig::from_lookup(|name| env.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.giphy.base_url.as_str(), GIPHY_BASE_URL);
        assert_eq!(config.tenor.base_url.as_str(), TENOR_BASE_URL);
        assert_eq!(config.provider(GifSource::Tenor).api_key, "t-key");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = BridgeConfig::from_json_str(r#"{"giphy": {"apiKey": "g"}}"#).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey(GifSource::Tenor));

        let err = BridgeConfig::from_json_str(r#"{"giphy": {"apiKey": " "}, "tenor": {"apiKey": "t"}}"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey(GifSource::Giphy));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = BridgeConfig::from_json_str(
            r#"{"giphy": {"apiKey": "g", "baseUrl": "http://127.0.0.1:9000/gifs"},
                "tenor": {"apiKey": "t"}}"#,
        )
        .unwrap();
        assert_eq!(config.giphy.base_url.as_str(), "http://127.0.0.1:9000/gifs/");
    }

    #[test]
    fn malformed_document_is_reported() {
        assert!(matches!(
            BridgeConfig::from_json_str("not json"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{"giphy": {"apiKey": "g", "baseUrl": "::"}, "tenor": {"apiKey": "t"}}"#),
            Err(ConfigError::InvalidBaseUrl { provider: GifSource::Giphy, .. })
        ));
    }
}
