// Runtime configuration handed over from the page (as a JS object) or as JSON.
// Every field has a default so partial objects are accepted.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const DEFAULT_CACHE_STORAGE_KEY: &str = "translation_cache";
pub const GOOGLE_FREE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INTERVAL_MS: u32 = 3000;
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 5000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatorConfig {
    /// Language the UI strings are authored in.
    pub source_lang: String,
    /// Initial target language, unless a persisted choice exists.
    pub target_lang: String,
    pub endpoint: String,
    /// Key the serialized cache map is stored under.
    pub storage_key: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_SOURCE_LANG.to_string(),
            endpoint: GOOGLE_FREE_ENDPOINT.to_string(),
            storage_key: DEFAULT_CACHE_STORAGE_KEY.to_string(),
        }
    }
}

impl TranslatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("sourceLang", &self.source_lang)?;
        non_empty("targetLang", &self.target_lang)?;
        non_empty("storageKey", &self.storage_key)?;
        parse_url("endpoint", &self.endpoint)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveConfig {
    pub url: String,
    /// Reconnect budget; zero disables automatic reconnection.
    pub max_attempts: u32,
    /// Fixed delay between reconnect attempts.
    pub interval_ms: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl LiveConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("url", &self.url)?;
        if self.interval_ms == 0 {
            return Err(ConfigError::Zero("intervalMs"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollerConfig {
    pub url: String,
    pub poll_interval_ms: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("url", &self.url)?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("pollIntervalMs"));
        }
        Ok(())
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Empty(field))
    } else {
        Ok(())
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    non_empty(field, value)?;
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        url: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_defaults() {
        let config: TranslatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TranslatorConfig::default());
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.storage_key, "translation_cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_translator_partial_camel_case() {
        let config: TranslatorConfig =
            serde_json::from_str(r#"{"targetLang": "fr", "storageKey": "tx"}"#).unwrap();
        assert_eq!(config.target_lang, "fr");
        assert_eq!(config.storage_key, "tx");
        assert_eq!(config.endpoint, GOOGLE_FREE_ENDPOINT);
    }

    #[test]
    fn test_translator_rejects_blank_language() {
        let config = TranslatorConfig {
            target_lang: "  ".to_string(),
            ..TranslatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Empty("targetLang"))));
    }

    #[test]
    fn test_live_defaults_and_validation() {
        let config: LiveConfig = serde_json::from_str(r#"{"url": "wss://example.test/live"}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.interval_ms, 3000);
        assert!(config.validate().is_ok());

        assert!(matches!(LiveConfig::default().validate(), Err(ConfigError::Empty("url"))));
        assert!(matches!(
            LiveConfig::new("not a url").validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let zero = LiveConfig {
            interval_ms: 0,
            ..LiveConfig::new("ws://localhost:8080")
        };
        assert!(matches!(zero.validate(), Err(ConfigError::Zero("intervalMs"))));
    }

    #[test]
    fn test_live_zero_attempts_is_allowed() {
        let config = LiveConfig {
            max_attempts: 0,
            ..LiveConfig::new("ws://localhost:8080")
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poller_validation() {
        let config = PollerConfig::new("https://api.example.test/buses/locations");
        assert_eq!(config.poll_interval_ms, 5000);
        assert!(config.validate().is_ok());

        let zero = PollerConfig {
            poll_interval_ms: 0,
            ..config
        };
        assert!(matches!(zero.validate(), Err(ConfigError::Zero("pollIntervalMs"))));
    }
}
