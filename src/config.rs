//! YAML configuration for the whole intent pipeline.
//!
//! Every section is optional and falls back to its defaults, so a file only
//! needs the values it changes.
//!
//! ```yaml
//! version: "1.0"
//! name: "tienda-quito"
//!
//! embedding:
//!   provider_enabled: true
//!   base_url: "http://127.0.0.1:11434/api"
//!   model: "nomic-embed-text"
//!
//! matcher:
//!   confidence_threshold: 0.6
//!   top_k: 3
//!
//! bonus:
//!   price: 0.08
//!   navigation_params: 0.09
//!
//! dispatch:
//!   enabled: true
//!   model: "phi3:instruct"
//!   max_concurrency: 3
//!   readiness_timeout_ms: 30000
//!   retry:
//!     max_attempts: 3
//!     base_delay_ms: 2000
//!
//! fallback: allow_keywords
//! corpus_path: "corpus.yaml"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use dispatch::{DispatchConfig, FallbackPolicy};
use embedding::EmbeddingConfig;
use matcher::MatcherConfig;
use rules::BonusWeights;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentGateConfig {
    pub version: String,
    pub name: Option<String>,
    pub embedding: EmbeddingConfig,
    pub matcher: MatcherConfig,
    pub bonus: BonusWeights,
    pub dispatch: DispatchConfig,
    /// Default fallback policy for `classify` calls that do not pass one.
    pub fallback: FallbackPolicy,
    /// JSON or YAML exemplar file; the built-in corpus when absent.
    pub corpus_path: Option<PathBuf>,
}

impl Default for IntentGateConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            embedding: EmbeddingConfig::default(),
            matcher: MatcherConfig::default(),
            bonus: BonusWeights::default(),
            dispatch: DispatchConfig::default(),
            fallback: FallbackPolicy::default(),
            corpus_path: None,
        }
    }
}

impl IntentGateConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        // A relative corpus path is taken relative to the config file.
        if let (Some(corpus), Some(dir)) = (&config.corpus_path, path.parent()) {
            if corpus.is_relative() {
                config.corpus_path = Some(dir.join(corpus));
            }
        }
        Ok(config)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: IntentGateConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.embedding.base_url.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "embedding.base_url must not be empty".into(),
            ));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "embedding.timeout_secs must be >= 1".into(),
            ));
        }
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.dispatch
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        validate_weights(&self.bonus)?;

        Ok(())
    }
}

fn validate_weights(weights: &BonusWeights) -> Result<(), ConfigLoadError> {
    let all = [
        ("price", weights.price),
        ("price_bulk_to_bulk", weights.price_bulk_to_bulk),
        ("price_bulk_from_price", weights.price_bulk_from_price),
        ("bulk", weights.bulk),
        ("comparison", weights.comparison),
        ("comparison_over_planning", weights.comparison_over_planning),
        ("planning", weights.planning),
        ("planning_over_product", weights.planning_over_product),
        ("navigation", weights.navigation),
        ("navigation_params", weights.navigation_params),
        (
            "navigation_params_from_navigation",
            weights.navigation_params_from_navigation,
        ),
    ];
    for (name, value) in all {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigLoadError::Validation(format!(
                "bonus.{name} must be within [0, 1], got {value}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_uses_defaults() {
        let config = IntentGateConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(config, IntentGateConfig::default());
    }

    #[test]
    fn sections_override_only_what_they_name() {
        let yaml = r#"
version: "1.0"
name: "staging"
matcher:
  top_k: 5
bonus:
  price: 0.1
dispatch:
  model: "llama3"
  request_timeout_ms: 5000
  retry:
    max_attempts: 4
fallback: disabled
"#;
        let config = IntentGateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("staging"));
        assert_eq!(config.matcher.top_k, 5);
        assert_eq!(config.matcher.confidence_threshold, 0.6);
        assert_eq!(config.bonus.price, 0.1);
        assert_eq!(config.bonus.bulk, 0.07);
        assert_eq!(config.dispatch.model, "llama3");
        assert_eq!(config.dispatch.request_timeout, Duration::from_secs(5));
        assert_eq!(config.dispatch.retry.max_attempts, 4);
        assert_eq!(config.dispatch.retry.base_delay, Duration::from_millis(2000));
        assert_eq!(config.fallback, FallbackPolicy::Disabled);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = IntentGateConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let yaml = "version: \"1.0\"\ndispatch:\n  max_concurrency: 0\n";
        let err = IntentGateConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("max_concurrency"));
    }

    #[test]
    fn out_of_range_bonus_fails_validation() {
        let yaml = "version: \"1.0\"\nbonus:\n  navigation: 1.5\n";
        let err = IntentGateConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("bonus.navigation"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = IntentGateConfig::from_yaml("matcher: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
    }

    #[test]
    fn corpus_path_resolves_next_to_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"version: \"1.0\"\ncorpus_path: exemplars.yaml\n")
            .unwrap();

        let config = IntentGateConfig::from_file(file.path()).unwrap();
        let expected = file.path().parent().unwrap().join("exemplars.yaml");
        assert_eq!(config.corpus_path, Some(expected));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = IntentGateConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }
}
