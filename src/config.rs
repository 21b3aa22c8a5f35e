//! Digest configuration — participants, summarization service, batch policy, logging.
//!
//! Loaded from `{config_dir}/case-digest/config.toml` (or an explicit path).
//! Every section has defaults, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants;
use crate::{DigestError, DigestResult};

// ============================================================================
// PARTICIPANTS
// ============================================================================

/// Known actor names on each side of a ticket conversation.
/// Anyone not listed is treated as support-side (system note).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantsConfig {
    pub customer: Vec<String>,
    pub support: Vec<String>,
    /// Counterpart labels used when addressing reconstructed messages.
    pub customer_label: String,
    pub support_label: String,
}

impl Default for ParticipantsConfig {
    fn default() -> Self {
        Self {
            customer: vec![
                "Megumi Hashimoto".into(),
                "Nao Oki".into(),
                "Emiri Miyamoto".into(),
                "Go Enomoto".into(),
            ],
            support: vec!["CData Japan Support".into()],
            customer_label: "Asteria".into(),
            support_label: "CData Japan Support".into(),
        }
    }
}

// ============================================================================
// SUMMARIZER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub model: String,
    pub endpoint: String,
    /// Falls back to the GEMINI_API_KEY environment variable when absent.
    pub api_key: Option<String>,
    pub requests_per_minute: u32,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_secs: f64,
    pub max_backoff_secs: f64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: constants::DEFAULT_MODEL.into(),
            endpoint: constants::DEFAULT_ENDPOINT.into(),
            api_key: None,
            requests_per_minute: constants::DEFAULT_REQUESTS_PER_MINUTE,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: constants::MAX_ATTEMPTS,
            base_backoff_secs: constants::BASE_BACKOFF_SECS,
            max_backoff_secs: constants::MAX_BACKOFF_SECS,
        }
    }
}

impl SummarizerConfig {
    /// Minimum spacing between two model calls.
    pub fn min_interval(&self) -> std::time::Duration {
        let rpm = self.requests_per_minute.max(1);
        std::time::Duration::from_secs_f64(60.0 / rpm as f64)
    }

    /// Backoff durations must be finite and non-negative.
    pub fn validate(&self) -> DigestResult<()> {
        for (key, value) in [
            ("base_backoff_secs", self.base_backoff_secs),
            ("max_backoff_secs", self.max_backoff_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DigestError::Config(format!(
                    "summarizer.{} must be a finite, non-negative number of seconds (got {})",
                    key, value
                )));
            }
        }
        Ok(())
    }

    /// Configured key, else the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(constants::API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ============================================================================
// BATCH
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Prefix prepended to ticket ids to form case numbers.
    pub case_prefix: String,
    /// Value written to the `source` metadata key.
    pub source_tag: String,
    /// Build a non-generative summary when the model call fails fatally.
    pub fallback_on_fatal: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            case_prefix: constants::DEFAULT_CASE_PREFIX.into(),
            source_tag: constants::DEFAULT_SOURCE_TAG.into(),
            fallback_on_fatal: true,
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset.
    pub level: String,
    /// Append logs here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

// ============================================================================
// ROOT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub participants: ParticipantsConfig,
    pub summarizer: SummarizerConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Retourne le repertoire de configuration cross-platform.
/// Linux: ~/.config/case-digest/
/// macOS: ~/Library/Application Support/case-digest/
/// Windows: %APPDATA%/case-digest/
pub fn config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    });
    base.join("case-digest")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl DigestConfig {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> DigestResult<Self> {
        let path = default_config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. Unlike `load`, the file must exist.
    pub fn load_from(path: &Path) -> DigestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            DigestError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.summarizer.validate()?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> DigestResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> DigestResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DigestError::Config(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: DigestConfig = toml::from_str(
            r#"
            [summarizer]
            requests_per_minute = 30

            [participants]
            customer = ["Alice"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.summarizer.requests_per_minute, 30);
        assert_eq!(cfg.summarizer.max_attempts, constants::MAX_ATTEMPTS);
        assert_eq!(cfg.participants.customer, vec!["Alice".to_string()]);
        assert_eq!(cfg.participants.support, vec!["CData Japan Support".to_string()]);
        assert!(cfg.batch.fallback_on_fatal);
    }

    #[test]
    fn test_min_interval_from_rpm() {
        let cfg = SummarizerConfig::default();
        assert_eq!(cfg.min_interval(), std::time::Duration::from_secs(4));

        let zero = SummarizerConfig { requests_per_minute: 0, ..Default::default() };
        assert_eq!(zero.min_interval(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = DigestConfig::default();
        cfg.batch.case_prefix = "CASE-".into();
        cfg.logging.file = Some(dir.path().join("digest.log"));
        cfg.save_to(&path).unwrap();

        let loaded = DigestConfig::load_from(&path).unwrap();
        assert_eq!(loaded.batch.case_prefix, "CASE-");
        assert_eq!(loaded.logging.file, cfg.logging.file);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[summarizer\nmodel = ").unwrap();
        let err = DigestConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }

    #[test]
    fn test_non_finite_backoff_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[summarizer]\nbase_backoff_secs = inf\n").unwrap();
        let err = DigestConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, DigestError::Config(ref m) if m.contains("base_backoff_secs")));

        let cfg = SummarizerConfig { max_backoff_secs: -1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
        assert!(SummarizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = DigestConfig::load_from(Path::new("/nonexistent/case-digest.toml")).unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }

    #[test]
    fn test_configured_api_key_wins() {
        let cfg = SummarizerConfig { api_key: Some("k-123".into()), ..Default::default() };
        assert_eq!(cfg.resolve_api_key().as_deref(), Some("k-123"));
    }
}
