use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Retry behavior for recoverable backend failures. Immutable per session.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum recovery attempts before the session surfaces a terminal error.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Ground recovery instructions in the tool's help text when available.
    #[serde(default = "default_enable_help_lookup")]
    pub enable_help_lookup: bool,
    /// Tool-output budget in chars for recovery attempts. Smaller than the
    /// first-attempt budget so retries force more selective queries.
    #[serde(default = "default_aggressive_truncation_threshold")]
    pub aggressive_truncation_threshold: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_enable_help_lookup() -> bool {
    true
}

fn default_aggressive_truncation_threshold() -> usize {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            enable_help_lookup: default_enable_help_lookup(),
            aggressive_truncation_threshold: default_aggressive_truncation_threshold(),
        }
    }
}

/// Large-payload spooling settings.
///
/// When enabled, tool outputs larger than `threshold_bytes` are written to
/// temp storage and referenced by path in the conversation, so the full
/// payload stays available without re-entering the context window.
#[derive(Debug, Clone, Deserialize)]
pub struct SpoolConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_spool_threshold_bytes")]
    pub threshold_bytes: usize,
    /// Spool directory. Defaults to the system temp dir when absent.
    pub dir: Option<std::path::PathBuf>,
}

fn default_spool_threshold_bytes() -> usize {
    16_384
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_bytes: default_spool_threshold_bytes(),
            dir: None,
        }
    }
}

/// Top-level configuration loaded from `liaison.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LiaisonConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    /// Seconds to wait for an interactive confirmation before failing closed.
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// Skip all confirmation prompts. Write operations execute unasked.
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub spool: SpoolConfig,
}

fn default_confirm_timeout_secs() -> u64 {
    300
}

impl Default for LiaisonConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            auto_approve: false,
            spool: SpoolConfig::default(),
        }
    }
}

impl LiaisonConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert!(config.enable_help_lookup);
        assert_eq!(config.aggressive_truncation_threshold, 2000);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = LiaisonConfig::from_toml_str("").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.confirm_timeout_secs, 300);
        assert!(!config.auto_approve);
        assert!(!config.spool.enabled);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = LiaisonConfig::from_toml_str(
            r#"
            auto_approve = true
            confirm_timeout_secs = 60

            [retry]
            max_attempts = 5
            aggressive_truncation_threshold = 1000

            [spool]
            enabled = true
            threshold_bytes = 4096
            "#,
        )
        .unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.confirm_timeout_secs, 60);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.aggressive_truncation_threshold, 1000);
        assert!(config.retry.enable_help_lookup); // untouched default
        assert!(config.spool.enabled);
        assert_eq!(config.spool.threshold_bytes, 4096);
    }

    #[test]
    fn invalid_toml_returns_config_error() {
        let err = LiaisonConfig::from_toml_str("this is not toml {{{").unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn load_missing_file_returns_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LiaisonConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liaison.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 7\n").unwrap();
        let config = LiaisonConfig::load(&path).unwrap();
        assert_eq!(config.retry.max_attempts, 7);
    }
}
