//! Kernel configuration.
//!
//! # Responsibility
//! - Describe the extension root, boot policy, rule depth cap and logging.
//! - Load configuration from JSON with defaults for every field.
//!
//! # Invariants
//! - `rules.max_depth >= 1` and `extension.bootstrap_file` is non-blank after
//!   a successful load.

use crate::extension::container::ServiceContainer;
use crate::extension::kernel::{BootFailurePolicy, ExtensionRegistry};
use crate::extension::loader::{ExtensionLoader, DEFAULT_BOOTSTRAP_FILE};
use crate::extension::rules::DEFAULT_MAX_RULE_DEPTH;
use crate::logging::{default_log_level, init_logging};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_EXTENSION_DIRECTORY: &str = "extension";

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarkeConfig {
    pub extension: ExtensionConfig,
    pub rules: RuleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Directory whose subdirectories are extensions.
    pub directory: PathBuf,
    /// Manifest file name looked up in each extension directory.
    pub bootstrap_file: String,
    pub boot_failure_policy: BootFailurePolicy,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_EXTENSION_DIRECTORY),
            bootstrap_file: DEFAULT_BOOTSTRAP_FILE.to_string(),
            boot_failure_policy: BootFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub max_depth: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RULE_DEPTH,
        }
    }
}

/// File logging settings; logging stays off when `dir` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<String>,
}

/// Configuration load errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl LarkeConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "rules.max_depth must be at least 1".to_string(),
            ));
        }
        if self.extension.bootstrap_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "extension.bootstrap_file must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Registry configured with this boot policy and rule depth cap.
    pub fn build_registry(&self, container: ServiceContainer) -> ExtensionRegistry {
        ExtensionRegistry::new(container)
            .with_failure_policy(self.extension.boot_failure_policy)
            .with_max_rule_depth(self.rules.max_depth)
    }

    /// Loader rooted at the configured extension directory.
    pub fn build_loader(&self) -> ExtensionLoader {
        ExtensionLoader::new(self.extension.directory.clone())
            .with_bootstrap_file(self.extension.bootstrap_file.as_str())
    }

    /// Starts file logging when `logging.dir` is set.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(dir) = self.logging.dir.as_deref() else {
            return Ok(false);
        };
        let level = self.logging.level.as_deref().unwrap_or(default_log_level());
        init_logging(level, dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LarkeConfig};
    use crate::extension::kernel::BootFailurePolicy;
    use std::path::PathBuf;

    #[test]
    fn empty_document_uses_defaults() {
        let config = LarkeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LarkeConfig::default());
        assert_eq!(config.extension.directory, PathBuf::from("extension"));
        assert_eq!(config.extension.bootstrap_file, "bootstrap.json");
        assert_eq!(
            config.extension.boot_failure_policy,
            BootFailurePolicy::FailFast
        );
        assert_eq!(config.rules.max_depth, 16);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn reads_policy_and_depth() {
        let config = LarkeConfig::from_json_str(
            r#"{"extension":{"directory":"/srv/ext","boot_failure_policy":"isolate"},"rules":{"max_depth":4}}"#,
        )
        .unwrap();
        assert_eq!(config.extension.directory, PathBuf::from("/srv/ext"));
        assert_eq!(
            config.extension.boot_failure_policy,
            BootFailurePolicy::Isolate
        );
        assert_eq!(config.rules.max_depth, 4);

        let registry = config.build_registry(Default::default());
        assert_eq!(registry.failure_policy(), BootFailurePolicy::Isolate);
        assert_eq!(config.build_loader().root(), PathBuf::from("/srv/ext").as_path());
    }

    #[test]
    fn rejects_zero_depth_and_bad_json() {
        let err = LarkeConfig::from_json_str(r#"{"rules":{"max_depth":0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = LarkeConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn logging_is_skipped_without_directory() {
        assert_eq!(LarkeConfig::default().init_logging(), Ok(false));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = LarkeConfig::load("/definitely/not/here/larke.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
