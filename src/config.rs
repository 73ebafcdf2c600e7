//! Configuration loading and merging.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::danger::{DangerRules, SensitivePattern};
use crate::extract::ProbeLimits;
use crate::knowledge::{DangerLevel, default_store_path};

/// Env var overriding the user config location.
pub const CONFIG_ENV: &str = "SHELL_EXPLAIN_CONFIG";

/// Project-level config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".shell-explain.toml";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid regex pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Help/man probing of unknown commands.
    pub extractor: ExtractorConfig,

    /// Extra danger detection rules.
    pub danger: DangerConfig,

    /// Location of the custom command store.
    pub custom_commands: CustomCommandsConfig,

    /// Audit logging settings.
    pub audit: AuditConfig,
}

/// Flag extractor settings. Unset fields fall back to the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExtractorConfig {
    pub enabled: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_output_bytes: Option<usize>,
}

/// Danger detector settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DangerConfig {
    /// Additional sensitive file patterns.
    pub sensitive_files: Vec<SensitiveFile>,
    /// Additional commands that print file content.
    pub read_commands: Vec<String>,
}

/// A user-defined sensitive path.
#[derive(Debug, Clone, Deserialize)]
pub struct SensitiveFile {
    /// Regex matched against each file argument.
    pub pattern: String,
    pub description: String,
    #[serde(default = "default_severity")]
    pub severity: DangerLevel,
}

fn default_severity() -> DangerLevel {
    DangerLevel::High
}

/// Custom command store settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CustomCommandsConfig {
    pub path: Option<String>,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging.
    pub enabled: bool,
    /// Path to audit log file.
    pub path: Option<String>,
}

/// Compiled configuration with pre-built regexes.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    /// The raw config.
    pub raw: Config,
    /// Danger rules with user patterns compiled in.
    pub danger: DangerRules,
}

impl Config {
    /// Load configuration, merging user and project configs.
    pub fn load(cwd: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config()? {
            config = user_config;
        }

        if let Some(cwd) = cwd {
            if let Some(project_config) = Self::load_project_config(cwd)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    fn load_user_config() -> Result<Option<Self>, ConfigError> {
        let path = Self::user_config_path();
        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                return Ok(Some(toml::from_str(&content)?));
            }
        }
        Ok(None)
    }

    fn load_project_config(cwd: &Path) -> Result<Option<Self>, ConfigError> {
        let path = cwd.join(PROJECT_CONFIG_FILE);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            return Ok(Some(toml::from_str(&content)?));
        }
        Ok(None)
    }

    /// User config path; `SHELL_EXPLAIN_CONFIG` wins over the config dir.
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("shell-explain").join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for scalars).
    fn merge(&mut self, other: Config) {
        // Extend arrays
        self.danger.sensitive_files.extend(other.danger.sensitive_files);
        self.danger.read_commands.extend(other.danger.read_commands);

        // Override scalars if set in project config
        self.extractor.enabled = other.extractor.enabled.or(self.extractor.enabled);
        self.extractor.timeout_ms = other.extractor.timeout_ms.or(self.extractor.timeout_ms);
        self.extractor.max_output_bytes = other
            .extractor
            .max_output_bytes
            .or(self.extractor.max_output_bytes);
        if other.custom_commands.path.is_some() {
            self.custom_commands.path = other.custom_commands.path;
        }
        if other.audit.enabled {
            self.audit.enabled = true;
            if other.audit.path.is_some() {
                self.audit.path = other.audit.path;
            }
        }
    }

    /// Compile all regex patterns for faster matching.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let patterns = self
            .danger
            .sensitive_files
            .iter()
            .map(|file| {
                SensitivePattern::new(&file.pattern, file.description.clone(), file.severity)
                    .map_err(|e| ConfigError::Regex {
                        pattern: file.pattern.clone(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let danger = DangerRules::with_extra(patterns, self.danger.read_commands.iter().cloned());

        Ok(CompiledConfig { raw: self, danger })
    }
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            raw: Config::default(),
            danger: DangerRules::default(),
        }
    }
}

impl CompiledConfig {
    /// Whether unknown commands may be probed for help text.
    pub fn extractor_enabled(&self) -> bool {
        self.raw.extractor.enabled.unwrap_or(true)
    }

    /// Probe ceilings with config overrides applied.
    pub fn probe_limits(&self) -> ProbeLimits {
        let defaults = ProbeLimits::default();
        ProbeLimits {
            timeout: self
                .raw
                .extractor
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_output_bytes: self
                .raw
                .extractor
                .max_output_bytes
                .unwrap_or(defaults.max_output_bytes),
        }
    }

    /// Custom command store path: configured, else the user data dir.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.raw
            .custom_commands
            .path
            .as_ref()
            .map(|p| expand_home(p))
            .or_else(default_store_path)
    }

    /// Audit log path when auditing is enabled.
    pub fn audit_path(&self) -> Option<PathBuf> {
        if !self.raw.audit.enabled {
            return None;
        }
        self.raw.audit.path.as_ref().map(|p| expand_home(p))
    }
}

/// Expand a leading `~/`.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
