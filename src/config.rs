//! Configuration management for ccodetools
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.ccodetools/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::cache::DEFAULT_MAX_FILES;
use crate::analysis::source::DEFAULT_MAX_FILE_BYTES;
use crate::analysis::{AnalyzerKind, Heuristics};
use crate::errors::{AnalyzerError, Result};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub heuristics: Heuristics,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Backend selection and caching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub backend: String,
    pub cache_enabled: bool,
    pub cache_max_files: usize,
    pub max_file_bytes: u64,
}

/// MCP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    /// Restrict tool paths to this directory (`~/` is expanded)
    pub root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `warn` or `ccodetools=debug`
    pub level: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            backend: AnalyzerKind::Syntax.as_str().to_string(),
            cache_enabled: true,
            cache_max_files: DEFAULT_MAX_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "c-code-analyzer".to_string(),
            root: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, or built-in defaults when absent
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// `~/.ccodetools/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ccodetools").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.analyzer.backend.parse::<AnalyzerKind>().map_err(|e| {
            AnalyzerError::ConfigError(e.to_string())
        })?;

        if self.analyzer.cache_max_files == 0 {
            return Err(AnalyzerError::ConfigError(
                "cache_max_files must be greater than 0".to_string(),
            ));
        }

        if self.analyzer.max_file_bytes == 0 {
            return Err(AnalyzerError::ConfigError(
                "max_file_bytes must be greater than 0".to_string(),
            ));
        }

        let lists = [
            ("allocators", &self.heuristics.allocators),
            ("deallocators", &self.heuristics.deallocators),
            ("io_functions", &self.heuristics.io_functions),
        ];
        for (key, names) in lists {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(AnalyzerError::ConfigError(format!(
                    "heuristics.{} contains an empty name",
                    key
                )));
            }
        }

        if self.server.name.trim().is_empty() {
            return Err(AnalyzerError::ConfigError(
                "server.name must not be empty".to_string(),
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(AnalyzerError::ConfigError(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalyzerError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Source root for the server, if configured
    pub fn server_root(&self) -> Option<PathBuf> {
        self.server.root.as_deref().map(Self::expand_path)
    }
}
