//! Backend selection by name

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::cache::CachedAnalyzer;
use super::syntax_analyzer::SyntaxAnalyzer;
use super::CodeAnalyzer;
use crate::config::Config;
use crate::errors::{AnalyzerError, Result};

/// Available analyzer backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyzerKind {
    /// Built-in tolerant scanner
    Syntax,
}

impl AnalyzerKind {
    pub const ALL: &'static [AnalyzerKind] = &[AnalyzerKind::Syntax];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKind::Syntax => SyntaxAnalyzer::BACKEND_ID,
        }
    }

    /// Comma-separated list of backend names
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyzerKind {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            // older configs name the parser library rather than the backend
            "syntax" | "tree-sitter" | "treesitter" => Ok(AnalyzerKind::Syntax),
            _ => Err(AnalyzerError::UnknownBackend {
                name: s.to_string(),
                available: Self::available(),
            }),
        }
    }
}

/// Construct an uncached backend configured from `config`
pub fn make_analyzer(kind: AnalyzerKind, config: &Config) -> Box<dyn CodeAnalyzer> {
    match kind {
        AnalyzerKind::Syntax => Box::new(
            SyntaxAnalyzer::new()
                .with_heuristics(config.heuristics.clone())
                .with_max_file_bytes(config.analyzer.max_file_bytes),
        ),
    }
}

/// Resolve the backend (an explicit name wins over the config) and wrap it
/// in the cache unless caching is off
pub fn build_analyzer(
    config: &Config,
    backend: Option<&str>,
    use_cache: bool,
) -> Result<Arc<dyn CodeAnalyzer>> {
    let name = backend.unwrap_or(&config.analyzer.backend);
    let kind: AnalyzerKind = name.parse()?;
    let analyzer = make_analyzer(kind, config);

    if use_cache && config.analyzer.cache_enabled {
        info!(
            backend = %kind,
            max_files = config.analyzer.cache_max_files,
            "Analyzer ready with cache"
        );
        Ok(Arc::new(
            CachedAnalyzer::with_capacity(analyzer, config.analyzer.cache_max_files)
                .with_max_file_bytes(config.analyzer.max_file_bytes),
        ))
    } else {
        info!(backend = %kind, "Analyzer ready without cache");
        Ok(Arc::from(analyzer))
    }
}
