//! Diagnostic logging setup
//!
//! Everything goes to stderr: stdout carries command output and, in server
//! mode, the JSON-RPC stream.

use tracing_subscriber::EnvFilter;

use crate::errors::{AnalyzerError, Result};

/// Environment variable overriding every other level source
pub const LOG_ENV: &str = "CCODETOOLS_LOG";

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else {
            match verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Filter directive this verbosity forces, if any
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("ccodetools=info"),
            Verbosity::VeryVerbose => Some("ccodetools=debug"),
        }
    }
}

/// Pick the filter directive: `CCODETOOLS_LOG`, then flags, then config
pub fn resolve_directive(env: Option<&str>, verbosity: Verbosity, configured: &str) -> String {
    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    verbosity
        .directive()
        .unwrap_or(configured)
        .to_string()
}

/// Install the global stderr subscriber
///
/// Calling this twice is an error from `tracing`, reported as `ConfigError`.
pub fn init(verbosity: Verbosity, configured: &str) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = resolve_directive(env.as_deref(), verbosity, configured);
    let filter = EnvFilter::try_new(&directive).map_err(|e| {
        AnalyzerError::ConfigError(format!("Invalid log filter '{}': {}", directive, e))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AnalyzerError::ConfigError(format!("Logging already initialized: {}", e)))
}
