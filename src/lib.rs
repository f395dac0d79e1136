//! ccodetools - structural analysis of C source files
//!
//! The tree-sitter C grammar recovers functions, declarations and
//! preprocessor directives without compiling anything, and answers questions about them
//! from the command line or as an MCP tool server.
//!
//! # Architecture
//!
//! - **syntax**: tree-sitter C grammar lowered into a `SyntaxTree`
//! - **preprocessor**: directive classification
//! - **analysis**: `CodeAnalyzer` operations, backends and the result cache
//! - **tools** / **server**: MCP tool layer and JSON-RPC over stdio
//! - **cli**: command-line front end

pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod preprocessor;
pub mod server;
pub mod syntax;
pub mod tools;

// Re-export commonly used types
pub use analysis::{build_analyzer, CachedAnalyzer, CodeAnalyzer, SyntaxAnalyzer};
pub use config::Config;
pub use errors::{AnalyzerError, Result};
pub use server::McpServer;
pub use tools::ToolExecutor;
