//! MCP tool layer
//!
//! Exposes each analyzer operation as a named tool with:
//! - JSON Schema for its arguments (registry)
//! - Source root confinement (path jail)
//! - Bounded executor rendering results as JSON text

pub mod executor;
pub mod registry;
pub mod security;
pub mod types;

pub use executor::{ToolExecutor, FUNCTION_NOT_FOUND};
pub use registry::ToolRegistry;
pub use security::PathJail;
pub use types::{ToolResult, ToolSchema, ToolStats};
