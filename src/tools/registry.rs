//! Tool registry with JSON schemas
//!
//! One entry per analyzer operation, listed in registration order:
//! - analyze_c_file, list_functions, get_function_body,
//!   get_preprocessor_directives, get_call_graph, list_globals
//!   (file only)
//! - get_function_dependencies, summarize_function,
//!   get_error_handling_paths, list_side_effects (file + function)
//! - find_symbol (file + symbol)

use crate::tools::types::ToolSchema;
use serde_json::json;
use std::collections::HashMap;

/// Argument carrying the source file path
pub const FILE_PATH: &str = "file_path";
/// Argument carrying the target function
pub const FUNCTION_NAME: &str = "function_name";
/// Argument carrying the searched identifier
pub const SYMBOL: &str = "symbol";

/// Tool registry
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Map of tool name to schema
    tools: HashMap<String, ToolSchema>,
    /// Registration order
    order: Vec<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create new tool registry with all tools
    pub fn new() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
            order: Vec::new(),
        };

        registry.register_file_tool(
            "analyze_c_file",
            "Analyze a C file and return its complete structure: functions, \
             preprocessor directives, structs, enums, typedefs and globals",
        );
        registry.register_file_tool(
            "list_functions",
            "List function definitions with signature, line range and doc comment",
        );
        registry.register_function_tool(
            "get_function_body",
            "Return the complete body of a function, braces included",
        );
        registry.register_file_tool(
            "get_preprocessor_directives",
            "List includes, macro definitions and conditional directives",
        );
        registry.register_file_tool(
            "get_call_graph",
            "Return the direct callees of every function defined in the file",
        );
        registry.register_function_tool(
            "get_function_dependencies",
            "Return the calls, type names and macros a function uses",
        );
        registry.register_function_tool(
            "summarize_function",
            "Heuristic structural summary of a function: allocation, frees, \
             return count and goto usage",
        );
        registry.register_file_tool("list_globals", "List file-scope variables");
        registry.register_symbol_tool();
        registry.register_function_tool(
            "get_error_handling_paths",
            "List the return and goto statements of a function in source order",
        );
        registry.register_function_tool(
            "list_side_effects",
            "List side effects of a function: I/O calls, allocation, frees and \
             modified globals",
        );

        registry
    }

    fn insert(&mut self, schema: ToolSchema) {
        self.order.push(schema.name.clone());
        self.tools.insert(schema.name.clone(), schema);
    }

    /// Register a tool taking only a file path
    fn register_file_tool(&mut self, name: &str, description: &str) {
        let schema = ToolSchema::new(
            name,
            description,
            json!({
                "type": "object",
                "properties": {
                    FILE_PATH: {
                        "type": "string",
                        "description": "Path to the C source file"
                    }
                },
                "required": [FILE_PATH]
            }),
            true,
        );
        self.insert(schema);
    }

    /// Register a tool taking a file path and a function name
    fn register_function_tool(&mut self, name: &str, description: &str) {
        let schema = ToolSchema::new(
            name,
            description,
            json!({
                "type": "object",
                "properties": {
                    FILE_PATH: {
                        "type": "string",
                        "description": "Path to the C source file"
                    },
                    FUNCTION_NAME: {
                        "type": "string",
                        "description": "Name of a function defined in the file"
                    }
                },
                "required": [FILE_PATH, FUNCTION_NAME]
            }),
            true,
        );
        self.insert(schema);
    }

    /// Register find_symbol tool
    fn register_symbol_tool(&mut self) {
        let schema = ToolSchema::new(
            "find_symbol",
            "Find every line where an identifier occurs in the file",
            json!({
                "type": "object",
                "properties": {
                    FILE_PATH: {
                        "type": "string",
                        "description": "Path to the C source file"
                    },
                    SYMBOL: {
                        "type": "string",
                        "description": "Identifier to search for"
                    }
                },
                "required": [FILE_PATH, SYMBOL]
            }),
            true,
        );
        self.insert(schema);
    }

    /// Get tool schema by name
    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.tools.get(name)
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Schemas in registration order
    pub fn schemas(&self) -> Vec<&ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .collect()
    }

    /// Get tool count
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
