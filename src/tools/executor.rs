//! Tool executor
//!
//! Validates tool arguments, confines paths to the source root and runs
//! the analyzer on tokio's blocking pool. A semaphore bounds how many
//! analyses run at once.

use crate::analysis::CodeAnalyzer;
use crate::errors::{AnalyzerError, Result};
use crate::tools::registry::{ToolRegistry, FILE_PATH, FUNCTION_NAME, SYMBOL};
use crate::tools::security::PathJail;
use crate::tools::types::{ToolResult, ToolStats};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Maximum concurrent analyses
pub const MAX_PARALLEL_OPERATIONS: usize = 4;

/// Text returned by `get_function_body` when the function does not exist
pub const FUNCTION_NOT_FOUND: &str = "Function not found";

/// Runs registry tools against an analyzer
pub struct ToolExecutor {
    analyzer: Arc<dyn CodeAnalyzer>,
    registry: ToolRegistry,
    jail: Option<PathJail>,
    semaphore: Semaphore,
    stats: Mutex<HashMap<String, ToolStats>>,
}

impl ToolExecutor {
    pub fn new(analyzer: Arc<dyn CodeAnalyzer>) -> Self {
        Self {
            analyzer,
            registry: ToolRegistry::new(),
            jail: None,
            semaphore: Semaphore::new(MAX_PARALLEL_OPERATIONS),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Only accept files under `jail`
    pub fn with_jail(mut self, jail: PathJail) -> Self {
        self.jail = Some(jail);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn analyzer(&self) -> &Arc<dyn CodeAnalyzer> {
        &self.analyzer
    }

    /// Execute a tool off the async runtime
    ///
    /// Unknown tools and malformed arguments are errors; analysis failures
    /// are returned as failed [`ToolResult`]s.
    pub async fn execute(self: &Arc<Self>, tool: &str, args: Value) -> Result<ToolResult> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| AnalyzerError::Protocol(format!("Executor closed: {}", e)))?;

        let executor = Arc::clone(self);
        let tool = tool.to_string();
        tokio::task::spawn_blocking(move || executor.execute_blocking(&tool, &args))
            .await
            .map_err(|e| AnalyzerError::Protocol(format!("Tool task failed: {}", e)))?
    }

    /// Execute a tool on the current thread
    pub fn execute_blocking(&self, tool: &str, args: &Value) -> Result<ToolResult> {
        let request = self.validate(tool, args)?;
        let start = Instant::now();

        let result = match self.run(tool, &request) {
            Ok(output) => ToolResult::success(tool.to_string(), output, start.elapsed()),
            Err(e) => {
                warn!(tool, error = %e, "Tool execution failed");
                ToolResult::failure(tool.to_string(), e.to_string(), start.elapsed())
            }
        };

        debug!(tool, success = result.success, duration_ms = result.duration_ms, "Tool executed");
        self.record(&result);
        Ok(result)
    }

    /// Check required arguments against the schema
    fn validate(&self, tool: &str, args: &Value) -> Result<Request> {
        let schema = self
            .registry
            .get(tool)
            .ok_or_else(|| AnalyzerError::UnknownTool(tool.to_string()))?;

        if !args.is_object() {
            return Err(invalid(tool, "arguments must be an object"));
        }

        for name in schema.required() {
            match args.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) => {
                    return Err(invalid(tool, &format!("'{}' must not be empty", name)))
                }
                Some(_) => return Err(invalid(tool, &format!("'{}' must be a string", name))),
                None => return Err(invalid(tool, &format!("missing required argument '{}'", name))),
            }
        }

        let text = |key: &str| args[key].as_str().map(str::to_string);
        Ok(Request {
            file_path: text(FILE_PATH).unwrap_or_default(),
            function_name: text(FUNCTION_NAME),
            symbol: text(SYMBOL),
        })
    }

    fn resolve(&self, file_path: &str) -> Result<PathBuf> {
        match &self.jail {
            Some(jail) => jail.verify_and_canonicalize(file_path),
            None => Ok(PathBuf::from(file_path)),
        }
    }

    /// Route to the analyzer and render its answer
    fn run(&self, tool: &str, request: &Request) -> Result<String> {
        let path = self.resolve(&request.file_path)?;
        let path = path.as_path();
        let function = request.function_name.as_deref().unwrap_or_default();
        let analyzer = self.analyzer.as_ref();

        match tool {
            "analyze_c_file" => render(&analyzer.analyze_file(path)?),
            "list_functions" => render(&analyzer.list_functions(path)?),
            "get_function_body" => Ok(analyzer
                .get_function_body(path, function)?
                .unwrap_or_else(|| FUNCTION_NOT_FOUND.to_string())),
            "get_preprocessor_directives" => render(&analyzer.get_preprocessor_directives(path)?),
            "get_call_graph" => render(&analyzer.get_call_graph(path)?),
            "get_function_dependencies" => {
                render(&analyzer.get_function_dependencies(path, function)?)
            }
            "summarize_function" => render(&analyzer.summarize_function(path, function)?),
            "list_globals" => render(&analyzer.list_globals(path)?),
            "find_symbol" => render(
                &analyzer.find_symbol(path, request.symbol.as_deref().unwrap_or_default())?,
            ),
            "get_error_handling_paths" => {
                render(&analyzer.get_error_handling_paths(path, function)?)
            }
            "list_side_effects" => render(&analyzer.list_side_effects(path, function)?),
            _ => Err(AnalyzerError::UnknownTool(tool.to_string())),
        }
    }

    fn record(&self, result: &ToolResult) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = stats.entry(result.tool.clone()).or_default();
        if result.success {
            entry.record_success(result.duration_ms);
        } else {
            entry.record_failure(result.duration_ms);
        }
    }

    /// Statistics for every tool executed so far
    pub fn all_stats(&self) -> HashMap<String, ToolStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Validated arguments
#[derive(Debug)]
struct Request {
    file_path: String,
    function_name: Option<String>,
    symbol: Option<String>,
}

fn invalid(tool: &str, reason: &str) -> AnalyzerError {
    AnalyzerError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SyntaxAnalyzer;
    use serde_json::json;
    use tempfile::TempDir;

    const SOURCE: &str = "#include <stdio.h>\n\
        int twice(int x) { return x * 2; }\n\
        int main(void) { printf(\"%d\\n\", twice(2)); return 0; }\n";

    fn setup() -> (Arc<ToolExecutor>, TempDir, String) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prog.c");
        std::fs::write(&path, SOURCE).unwrap();
        let executor = Arc::new(ToolExecutor::new(Arc::new(SyntaxAnalyzer::new())));
        (executor, dir, path.display().to_string())
    }

    #[test]
    fn test_renders_pretty_json() {
        let (executor, _dir, path) = setup();
        let result = executor
            .execute_blocking("get_call_graph", &json!({"file_path": path}))
            .unwrap();

        assert!(result.success);
        let graph: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(graph["main"], json!(["printf", "twice"]));
        assert!(result.output.contains('\n'));
    }

    #[test]
    fn test_function_body_raw_text() {
        let (executor, _dir, path) = setup();
        let found = executor
            .execute_blocking("get_function_body", &json!({"file_path": path, "function_name": "twice"}))
            .unwrap();
        assert_eq!(found.output, "{ return x * 2; }");

        let missing = executor
            .execute_blocking("get_function_body", &json!({"file_path": path, "function_name": "nope"}))
            .unwrap();
        assert!(missing.success);
        assert_eq!(missing.output, FUNCTION_NOT_FOUND);
    }

    #[test]
    fn test_analysis_failure_is_result() {
        let (executor, _dir, path) = setup();
        let result = executor
            .execute_blocking("summarize_function", &json!({"file_path": path, "function_name": "nope"}))
            .unwrap();

        assert!(!result.success);
        assert_eq!(
            result.text(),
            "Error executing summarize_function: Function 'nope' not found"
        );
        assert_eq!(executor.all_stats()["summarize_function"].failed_executions, 1);
    }

    #[test]
    fn test_argument_validation() {
        let (executor, _dir, path) = setup();

        let missing = executor.execute_blocking("find_symbol", &json!({"file_path": path}));
        assert!(matches!(missing, Err(AnalyzerError::InvalidArguments { .. })));

        let wrong_type = executor.execute_blocking("list_globals", &json!({"file_path": 7}));
        assert!(matches!(wrong_type, Err(AnalyzerError::InvalidArguments { .. })));

        let unknown = executor.execute_blocking("run_command", &json!({}));
        assert!(matches!(unknown, Err(AnalyzerError::UnknownTool(_))));
    }

    #[test]
    fn test_jail_applies() {
        let (_, dir, _) = setup();
        let executor = ToolExecutor::new(Arc::new(SyntaxAnalyzer::new()))
            .with_jail(PathJail::new(dir.path()).unwrap());

        let inside = executor
            .execute_blocking("list_functions", &json!({"file_path": "prog.c"}))
            .unwrap();
        assert!(inside.success);

        let outside = executor
            .execute_blocking("list_functions", &json!({"file_path": "/etc/hostname"}))
            .unwrap();
        assert!(!outside.success);
        assert!(outside.text().contains("escapes source root"));
    }

    #[tokio::test]
    async fn test_async_execute() {
        let (executor, _dir, path) = setup();
        let result = executor
            .execute("find_symbol", json!({"file_path": path, "symbol": "twice"}))
            .await
            .unwrap();

        let occurrences: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(occurrences["lines"], json!([2, 3]));
        assert_eq!(executor.all_stats().len(), 1);
    }
}
