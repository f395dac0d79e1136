//! CLI module for ccodetools
//!
//! Handles argument parsing and turns analysis subcommands into printable
//! output. `serve` and `config` are handled by the binary.

pub mod args;
pub mod render;

pub use args::{Cli, Commands, FileArgs, FunctionArgs, SymbolArgs};

use serde::Serialize;

use crate::analysis::CodeAnalyzer;
use crate::errors::{AnalyzerError, Result};

fn output<T: Serialize>(value: &T, json: bool, text: impl FnOnce(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

/// Run an analysis subcommand and render its result
///
/// Returns `None` for `serve` and `config`.
pub fn run_query(command: &Commands, analyzer: &dyn CodeAnalyzer) -> Result<Option<String>> {
    let rendered = match command {
        Commands::AnalyzeCFile(a) => {
            output(&analyzer.analyze_file(&a.file)?, a.json, render::analysis)?
        }
        Commands::ListFunctions(a) => {
            output(&analyzer.list_functions(&a.file)?, a.json, |f| render::functions(f))?
        }
        Commands::GetFunctionBody(a) => {
            let body = analyzer
                .get_function_body(&a.file, &a.function)?
                .ok_or_else(|| AnalyzerError::FunctionNotFound(a.function.clone()))?;
            if a.json {
                serde_json::to_string_pretty(&serde_json::json!({
                    "function": a.function,
                    "body": body,
                }))?
            } else {
                body
            }
        }
        Commands::GetPreprocessorDirectives(a) => output(
            &analyzer.get_preprocessor_directives(&a.file)?,
            a.json,
            render::directives,
        )?,
        Commands::GetCallGraph(a) => {
            output(&analyzer.get_call_graph(&a.file)?, a.json, render::call_graph)?
        }
        Commands::GetFunctionDependencies(a) => output(
            &analyzer.get_function_dependencies(&a.file, &a.function)?,
            a.json,
            render::dependencies,
        )?,
        Commands::SummarizeFunction(a) => output(
            &analyzer.summarize_function(&a.file, &a.function)?,
            a.json,
            render::summary,
        )?,
        Commands::ListGlobals(a) => {
            output(&analyzer.list_globals(&a.file)?, a.json, |g| render::globals(g))?
        }
        Commands::FindSymbol(a) => output(
            &analyzer.find_symbol(&a.file, &a.symbol)?,
            a.json,
            render::symbol,
        )?,
        Commands::GetErrorHandlingPaths(a) => output(
            &analyzer.get_error_handling_paths(&a.file, &a.function)?,
            a.json,
            |p| render::error_paths(p),
        )?,
        Commands::ListSideEffects(a) => output(
            &analyzer.list_side_effects(&a.file, &a.function)?,
            a.json,
            render::side_effects,
        )?,
        Commands::Serve { .. } | Commands::Config => return Ok(None),
    };
    Ok(Some(rendered))
}
