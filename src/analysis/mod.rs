//! C source analysis
//!
//! Provides the [`CodeAnalyzer`] interface and its implementations:
//! - `SyntaxAnalyzer`: built-in tolerant scanner backend
//! - `CachedAnalyzer`: content-addressed LRU wrapper for any backend
//! - Factory selecting a backend by name
//!
//! All operations take a path and read the file themselves, so every call
//! sees the current contents on disk.

pub mod cache;
pub mod comments;
pub mod extract;
pub mod factory;
pub mod heuristics;
pub mod source;
pub mod syntax_analyzer;
pub mod types;

use std::path::Path;

use crate::errors::Result;
use crate::preprocessor::PreprocessorDirectives;

pub use cache::{CacheStats, CachedAnalyzer};
pub use factory::{build_analyzer, make_analyzer, AnalyzerKind};
pub use heuristics::Heuristics;
pub use syntax_analyzer::SyntaxAnalyzer;
pub use types::{
    AnalysisResult, CallGraph, EnumInfo, ErrorPath, ErrorPathKind, FunctionDependencies,
    FunctionInfo, FunctionSummary, GlobalInfo, Parameter, SideEffects, StructInfo,
    SymbolOccurrences, TypedefInfo,
};

/// Operations every analyzer backend provides
///
/// Function-targeted queries fail with `FunctionNotFound` when the file
/// has no definition of that name, except `get_function_body`, which
/// returns `None`.
pub trait CodeAnalyzer: Send + Sync {
    /// Stable backend name, part of cache keys
    fn backend_id(&self) -> &str;

    /// Complete structure of a file
    fn analyze_file(&self, path: &Path) -> Result<AnalysisResult>;

    /// Function definitions in source order
    fn list_functions(&self, path: &Path) -> Result<Vec<FunctionInfo>>;

    /// Exact body text, braces included, of the first definition
    fn get_function_body(&self, path: &Path, function_name: &str) -> Result<Option<String>>;

    fn get_preprocessor_directives(&self, path: &Path) -> Result<PreprocessorDirectives>;

    /// Direct calls of every defined function
    fn get_call_graph(&self, path: &Path) -> Result<CallGraph>;

    fn get_function_dependencies(&self, path: &Path, function_name: &str) -> Result<FunctionDependencies>;

    fn summarize_function(&self, path: &Path, function_name: &str) -> Result<FunctionSummary>;

    /// File-scope object declarations
    fn list_globals(&self, path: &Path) -> Result<Vec<GlobalInfo>>;

    /// Lines where `symbol` occurs as an identifier
    fn find_symbol(&self, path: &Path, symbol: &str) -> Result<SymbolOccurrences>;

    fn get_error_handling_paths(&self, path: &Path, function_name: &str) -> Result<Vec<ErrorPath>>;

    fn list_side_effects(&self, path: &Path, function_name: &str) -> Result<SideEffects>;
}

impl<T: CodeAnalyzer + ?Sized> CodeAnalyzer for Box<T> {
    fn backend_id(&self) -> &str {
        (**self).backend_id()
    }

    fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        (**self).analyze_file(path)
    }

    fn list_functions(&self, path: &Path) -> Result<Vec<FunctionInfo>> {
        (**self).list_functions(path)
    }

    fn get_function_body(&self, path: &Path, function_name: &str) -> Result<Option<String>> {
        (**self).get_function_body(path, function_name)
    }

    fn get_preprocessor_directives(&self, path: &Path) -> Result<PreprocessorDirectives> {
        (**self).get_preprocessor_directives(path)
    }

    fn get_call_graph(&self, path: &Path) -> Result<CallGraph> {
        (**self).get_call_graph(path)
    }

    fn get_function_dependencies(&self, path: &Path, function_name: &str) -> Result<FunctionDependencies> {
        (**self).get_function_dependencies(path, function_name)
    }

    fn summarize_function(&self, path: &Path, function_name: &str) -> Result<FunctionSummary> {
        (**self).summarize_function(path, function_name)
    }

    fn list_globals(&self, path: &Path) -> Result<Vec<GlobalInfo>> {
        (**self).list_globals(path)
    }

    fn find_symbol(&self, path: &Path, symbol: &str) -> Result<SymbolOccurrences> {
        (**self).find_symbol(path, symbol)
    }

    fn get_error_handling_paths(&self, path: &Path, function_name: &str) -> Result<Vec<ErrorPath>> {
        (**self).get_error_handling_paths(path, function_name)
    }

    fn list_side_effects(&self, path: &Path, function_name: &str) -> Result<SideEffects> {
        (**self).list_side_effects(path, function_name)
    }
}
