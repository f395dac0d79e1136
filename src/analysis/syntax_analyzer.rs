//! Built-in analyzer backend on top of the tolerant C scanner

use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::extract;
use super::heuristics::Heuristics;
use super::source::{read_source, DEFAULT_MAX_FILE_BYTES};
use super::types::{
    AnalysisResult, CallGraph, ErrorPath, FunctionDependencies, FunctionInfo, FunctionSummary,
    GlobalInfo, SideEffects, SymbolOccurrences,
};
use super::CodeAnalyzer;
use crate::errors::Result;
use crate::preprocessor::PreprocessorDirectives;
use crate::syntax::{parse, SyntaxTree};

/// Analyzer that parses each file with [`crate::syntax::parse`]
#[derive(Debug, Clone)]
pub struct SyntaxAnalyzer {
    heuristics: Heuristics,
    max_file_bytes: u64,
}

impl Default for SyntaxAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxAnalyzer {
    pub const BACKEND_ID: &'static str = "syntax";

    pub fn new() -> Self {
        Self {
            heuristics: Heuristics::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    fn load(&self, path: &Path) -> Result<SyntaxTree> {
        let source = read_source(path, self.max_file_bytes)?;
        let started = Instant::now();
        let tree = parse(&source.text)?;
        debug!(
            path = %path.display(),
            bytes = source.len,
            functions = tree.functions.len(),
            recovered = tree.has_errors(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Parsed source file"
        );
        Ok(tree)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl CodeAnalyzer for SyntaxAnalyzer {
    fn backend_id(&self) -> &str {
        Self::BACKEND_ID
    }

    fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        let tree = self.load(path)?;
        Ok(extract::analysis(&tree, &display(path)))
    }

    fn list_functions(&self, path: &Path) -> Result<Vec<FunctionInfo>> {
        let tree = self.load(path)?;
        Ok(extract::functions(&tree, &display(path)))
    }

    fn get_function_body(&self, path: &Path, function_name: &str) -> Result<Option<String>> {
        let tree = self.load(path)?;
        Ok(extract::function_body(&tree, function_name))
    }

    fn get_preprocessor_directives(&self, path: &Path) -> Result<PreprocessorDirectives> {
        let tree = self.load(path)?;
        Ok(extract::directives(&tree))
    }

    fn get_call_graph(&self, path: &Path) -> Result<CallGraph> {
        let tree = self.load(path)?;
        Ok(extract::call_graph(&tree))
    }

    fn get_function_dependencies(&self, path: &Path, function_name: &str) -> Result<FunctionDependencies> {
        let tree = self.load(path)?;
        extract::dependencies(&tree, function_name)
    }

    fn summarize_function(&self, path: &Path, function_name: &str) -> Result<FunctionSummary> {
        let tree = self.load(path)?;
        extract::summary(&tree, function_name, &self.heuristics)
    }

    fn list_globals(&self, path: &Path) -> Result<Vec<GlobalInfo>> {
        let tree = self.load(path)?;
        Ok(extract::globals(&tree))
    }

    fn find_symbol(&self, path: &Path, symbol: &str) -> Result<SymbolOccurrences> {
        let tree = self.load(path)?;
        Ok(extract::find_symbol(&tree, symbol))
    }

    fn get_error_handling_paths(&self, path: &Path, function_name: &str) -> Result<Vec<ErrorPath>> {
        let tree = self.load(path)?;
        extract::error_paths(&tree, function_name)
    }

    fn list_side_effects(&self, path: &Path, function_name: &str) -> Result<SideEffects> {
        let tree = self.load(path)?;
        extract::side_effects(&tree, function_name, &self.heuristics)
    }
}
