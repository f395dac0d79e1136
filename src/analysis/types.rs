//! Analysis result types
//!
//! Field names are the JSON contract of the CLI `--json` output and the
//! MCP tool results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::preprocessor::PreprocessorDirective;

/// Function parameter as written in the definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

/// One function definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: String,
    pub start_line: u32,
    pub end_line: u32,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub doc_comment: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub is_static: bool,
}

/// Struct or union member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructInfo {
    pub name: String,
    /// `struct` or `union`
    pub kind: String,
    pub line: u32,
    pub end_line: u32,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorInfo {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    pub name: String,
    pub line: u32,
    pub end_line: u32,
    pub enumerators: Vec<EnumeratorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefInfo {
    pub name: String,
    pub line: u32,
    pub underlying: String,
}

/// File-scope object declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalInfo {
    pub name: String,
    pub line: u32,
    pub type_name: String,
    #[serde(default)]
    pub storage: Option<String>,
}

/// Everything `analyze_file` reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub functions: Vec<FunctionInfo>,
    pub includes: Vec<PreprocessorDirective>,
    pub defines: Vec<PreprocessorDirective>,
    pub conditionals: Vec<PreprocessorDirective>,
    pub structs: Vec<StructInfo>,
    pub enums: Vec<EnumInfo>,
    pub typedefs: Vec<TypedefInfo>,
    pub globals: Vec<GlobalInfo>,
}

/// Caller name to sorted, unique callee names
pub type CallGraph = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDependencies {
    pub function: String,
    pub calls: Vec<String>,
    pub types: Vec<String>,
    pub macros: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub function: String,
    pub allocates_memory: bool,
    pub frees_memory: bool,
    pub multiple_returns: bool,
    pub uses_goto: bool,
    pub return_count: usize,
    pub call_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOccurrences {
    pub symbol: String,
    /// One entry per occurrence, ascending
    pub lines: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPathKind {
    Return,
    Goto,
}

/// A `return` or `goto` leaving the normal flow of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPath {
    pub line: u32,
    #[serde(rename = "type")]
    pub kind: ErrorPathKind,
    /// Returned expression or goto label
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffects {
    pub io: Vec<String>,
    pub allocates_memory: bool,
    pub frees_memory: bool,
    pub modifies_globals: Vec<String>,
}
