//! C front end
//!
//! The tree-sitter C grammar parses each translation unit; the result is
//! lowered into an owned [`SyntaxTree`]:
//! - Functions, file-scope declarations, tags and typedefs
//! - Per-function calls, returns, gotos, labels, locals and writes
//! - Every name node with its role
//! - Comments and logical directive lines
//!
//! No preprocessing happens; directives are reported as text.

mod directives;
mod parser;
pub mod tree;

pub use parser::parse;
pub use tree::{
    CallSite, Comment, CommentKind, Declaration, Declarator, Directive, EnumDef, Enumerator,
    FunctionBody, FunctionDef, GotoSite, NameRef, RecordDef, RecordKind, ReturnSite, Role, Span,
    SyntaxTree, TypedName, TypedefDef,
};
