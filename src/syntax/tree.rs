//! Syntax model for one C translation unit
//!
//! Built once per parse from the tree-sitter concrete syntax tree and owned
//! by the caller, so queries do not hold on to the parser. It keeps
//! top-level items, tag definitions, per-function body facts and every name
//! occurrence with its [`Role`].

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub span: Span,
    pub line: u32,
    pub end_line: u32,
    /// Only whitespace precedes the comment on its first line
    pub leading: bool,
}

/// One logical preprocessor line, comments removed and splices joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub text: String,
    pub span: Span,
    pub line: u32,
    pub end_line: u32,
}

/// What a name node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// `identifier`: variable, function, parameter, enumerator or macro
    Identifier,
    /// `type_identifier`: typedef or tag name
    Type,
    /// `field_identifier`: struct or union member
    Field,
    /// `statement_identifier`: label or `goto` target
    Label,
}

/// A name node of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub text: String,
    pub role: Role,
    pub line: u32,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        }
    }
}

/// `type name` pair of a parameter or member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedName {
    pub type_name: String,
    /// Declarator text (`*argv[]`), empty for abstract declarators
    pub name: String,
}

/// A struct or union with a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    pub kind: RecordKind,
    pub name: Option<String>,
    pub line: u32,
    pub end_line: u32,
    pub fields: Vec<TypedName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<String>,
}

/// An enum with a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: Option<String>,
    pub line: u32,
    pub end_line: u32,
    pub enumerators: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefDef {
    pub name: String,
    pub line: u32,
    /// Type the name stands for, declarator shape included (`int (*)(int)`)
    pub underlying: String,
}

/// One declarator of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    /// Full type: specifiers plus the declarator with the name removed
    pub type_name: String,
    /// The name is directly followed by a parameter list
    pub is_function: bool,
}

/// A file-scope `declaration` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub storage: Option<String>,
    pub declarators: Vec<Declarator>,
    pub line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSite {
    pub line: u32,
    /// Returned expression text, `None` for a bare `return;`
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoSite {
    pub label: String,
    pub line: u32,
}

/// Facts collected from a function body, each list in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionBody {
    pub calls: Vec<CallSite>,
    pub returns: Vec<ReturnSite>,
    pub gotos: Vec<GotoSite>,
    pub labels: Vec<String>,
    /// Names declared locally (parameters excluded)
    pub locals: Vec<String>,
    /// Base names of assignment and increment targets
    pub writes: Vec<String>,
}

/// A `function_definition` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub storage: Option<String>,
    pub return_type: String,
    pub parameters: Vec<TypedName>,
    pub is_variadic: bool,
    pub start_line: u32,
    pub end_line: u32,
    /// Whole definition, specifiers through closing brace
    pub span: Span,
    /// `compound_statement` of the body
    pub body_span: Span,
    pub body: FunctionBody,
}

impl FunctionDef {
    pub fn is_static(&self) -> bool {
        self.storage.as_deref() == Some("static")
    }

    /// `int add(int a, int b)`, `Bitvec *create(u32 n)`
    pub fn signature(&self) -> String {
        let params = if self.parameters.is_empty() && !self.is_variadic {
            "void".to_string()
        } else {
            let mut parts: Vec<String> = self
                .parameters
                .iter()
                .map(|p| format!("{} {}", p.type_name, p.name).trim().to_string())
                .collect();
            if self.is_variadic {
                parts.push("...".to_string());
            }
            parts.join(", ")
        };
        let separator = if self.return_type.ends_with('*') { "" } else { " " };
        format!("{}{}{}({})", self.return_type, separator, self.name, params)
    }

    /// Parameter names with declarator punctuation stripped
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter_map(|p| {
                let name: String = p
                    .name
                    .chars()
                    .skip_while(|c| !(c.is_ascii_alphabetic() || *c == '_'))
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                (!name.is_empty()).then_some(name)
            })
            .collect()
    }
}

/// Parsed translation unit
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub(crate) source: String,
    pub(crate) has_errors: bool,
    pub(crate) comments: Vec<Comment>,
    pub(crate) directives: Vec<Directive>,
    pub(crate) names: Vec<NameRef>,
    pub functions: Vec<FunctionDef>,
    pub declarations: Vec<Declaration>,
    pub records: Vec<RecordDef>,
    pub enums: Vec<EnumDef>,
    pub typedefs: Vec<TypedefDef>,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// tree-sitter had to recover from `ERROR` or missing nodes
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Comments in source order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Name nodes in source order
    pub fn names(&self) -> &[NameRef] {
        &self.names
    }

    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    /// Text of a 1-based line, without the newline
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.source.split('\n').nth(line as usize - 1)
    }

    /// First definition of `name`
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Name nodes inside the definition of `function`
    pub fn names_in<'a>(&'a self, function: &'a FunctionDef) -> impl Iterator<Item = &'a NameRef> + 'a {
        self.names.iter().filter(move |n| function.span.contains(n.span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(return_type: &str, params: &[(&str, &str)], variadic: bool) -> FunctionDef {
        FunctionDef {
            name: "f".to_string(),
            storage: None,
            return_type: return_type.to_string(),
            parameters: params
                .iter()
                .map(|(t, n)| TypedName {
                    type_name: t.to_string(),
                    name: n.to_string(),
                })
                .collect(),
            is_variadic: variadic,
            start_line: 1,
            end_line: 1,
            span: Span::default(),
            body_span: Span::default(),
            body: FunctionBody::default(),
        }
    }

    #[test]
    fn test_signature_rendering() {
        assert_eq!(
            function("int", &[("int", "a"), ("int", "b")], false).signature(),
            "int f(int a, int b)"
        );
        assert_eq!(function("void", &[], false).signature(), "void f(void)");
        assert_eq!(
            function("Bitvec *", &[("u32", "n")], false).signature(),
            "Bitvec *f(u32 n)"
        );
        assert_eq!(
            function("int", &[("const char", "*fmt")], true).signature(),
            "int f(const char *fmt, ...)"
        );
    }

    #[test]
    fn test_parameter_names() {
        let f = function("int", &[("int", "argc"), ("char", "*argv[]"), ("int", "")], false);
        assert_eq!(f.parameter_names(), vec!["argc", "argv"]);
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(10, 50);
        assert!(outer.contains(Span::new(10, 12)));
        assert!(outer.contains(Span::new(40, 50)));
        assert!(!outer.contains(Span::new(5, 12)));
        assert!(!outer.contains(Span::new(49, 51)));
    }
}
