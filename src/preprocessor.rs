//! Preprocessor directive extraction
//!
//! Directives are classified by the word after `#`; nothing is expanded
//! or evaluated.

use serde::{Deserialize, Serialize};

use crate::syntax::Directive;

/// Kind of a directive, serialized as the directive word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Include,
    Define,
    Undef,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Elifdef,
    Elifndef,
    Else,
    Endif,
    Pragma,
    Error,
    Warning,
    Line,
    Other,
}

impl DirectiveKind {
    pub fn from_word(word: &str) -> Self {
        match word {
            "include" | "include_next" | "import" => DirectiveKind::Include,
            "define" => DirectiveKind::Define,
            "undef" => DirectiveKind::Undef,
            "if" => DirectiveKind::If,
            "ifdef" => DirectiveKind::Ifdef,
            "ifndef" => DirectiveKind::Ifndef,
            "elif" => DirectiveKind::Elif,
            "elifdef" => DirectiveKind::Elifdef,
            "elifndef" => DirectiveKind::Elifndef,
            "else" => DirectiveKind::Else,
            "endif" => DirectiveKind::Endif,
            "pragma" => DirectiveKind::Pragma,
            "error" => DirectiveKind::Error,
            "warning" => DirectiveKind::Warning,
            "line" => DirectiveKind::Line,
            _ => DirectiveKind::Other,
        }
    }

    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            DirectiveKind::If
                | DirectiveKind::Ifdef
                | DirectiveKind::Ifndef
                | DirectiveKind::Elif
                | DirectiveKind::Elifdef
                | DirectiveKind::Elifndef
                | DirectiveKind::Else
                | DirectiveKind::Endif
        )
    }
}

/// One classified directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessorDirective {
    #[serde(rename = "type")]
    pub kind: DirectiveKind,
    /// Macro name for `define`/`undef`, full directive text otherwise
    pub content: String,
    pub line: u32,
    /// Header name for `include`, replacement (with parameter list) for `define`
    #[serde(default)]
    pub value: Option<String>,
}

/// Directives grouped the way `get_preprocessor_directives` reports them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessorDirectives {
    pub includes: Vec<PreprocessorDirective>,
    pub defines: Vec<PreprocessorDirective>,
    pub conditionals: Vec<PreprocessorDirective>,
}

impl PreprocessorDirectives {
    pub fn len(&self) -> usize {
        self.includes.len() + self.defines.len() + self.conditionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify one directive line
pub fn classify(directive: &Directive) -> PreprocessorDirective {
    let text = directive.text.as_str();
    let after_hash = text.strip_prefix('#').unwrap_or(text).trim_start();
    let word_len = after_hash
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after_hash.len());
    let (word, rest) = after_hash.split_at(word_len);
    let rest = rest.trim();
    let kind = DirectiveKind::from_word(word);

    let (content, value) = match kind {
        DirectiveKind::Include => (text.to_string(), header_name(rest)),
        DirectiveKind::Define | DirectiveKind::Undef => {
            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(rest.len());
            let (name, tail) = rest.split_at(name_len);
            let tail = tail.trim();
            let value = (kind == DirectiveKind::Define && !tail.is_empty()).then(|| tail.to_string());
            (name.to_string(), value)
        }
        _ => (text.to_string(), None),
    };

    PreprocessorDirective {
        kind,
        content,
        line: directive.line,
        value,
    }
}

/// `<stdio.h>` and `"local.h"` without delimiters; macro includes verbatim
fn header_name(rest: &str) -> Option<String> {
    let name = if let Some(inner) = rest.strip_prefix('<') {
        inner.split('>').next().unwrap_or(inner)
    } else if let Some(inner) = rest.strip_prefix('"') {
        inner.split('"').next().unwrap_or(inner)
    } else {
        rest
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Group the directives of a file
pub fn collect(directives: &[Directive]) -> PreprocessorDirectives {
    let mut grouped = PreprocessorDirectives::default();
    for directive in directives.iter().map(classify) {
        match directive.kind {
            DirectiveKind::Include => grouped.includes.push(directive),
            DirectiveKind::Define => grouped.defines.push(directive),
            kind if kind.is_conditional() => grouped.conditionals.push(directive),
            _ => {}
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn directives(source: &str) -> PreprocessorDirectives {
        collect(parse(source).unwrap().directives())
    }

    #[test]
    fn test_include_forms() {
        let found = directives("#include <stdio.h>\n#include \"ringbuf.h\"\n#include HEADER\n");
        assert_eq!(found.includes.len(), 3);
        assert_eq!(found.includes[0].content, "#include <stdio.h>");
        assert_eq!(found.includes[0].value.as_deref(), Some("stdio.h"));
        assert_eq!(found.includes[1].value.as_deref(), Some("ringbuf.h"));
        assert_eq!(found.includes[2].value.as_deref(), Some("HEADER"));
        assert_eq!(found.includes[1].line, 2);
    }

    #[test]
    fn test_define_name_and_value() {
        let found = directives(
            "#define MAX_SIZE 100\n#define MIN(a, b) ((a) < (b) ? (a) : (b))\n#define EMPTY\n",
        );
        let defines = &found.defines;
        assert_eq!(defines[0].content, "MAX_SIZE");
        assert_eq!(defines[0].value.as_deref(), Some("100"));
        assert_eq!(defines[1].content, "MIN");
        assert_eq!(defines[1].value.as_deref(), Some("(a, b) ((a) < (b) ? (a) : (b))"));
        assert_eq!(defines[2].content, "EMPTY");
        assert!(defines[2].value.is_none());
    }

    #[test]
    fn test_blank_after_hash_and_continuations() {
        let found = directives("  #  define LONG_ONE \\\n    (1 + \\\n     2)\n");
        assert_eq!(found.defines.len(), 1);
        assert_eq!(found.defines[0].content, "LONG_ONE");
        assert_eq!(found.defines[0].value.as_deref(), Some("(1 + 2)"));
        assert_eq!(found.defines[0].line, 1);
    }

    #[test]
    fn test_conditionals_keep_full_text() {
        let found = directives("#ifdef DEBUG\n#elif defined(TRACE)\n#else\n#endif /* DEBUG */\n#pragma once\n");
        let kinds: Vec<DirectiveKind> = found.conditionals.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DirectiveKind::Ifdef, DirectiveKind::Elif, DirectiveKind::Else, DirectiveKind::Endif]
        );
        assert_eq!(found.conditionals[0].content, "#ifdef DEBUG");
        assert_eq!(found.conditionals[3].content, "#endif");
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let found = directives("#ifndef GUARD\n");
        let json = serde_json::to_value(&found.conditionals[0]).unwrap();
        assert_eq!(json["type"], "ifndef");
        assert_eq!(json["content"], "#ifndef GUARD");
        assert_eq!(json["value"], serde_json::Value::Null);
    }
}
