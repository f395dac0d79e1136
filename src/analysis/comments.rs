//! Doc comments attached to definitions

use crate::syntax::{Comment, CommentKind, SyntaxTree};

/// Comment block directly above `line`, cleaned of comment markers.
///
/// Blank lines may separate the comments from the definition. Consecutive
/// `//` comments are joined with newlines; a block comment ends the search.
pub fn doc_comment(tree: &SyntaxTree, line: u32) -> Option<String> {
    let comments = tree.comments();
    let mut remaining = comments.partition_point(|c| c.end_line < line);
    let mut cursor = line.saturating_sub(1);
    let mut parts = Vec::new();

    loop {
        while cursor > 0 && tree.line_text(cursor).is_some_and(|l| l.trim().is_empty()) {
            cursor -= 1;
        }
        if cursor == 0 || remaining == 0 {
            break;
        }

        // every comment ending on this line; the first one is the doc part
        let end = remaining;
        while remaining > 0 && comments[remaining - 1].end_line == cursor {
            remaining -= 1;
        }
        let group = &comments[remaining..end];
        let Some(comment) = group.first() else {
            break;
        };
        if !comment.leading || !only_comments_on_line(tree, group) {
            break;
        }

        let text = tree.slice(comment.span);
        match comment.kind {
            CommentKind::Line => {
                parts.push(clean_line_comment(text));
                cursor = comment.line.saturating_sub(1);
            }
            CommentKind::Block => {
                parts.push(clean_block_comment(text));
                break;
            }
        }
    }

    parts.reverse();
    let joined = parts.join("\n");
    (!joined.trim().is_empty()).then_some(joined)
}

/// Only whitespace separates the comments of `group` and ends their line
fn only_comments_on_line(tree: &SyntaxTree, group: &[Comment]) -> bool {
    let source = tree.source();
    group.iter().enumerate().all(|(i, comment)| {
        let gap = match group.get(i + 1) {
            Some(next) => source.get(comment.span.end..next.span.start),
            None => source
                .get(comment.span.end..)
                .and_then(|rest| rest.split('\n').next()),
        };
        gap.is_some_and(|gap| gap.trim().is_empty())
    })
}

fn clean_line_comment(text: &str) -> String {
    text.trim_start_matches('/')
        .replace("\\\r\n", " ")
        .replace("\\\n", " ")
        .trim()
        .to_string()
}

fn clean_block_comment(text: &str) -> String {
    let inner = text.strip_prefix("/*").unwrap_or(text);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn doc_for(source: &str, function: &str) -> Option<String> {
        let tree = parse(source).unwrap();
        let line = tree.function(function).map(|f| f.start_line)?;
        doc_comment(&tree, line)
    }

    #[test]
    fn test_block_comment_lines_join_with_spaces() {
        let src = "/**\n * Calculates the sum of two integers\n * Returns the sum\n */\nint add(int a, int b) { return a + b; }\n";
        assert_eq!(
            doc_for(src, "add").as_deref(),
            Some("Calculates the sum of two integers Returns the sum")
        );
    }

    #[test]
    fn test_line_comments_join_with_newlines() {
        let src = "// first\n// second\n\nint f(void) { return 0; }\n";
        assert_eq!(doc_for(src, "f").as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_stops_at_block_comment() {
        let src = "/* header */\n// note\nint f(void) { return 0; }\n/* older */\n/* doc */\nint g(void) { return 1; }\n";
        assert_eq!(doc_for(src, "f").as_deref(), Some("header\nnote"));
        assert_eq!(doc_for(src, "g").as_deref(), Some("doc"));
    }

    #[test]
    fn test_trailing_comment_is_not_doc() {
        let src = "int x; // counter\nint f(void) { return x; }\n";
        assert!(doc_for(src, "f").is_none());
    }

    #[test]
    fn test_block_comment_followed_by_line_comment() {
        let src = "/** Doc */ // tail\nint c(void) { return 0; }\n";
        assert_eq!(doc_for(src, "c").as_deref(), Some("Doc"));
    }

    #[test]
    fn test_code_between_blocks_the_comment() {
        let src = "// about x\nint x;\n\nint f(void) { return x; }\n";
        assert!(doc_for(src, "f").is_none());
    }

    #[test]
    fn test_no_comment() {
        assert!(doc_for("void g(void) { }\n", "g").is_none());
    }
}
