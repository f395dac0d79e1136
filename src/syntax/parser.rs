//! Lowering of the tree-sitter C syntax tree
//!
//! The grammar does the parsing; this module walks `function_definition`,
//! `declaration`, `type_definition` and tag specifier nodes and copies what
//! the analyzer needs into an owned [`SyntaxTree`].

use std::collections::HashMap;

use tree_sitter::{Node, Parser};

use super::directives;
use super::tree::{
    CallSite, Comment, CommentKind, Declaration, Declarator, EnumDef, Enumerator, FunctionBody,
    FunctionDef, GotoSite, NameRef, RecordDef, RecordKind, ReturnSite, Role, SyntaxTree,
    TypedName, TypedefDef,
};
use crate::errors::{AnalyzerError, Result};

/// Parse one translation unit with the tree-sitter C grammar
pub fn parse(source: &str) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| AnalyzerError::ParseError(e.to_string()))?;
    let parsed = parser
        .parse(source, None)
        .ok_or_else(|| AnalyzerError::ParseError("parser produced no tree".to_string()))?;
    let root = parsed.root_node();

    let lower = Lowering { source };
    let mut tree = SyntaxTree {
        source: source.to_string(),
        has_errors: root.has_error(),
        comments: Vec::new(),
        directives: Vec::new(),
        names: Vec::new(),
        functions: Vec::new(),
        declarations: Vec::new(),
        records: Vec::new(),
        enums: Vec::new(),
        typedefs: Vec::new(),
    };
    lower.items(root, &mut tree);
    lower.scan(root, &mut tree);
    tree.comments.sort_by_key(|c| c.span.start);
    tree.directives = directives::scan(source, &tree.comments);
    Ok(tree)
}

fn line(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

fn end_line(node: Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).collect();
    found
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).collect();
    found
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children_by_field_name(field, &mut cursor).collect();
    found
}

/// Collapse whitespace runs to single spaces
fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_name(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "identifier" | "field_identifier" | "type_identifier" | "primitive_type"
    )
}

/// Declarator nodes from `node` down to the declared name
fn declarator_path(node: Node<'_>) -> Vec<Node<'_>> {
    let mut path = vec![node];
    let mut current = node;
    while !is_name(current) {
        let next = match current.kind() {
            "parenthesized_declarator" => named_children(current)
                .into_iter()
                .find(|c| !matches!(c.kind(), "ms_call_modifier" | "comment")),
            _ => current.child_by_field_name("declarator"),
        };
        match next {
            Some(next) => {
                path.push(next);
                current = next;
            }
            None => break,
        }
    }
    path
}

fn declared_name<'t>(path: &[Node<'t>]) -> Option<Node<'t>> {
    path.last().copied().filter(|n| is_name(*n) && !n.is_missing())
}

/// The name sits directly inside a parameter list declarator
fn declares_function(path: &[Node<'_>]) -> bool {
    path.len() >= 2 && path[path.len() - 2].kind() == "function_declarator"
}

/// `init_declarator` without its initializer
fn strip_initializer(node: Node<'_>) -> Node<'_> {
    if node.kind() == "init_declarator" {
        node.child_by_field_name("declarator").unwrap_or(node)
    } else {
        node
    }
}

fn role_of(node: Node<'_>, text: &str) -> Option<Role> {
    match node.kind() {
        "identifier" => Some(Role::Identifier),
        "type_identifier" => Some(Role::Type),
        "field_identifier" => Some(Role::Field),
        "statement_identifier" => Some(Role::Label),
        // the grammar gives `NULL` its own node, it is still a macro name
        "null" if text == "NULL" => Some(Role::Identifier),
        _ => None,
    }
}

/// Storage class and type words of a declaration-like node
struct Specifiers {
    storage: Option<String>,
    type_name: String,
}

struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// Top-level items, looking through conditional blocks and `extern "C"`
    fn items(&self, node: Node<'_>, tree: &mut SyntaxTree) {
        for child in named_children(node) {
            match child.kind() {
                "function_definition" => {
                    if let Some(def) = self.function(child) {
                        tree.functions.push(def);
                    }
                }
                "declaration" => tree.declarations.push(self.declaration(child)),
                "type_definition" => tree.typedefs.extend(self.typedefs(child)),
                "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
                | "preproc_elifdef" | "linkage_specification" | "declaration_list" | "ERROR" => {
                    self.items(child, tree)
                }
                _ => {}
            }
        }
    }

    /// One pass over every node for comments, tag bodies and name roles
    fn scan(&self, root: Node<'_>, tree: &mut SyntaxTree) {
        let mut stack = vec![(root, true)];
        while let Some((node, with_names)) = stack.pop() {
            match node.kind() {
                "comment" => {
                    tree.comments.push(self.comment(node));
                    continue;
                }
                "struct_specifier" => tree.records.extend(self.record(node, RecordKind::Struct)),
                "union_specifier" => tree.records.extend(self.record(node, RecordKind::Union)),
                "enum_specifier" => tree.enums.extend(self.enumeration(node)),
                _ => {}
            }

            let text = self.text(node);
            if with_names && !node.is_missing() {
                if let Some(role) = role_of(node, text) {
                    tree.names.push(NameRef {
                        text: text.to_string(),
                        role,
                        line: line(node),
                        span: node.byte_range().into(),
                    });
                }
            }

            // directive operands are not code, a macro's own name is
            let named_field = |field: &str| node.child_by_field_name(field);
            let (only, except) = match node.kind() {
                "preproc_include" => (None, None),
                "preproc_def" | "preproc_function_def" => (named_field("name"), None),
                "preproc_ifdef" | "preproc_elifdef" => (Some(node), named_field("name")),
                "preproc_if" | "preproc_elif" => (Some(node), named_field("condition")),
                _ => (Some(node), None),
            };
            let mut next = children(node);
            next.reverse();
            for child in next {
                let names = with_names
                    && match only {
                        Some(only) if only == node => Some(child) != except,
                        Some(only) => child == only,
                        None => false,
                    };
                stack.push((child, names));
            }
        }
    }

    fn comment(&self, node: Node<'_>) -> Comment {
        let text = self.text(node);
        let start = node.start_byte();
        let before = self.source.get(..start).unwrap_or_default();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Comment {
            kind: if text.starts_with("//") {
                CommentKind::Line
            } else {
                CommentKind::Block
            },
            span: node.byte_range().into(),
            line: line(node),
            end_line: end_line(node),
            leading: before[line_start..].trim().is_empty(),
        }
    }

    /// `struct Tag` for tag specifiers with a body, source text otherwise
    fn type_text(&self, node: Node<'_>) -> String {
        let keyword = match node.kind() {
            "struct_specifier" => "struct",
            "union_specifier" => "union",
            "enum_specifier" => "enum",
            _ => return squash(self.text(node)),
        };
        if node.child_by_field_name("body").is_none() {
            return squash(self.text(node));
        }
        match node.child_by_field_name("name") {
            Some(name) => format!("{} {}", keyword, self.text(name)),
            None => keyword.to_string(),
        }
    }

    fn specifiers(&self, node: Node<'_>) -> Specifiers {
        let type_node = node.child_by_field_name("type");
        let mut storage = None;
        let mut words = Vec::new();
        for child in children(node) {
            match child.kind() {
                "storage_class_specifier" => {
                    let word = squash(self.text(child));
                    if storage.is_none() && !word.contains("inline") {
                        storage = Some(word);
                    }
                }
                "type_qualifier" => words.push(squash(self.text(child))),
                _ if Some(child) == type_node => words.push(self.type_text(child)),
                _ => {}
            }
        }
        Specifiers {
            storage,
            type_name: words.join(" "),
        }
    }

    /// Specifiers followed by the declarator with its name cut out:
    /// `char *`, `int (*)(int)`, `char [16]`
    fn declared_type(&self, base: &str, declarator: Node<'_>, name: Option<Node<'_>>) -> String {
        let shape = match name {
            Some(name) => {
                let head = self
                    .source
                    .get(declarator.start_byte()..name.start_byte())
                    .unwrap_or_default();
                let tail = self
                    .source
                    .get(name.end_byte()..declarator.end_byte())
                    .unwrap_or_default();
                squash(&format!("{}{}", head, tail))
            }
            None => squash(self.text(declarator)),
        };
        match (base.is_empty(), shape.is_empty()) {
            (_, true) => base.to_string(),
            (true, false) => shape,
            (false, false) => format!("{} {}", base, shape),
        }
    }

    fn function(&self, node: Node<'_>) -> Option<FunctionDef> {
        let declarator = node.child_by_field_name("declarator")?;
        let body = node.child_by_field_name("body")?;
        let path = declarator_path(declarator);
        let name = declared_name(&path)?;
        let specifiers = self.specifiers(node);

        let own = path.iter().rposition(|n| n.kind() == "function_declarator");
        let pointer_depth = path[..own.unwrap_or(path.len())]
            .iter()
            .filter(|n| n.kind() == "pointer_declarator")
            .count();
        let base = if specifiers.type_name.is_empty() {
            "int".to_string()
        } else {
            specifiers.type_name
        };
        let return_type = if pointer_depth == 0 {
            base
        } else {
            format!("{} {}", base, "*".repeat(pointer_depth))
        };

        let (parameters, is_variadic) = own
            .and_then(|i| path[i].child_by_field_name("parameters"))
            .map(|list| self.parameters(list, node))
            .unwrap_or_default();

        Some(FunctionDef {
            name: self.text(name).to_string(),
            storage: specifiers.storage,
            return_type,
            parameters,
            is_variadic,
            start_line: line(node),
            end_line: end_line(node),
            span: node.byte_range().into(),
            body_span: body.byte_range().into(),
            body: self.body(body),
        })
    }

    fn parameters(&self, list: Node<'_>, definition: Node<'_>) -> (Vec<TypedName>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        let mut old_style: Option<HashMap<String, TypedName>> = None;

        for child in named_children(list) {
            match child.kind() {
                "parameter_declaration" => {
                    let specifiers = self.specifiers(child);
                    let param = match child.child_by_field_name("declarator") {
                        Some(d) if declared_name(&declarator_path(d)).is_some() => TypedName {
                            type_name: specifiers.type_name,
                            name: squash(self.text(d)),
                        },
                        Some(d) => TypedName {
                            type_name: self.declared_type(&specifiers.type_name, d, None),
                            name: String::new(),
                        },
                        None => TypedName {
                            type_name: specifiers.type_name,
                            name: String::new(),
                        },
                    };
                    params.push(param);
                }
                "variadic_parameter" => variadic = true,
                // K&R list: types come from the declarations before the body
                "identifier" => {
                    let declared = old_style.get_or_insert_with(|| self.old_style_types(definition));
                    let name = self.text(child);
                    params.push(declared.get(name).cloned().unwrap_or_else(|| TypedName {
                        type_name: "int".to_string(),
                        name: name.to_string(),
                    }));
                }
                _ => {}
            }
        }

        if !variadic && params.len() == 1 && params[0].name.is_empty() && params[0].type_name == "void" {
            params.clear();
        }
        (params, variadic)
    }

    fn old_style_types(&self, definition: Node<'_>) -> HashMap<String, TypedName> {
        let mut types = HashMap::new();
        for decl in named_children(definition).into_iter().filter(|c| c.kind() == "declaration") {
            let specifiers = self.specifiers(decl);
            for d in field_children(decl, "declarator") {
                let d = strip_initializer(d);
                if let Some(name) = declared_name(&declarator_path(d)) {
                    types.insert(
                        self.text(name).to_string(),
                        TypedName {
                            type_name: specifiers.type_name.clone(),
                            name: squash(self.text(d)),
                        },
                    );
                }
            }
        }
        types
    }

    fn body(&self, body: Node<'_>) -> FunctionBody {
        let mut facts = FunctionBody::default();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "call_expression" => {
                    if let Some(callee) = node
                        .child_by_field_name("function")
                        .filter(|f| f.kind() == "identifier")
                    {
                        facts.calls.push(CallSite {
                            name: self.text(callee).to_string(),
                            line: line(callee),
                        });
                    }
                }
                "return_statement" => facts.returns.push(ReturnSite {
                    line: line(node),
                    value: named_children(node)
                        .into_iter()
                        .find(|c| c.kind() != "comment")
                        .map(|e| squash(self.text(e))),
                }),
                "goto_statement" => {
                    if let Some(label) = node.child_by_field_name("label") {
                        facts.gotos.push(GotoSite {
                            label: self.text(label).to_string(),
                            line: line(node),
                        });
                    }
                }
                "labeled_statement" => {
                    if let Some(label) = node.child_by_field_name("label") {
                        facts.labels.push(self.text(label).to_string());
                    }
                }
                "declaration" => {
                    for d in field_children(node, "declarator") {
                        if let Some(name) = declared_name(&declarator_path(d)) {
                            facts.locals.push(self.text(name).to_string());
                        }
                    }
                }
                "assignment_expression" => {
                    if let Some(base) = node.child_by_field_name("left").and_then(|l| self.write_base(l)) {
                        facts.writes.push(base);
                    }
                }
                "update_expression" => {
                    if let Some(base) = node
                        .child_by_field_name("argument")
                        .and_then(|a| self.write_base(a))
                    {
                        facts.writes.push(base);
                    }
                }
                _ => {}
            }
            let mut next = children(node);
            next.reverse();
            stack.extend(next);
        }
        facts
    }

    /// Variable written by an lvalue: `g`, `g[i]`, `g.f`, `g->f`, `(g)`
    fn write_base(&self, mut node: Node<'_>) -> Option<String> {
        loop {
            node = match node.kind() {
                "identifier" => return Some(self.text(node).to_string()),
                "subscript_expression" | "field_expression" => node.child_by_field_name("argument")?,
                "parenthesized_expression" => named_children(node)
                    .into_iter()
                    .find(|c| c.kind() != "comment")?,
                _ => return None,
            };
        }
    }

    fn declaration(&self, node: Node<'_>) -> Declaration {
        let specifiers = self.specifiers(node);
        let declarators = field_children(node, "declarator")
            .into_iter()
            .filter_map(|d| {
                let d = strip_initializer(d);
                let path = declarator_path(d);
                let name = declared_name(&path)?;
                Some(Declarator {
                    name: self.text(name).to_string(),
                    type_name: self.declared_type(&specifiers.type_name, d, Some(name)),
                    is_function: declares_function(&path),
                })
            })
            .collect();
        Declaration {
            storage: specifiers.storage,
            declarators,
            line: line(node),
            end_line: end_line(node),
        }
    }

    fn typedefs(&self, node: Node<'_>) -> Vec<TypedefDef> {
        let specifiers = self.specifiers(node);
        field_children(node, "declarator")
            .into_iter()
            .filter_map(|d| {
                let name = declared_name(&declarator_path(d))?;
                Some(TypedefDef {
                    name: self.text(name).to_string(),
                    line: line(node),
                    underlying: self.declared_type(&specifiers.type_name, d, Some(name)),
                })
            })
            .collect()
    }

    /// Tag name, or the typedef name for `typedef struct { ... } Name;`
    fn tag_name(&self, node: Node<'_>) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return Some(self.text(name).to_string());
        }
        let parent = node.parent().filter(|p| p.kind() == "type_definition")?;
        if parent.child_by_field_name("type") != Some(node) {
            return None;
        }
        let first = parent.child_by_field_name("declarator")?;
        declared_name(&declarator_path(first)).map(|n| self.text(n).to_string())
    }

    fn record(&self, node: Node<'_>, kind: RecordKind) -> Option<RecordDef> {
        let body = node.child_by_field_name("body")?;
        let mut fields = Vec::new();
        for member in named_children(body).into_iter().filter(|c| c.kind() == "field_declaration") {
            let specifiers = self.specifiers(member);
            for d in field_children(member, "declarator") {
                fields.push(TypedName {
                    type_name: specifiers.type_name.clone(),
                    name: squash(self.text(d)),
                });
            }
        }
        Some(RecordDef {
            kind,
            name: self.tag_name(node),
            line: line(node),
            end_line: end_line(node),
            fields,
        })
    }

    fn enumeration(&self, node: Node<'_>) -> Option<EnumDef> {
        let body = node.child_by_field_name("body")?;
        let enumerators = named_children(body)
            .into_iter()
            .filter(|c| c.kind() == "enumerator")
            .filter_map(|e| {
                Some(Enumerator {
                    name: self.text(e.child_by_field_name("name")?).to_string(),
                    value: e.child_by_field_name("value").map(|v| squash(self.text(v))),
                })
            })
            .collect();
        Some(EnumDef {
            name: self.tag_name(node),
            line: line(node),
            end_line: end_line(node),
            enumerators,
        })
    }
}
