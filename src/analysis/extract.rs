//! Queries over a parsed translation unit
//!
//! Everything here is a pure function of a [`SyntaxTree`]; reading files
//! and caching live elsewhere.

use std::collections::{BTreeSet, HashSet};

use super::comments::doc_comment;
use super::heuristics::Heuristics;
use super::types::{
    AnalysisResult, CallGraph, EnumInfo, EnumeratorInfo, ErrorPath, ErrorPathKind, Field,
    FunctionDependencies, FunctionInfo, FunctionSummary, GlobalInfo, Parameter, SideEffects,
    StructInfo, SymbolOccurrences, TypedefInfo,
};
use crate::errors::{AnalyzerError, Result};
use crate::preprocessor::{self, PreprocessorDirectives};
use crate::syntax::{FunctionDef, Role, SyntaxTree};

fn target<'t>(tree: &'t SyntaxTree, name: &str) -> Result<&'t FunctionDef> {
    tree.function(name)
        .ok_or_else(|| AnalyzerError::FunctionNotFound(name.to_string()))
}

fn sorted_unique<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    names.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Macro naming convention: an uppercase letter and no lowercase ones
pub fn is_macro_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase()) && !name.chars().any(|c| c.is_ascii_lowercase())
}

pub fn function_info(tree: &SyntaxTree, def: &FunctionDef, file_path: &str) -> FunctionInfo {
    FunctionInfo {
        name: def.name.clone(),
        signature: def.signature(),
        start_line: def.start_line,
        end_line: def.end_line,
        return_type: def.return_type.clone(),
        parameters: def
            .parameters
            .iter()
            .map(|p| Parameter {
                type_name: p.type_name.clone(),
                name: p.name.clone(),
            })
            .collect(),
        doc_comment: doc_comment(tree, def.start_line),
        file_path: Some(file_path.to_string()),
        is_static: def.is_static(),
    }
}

/// Function definitions in source order
pub fn functions(tree: &SyntaxTree, file_path: &str) -> Vec<FunctionInfo> {
    tree.functions
        .iter()
        .map(|def| function_info(tree, def, file_path))
        .collect()
}

/// Body text from `{` to `}` of the first definition named `name`
pub fn function_body(tree: &SyntaxTree, name: &str) -> Option<String> {
    tree.function(name)
        .map(|def| tree.slice(def.body_span).to_string())
}

pub fn directives(tree: &SyntaxTree) -> PreprocessorDirectives {
    preprocessor::collect(tree.directives())
}

/// Named struct and union definitions
pub fn structs(tree: &SyntaxTree) -> Vec<StructInfo> {
    tree.records
        .iter()
        .filter_map(|record| {
            let name = record.name.clone()?;
            Some(StructInfo {
                name,
                kind: record.kind.as_str().to_string(),
                line: record.line,
                end_line: record.end_line,
                fields: record
                    .fields
                    .iter()
                    .map(|f| Field {
                        type_name: f.type_name.clone(),
                        name: f.name.clone(),
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Named enum definitions
pub fn enums(tree: &SyntaxTree) -> Vec<EnumInfo> {
    tree.enums
        .iter()
        .filter_map(|def| {
            Some(EnumInfo {
                name: def.name.clone()?,
                line: def.line,
                end_line: def.end_line,
                enumerators: def
                    .enumerators
                    .iter()
                    .map(|e| EnumeratorInfo {
                        name: e.name.clone(),
                        value: e.value.clone(),
                    })
                    .collect(),
            })
        })
        .collect()
}

pub fn typedefs(tree: &SyntaxTree) -> Vec<TypedefInfo> {
    tree.typedefs
        .iter()
        .map(|t| TypedefInfo {
            name: t.name.clone(),
            line: t.line,
            underlying: t.underlying.clone(),
        })
        .collect()
}

/// File-scope objects: no typedefs, no function prototypes
pub fn globals(tree: &SyntaxTree) -> Vec<GlobalInfo> {
    tree.declarations
        .iter()
        .flat_map(|decl| {
            decl.declarators
                .iter()
                .filter(|d| !d.is_function)
                .map(move |d| GlobalInfo {
                    name: d.name.clone(),
                    line: decl.line,
                    type_name: d.type_name.clone(),
                    storage: decl.storage.clone(),
                })
        })
        .collect()
}

pub fn analysis(tree: &SyntaxTree, file_path: &str) -> AnalysisResult {
    let PreprocessorDirectives {
        includes,
        defines,
        conditionals,
    } = directives(tree);

    AnalysisResult {
        file_path: file_path.to_string(),
        functions: functions(tree, file_path),
        includes,
        defines,
        conditionals,
        structs: structs(tree),
        enums: enums(tree),
        typedefs: typedefs(tree),
        globals: globals(tree),
    }
}

/// Direct calls by name for every defined function
pub fn call_graph(tree: &SyntaxTree) -> CallGraph {
    let mut graph: std::collections::BTreeMap<String, BTreeSet<String>> = Default::default();
    for def in &tree.functions {
        graph
            .entry(def.name.clone())
            .or_default()
            .extend(def.body.calls.iter().map(|c| c.name.clone()));
    }
    graph
        .into_iter()
        .map(|(caller, callees)| (caller, callees.into_iter().collect()))
        .collect()
}

pub fn dependencies(tree: &SyntaxTree, name: &str) -> Result<FunctionDependencies> {
    let def = target(tree, name)?;

    let mut types = BTreeSet::new();
    let mut macros = BTreeSet::new();
    for used in tree.names_in(def) {
        match used.role {
            Role::Type => {
                types.insert(used.text.clone());
            }
            Role::Identifier if is_macro_name(&used.text) => {
                macros.insert(used.text.clone());
            }
            _ => {}
        }
    }

    Ok(FunctionDependencies {
        function: name.to_string(),
        calls: sorted_unique(def.body.calls.iter().map(|c| c.name.clone())),
        types: types.into_iter().collect(),
        macros: macros.into_iter().collect(),
    })
}

pub fn summary(tree: &SyntaxTree, name: &str, heuristics: &Heuristics) -> Result<FunctionSummary> {
    let def = target(tree, name)?;
    let calls = &def.body.calls;

    Ok(FunctionSummary {
        function: name.to_string(),
        allocates_memory: calls.iter().any(|c| heuristics.is_allocator(&c.name)),
        frees_memory: calls.iter().any(|c| heuristics.is_deallocator(&c.name)),
        multiple_returns: def.body.returns.len() > 1,
        uses_goto: !def.body.gotos.is_empty(),
        return_count: def.body.returns.len(),
        call_count: calls.len(),
    })
}

/// Lines of every identifier node spelled `symbol`, macro definitions included
pub fn find_symbol(tree: &SyntaxTree, symbol: &str) -> SymbolOccurrences {
    let lines = tree
        .names()
        .iter()
        .filter(|n| n.role == Role::Identifier && n.text == symbol)
        .map(|n| n.line)
        .collect();

    SymbolOccurrences {
        symbol: symbol.to_string(),
        lines,
    }
}

/// Returns and gotos of a function in source order
pub fn error_paths(tree: &SyntaxTree, name: &str) -> Result<Vec<ErrorPath>> {
    let def = target(tree, name)?;

    let mut paths: Vec<ErrorPath> = def
        .body
        .returns
        .iter()
        .map(|r| ErrorPath {
            line: r.line,
            kind: ErrorPathKind::Return,
            detail: r.value.clone(),
        })
        .chain(def.body.gotos.iter().map(|g| ErrorPath {
            line: g.line,
            kind: ErrorPathKind::Goto,
            detail: Some(g.label.clone()),
        }))
        .collect();
    paths.sort_by_key(|p| p.line);
    Ok(paths)
}

pub fn side_effects(tree: &SyntaxTree, name: &str, heuristics: &Heuristics) -> Result<SideEffects> {
    let def = target(tree, name)?;
    let calls = &def.body.calls;

    Ok(SideEffects {
        io: sorted_unique(
            calls
                .iter()
                .filter(|c| heuristics.is_io(&c.name))
                .map(|c| c.name.clone()),
        ),
        allocates_memory: calls.iter().any(|c| heuristics.is_allocator(&c.name)),
        frees_memory: calls.iter().any(|c| heuristics.is_deallocator(&c.name)),
        modifies_globals: modified_globals(tree, def),
    })
}

/// Globals assigned, compound-assigned, incremented or decremented in the
/// body, unless shadowed by a parameter or local
fn modified_globals(tree: &SyntaxTree, def: &FunctionDef) -> Vec<String> {
    let shadowed: HashSet<String> = def
        .parameter_names()
        .into_iter()
        .chain(def.body.locals.iter().cloned())
        .collect();
    let candidates: HashSet<String> = globals(tree)
        .into_iter()
        .map(|g| g.name)
        .filter(|name| !shadowed.contains(name))
        .collect();

    sorted_unique(
        def.body
            .writes
            .iter()
            .filter(|name| candidates.contains(*name))
            .cloned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    const SOURCE: &str = r#"#include <stdlib.h>
#define LIMIT 8

typedef struct node {
    int value;
    struct node *next;
} node_t;

static int total = 0;
int hits[LIMIT];
char *label, buffer[16];
int helper(int);

node_t *push(node_t *head, int value) {
    node_t *n = malloc(sizeof(node_t));
    if (!n) {
        return NULL;
    }
    n->value = value;
    n->next = head;
    total += value;
    hits[value % LIMIT]++;
    return n;
}

int drain(node_t *head) {
    int total = 0;
    while (head) {
        node_t *next = head->next;
        total += head->value;
        free(head);
        head = next;
    }
    if (total < 0)
        goto fail;
    printf("%d\n", total);
    return total;
fail:
    return -1;
}
"#;

    #[test]
    fn test_globals_exclude_prototypes_and_typedefs() {
        let tree = parse(SOURCE).unwrap();
        let names: Vec<String> = globals(&tree).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["total", "hits", "label", "buffer"]);
        let label = globals(&tree).into_iter().find(|g| g.name == "label").unwrap();
        assert_eq!(label.type_name, "char *");
        let total = globals(&tree).into_iter().find(|g| g.name == "total").unwrap();
        assert_eq!(total.storage.as_deref(), Some("static"));
    }

    #[test]
    fn test_call_graph_sorted_unique() {
        let tree = parse(SOURCE).unwrap();
        let graph = call_graph(&tree);
        assert_eq!(graph["push"], vec!["malloc"]);
        assert_eq!(graph["drain"], vec!["free", "printf"]);
    }

    #[test]
    fn test_dependencies_collect_types_and_macros() {
        let tree = parse(SOURCE).unwrap();
        let deps = dependencies(&tree, "push").unwrap();
        assert_eq!(deps.calls, vec!["malloc"]);
        assert_eq!(deps.types, vec!["node_t"]);
        assert_eq!(deps.macros, vec!["LIMIT", "NULL"]);
    }

    #[test]
    fn test_summary_and_error_paths() {
        let tree = parse(SOURCE).unwrap();
        let heuristics = Heuristics::default();
        let summary = summary(&tree, "drain", &heuristics).unwrap();
        assert!(summary.frees_memory);
        assert!(!summary.allocates_memory);
        assert!(summary.uses_goto);
        assert!(summary.multiple_returns);
        assert_eq!(summary.return_count, 2);

        let paths = error_paths(&tree, "drain").unwrap();
        let kinds: Vec<ErrorPathKind> = paths.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorPathKind::Goto, ErrorPathKind::Return, ErrorPathKind::Return]
        );
        assert_eq!(paths[0].detail.as_deref(), Some("fail"));
        assert_eq!(paths[2].detail.as_deref(), Some("-1"));
    }

    #[test]
    fn test_side_effects_respect_shadowing() {
        let tree = parse(SOURCE).unwrap();
        let heuristics = Heuristics::default();

        let push = side_effects(&tree, "push", &heuristics).unwrap();
        assert!(push.allocates_memory);
        assert!(push.io.is_empty());
        assert_eq!(push.modifies_globals, vec!["hits", "total"]);

        let drain = side_effects(&tree, "drain", &heuristics).unwrap();
        assert_eq!(drain.io, vec!["printf"]);
        assert!(drain.frees_memory);
        assert!(drain.modifies_globals.is_empty());
    }

    #[test]
    fn test_missing_function_is_an_error() {
        let tree = parse(SOURCE).unwrap();
        let err = dependencies(&tree, "nope").unwrap_err();
        assert_eq!(err.to_string(), "Function 'nope' not found");
        assert!(function_body(&tree, "nope").is_none());
    }

    #[test]
    fn test_find_symbol_skips_fields_and_includes_defines() {
        let tree = parse(SOURCE).unwrap();
        assert_eq!(find_symbol(&tree, "LIMIT").lines, vec![2, 10, 22]);
        // `value` is a parameter in push and a field elsewhere
        assert_eq!(find_symbol(&tree, "value").lines, vec![14, 19, 21, 22]);
    }

    #[test]
    fn test_structs_and_typedefs() {
        let tree = parse(SOURCE).unwrap();
        let structs = structs(&tree);
        assert_eq!(structs.len(), 1);
        assert_eq!(structs[0].name, "node");
        assert_eq!(structs[0].fields.len(), 2);
        assert_eq!(structs[0].fields[1].name, "*next");
        let typedefs = typedefs(&tree);
        assert_eq!(typedefs[0].name, "node_t");
        assert_eq!(typedefs[0].underlying, "struct node");
    }

    #[test]
    fn test_old_style_definition_is_a_function_not_globals() {
        let tree = parse("int kr(a, b)\nint a;\nint b;\n{\n    return a + b;\n}\n").unwrap();
        let names: Vec<String> = functions(&tree, "kr.c").into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["kr"]);
        assert_eq!(function_body(&tree, "kr").as_deref(), Some("{\n    return a + b;\n}"));
        assert!(globals(&tree).is_empty());
    }

    #[test]
    fn test_function_pointer_global_and_typedef_types() {
        let tree = parse("int (*handler)(int) = 0;\ntypedef int (*cb_t)(int);\n").unwrap();
        let globals = globals(&tree);
        assert_eq!(globals.len(), 1);
        assert_eq!(globals[0].name, "handler");
        assert_eq!(globals[0].type_name, "int (*)(int)");
        assert_eq!(typedefs(&tree)[0].underlying, "int (*)(int)");
    }

    #[test]
    fn test_is_macro_name() {
        assert!(is_macro_name("MAX_SIZE"));
        assert!(is_macro_name("X1"));
        assert!(!is_macro_name("_"));
        assert!(!is_macro_name("Point"));
        assert!(!is_macro_name("add"));
    }
}
