//! Human-readable output for analysis results

use colored::Colorize;
use std::fmt::Write;

use crate::analysis::{
    AnalysisResult, CallGraph, ErrorPath, ErrorPathKind, FunctionDependencies, FunctionInfo,
    FunctionSummary, GlobalInfo, SideEffects, SymbolOccurrences,
};
use crate::preprocessor::{PreprocessorDirective, PreprocessorDirectives};

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        items.join(", ")
    }
}

fn heading(out: &mut String, title: &str, count: usize) {
    let _ = writeln!(out, "{} ({})", title.bold(), count);
}

pub fn function(f: &FunctionInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}",
        f.signature.cyan(),
        format!("lines {}-{}", f.start_line, f.end_line).dimmed()
    );
    if let Some(doc) = &f.doc_comment {
        for line in doc.lines() {
            let _ = writeln!(out, "    {}", line.italic());
        }
    }
    out
}

pub fn functions(list: &[FunctionInfo]) -> String {
    let mut out = String::new();
    heading(&mut out, "Functions", list.len());
    for f in list {
        out.push_str("  ");
        out.push_str(&function(f));
    }
    out
}

fn directive_line(d: &PreprocessorDirective) -> String {
    match &d.value {
        Some(value) if !value.is_empty() => format!(
            "  {:>4}  {} {}",
            d.line,
            d.content.yellow(),
            value
        ),
        _ => format!("  {:>4}  {}", d.line, d.content.yellow()),
    }
}

pub fn directives(d: &PreprocessorDirectives) -> String {
    let mut out = String::new();
    for (title, items) in [
        ("Includes", &d.includes),
        ("Defines", &d.defines),
        ("Conditionals", &d.conditionals),
    ] {
        heading(&mut out, title, items.len());
        for item in items {
            let _ = writeln!(out, "{}", directive_line(item));
        }
    }
    out
}

pub fn call_graph(graph: &CallGraph) -> String {
    let mut out = String::new();
    for (caller, callees) in graph {
        let _ = writeln!(out, "{} -> {}", caller.cyan(), list_or_none(callees));
    }
    out
}

pub fn dependencies(deps: &FunctionDependencies) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", deps.function.cyan().bold());
    let _ = writeln!(out, "  Calls:  {}", list_or_none(&deps.calls));
    let _ = writeln!(out, "  Types:  {}", list_or_none(&deps.types));
    let _ = writeln!(out, "  Macros: {}", list_or_none(&deps.macros));
    out
}

pub fn summary(s: &FunctionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", s.function.cyan().bold());
    let _ = writeln!(out, "  Allocates memory: {}", yes_no(s.allocates_memory));
    let _ = writeln!(out, "  Frees memory:     {}", yes_no(s.frees_memory));
    let _ = writeln!(out, "  Multiple returns: {} ({})", yes_no(s.multiple_returns), s.return_count);
    let _ = writeln!(out, "  Uses goto:        {}", yes_no(s.uses_goto));
    let _ = writeln!(out, "  Calls:            {}", s.call_count);
    out
}

fn global_line(g: &GlobalInfo) -> String {
    let storage = g
        .storage
        .as_deref()
        .map(|s| format!("{} ", s))
        .unwrap_or_default();
    format!("  {:>4}  {}{} {}", g.line, storage, g.type_name, g.name.cyan())
}

pub fn globals(list: &[GlobalInfo]) -> String {
    let mut out = String::new();
    heading(&mut out, "Globals", list.len());
    for g in list {
        let _ = writeln!(out, "{}", global_line(g));
    }
    out
}

pub fn symbol(s: &SymbolOccurrences) -> String {
    let lines: Vec<String> = s.lines.iter().map(u32::to_string).collect();
    format!(
        "{}: {} occurrence(s)\n  lines: {}\n",
        s.symbol.cyan(),
        s.lines.len(),
        list_or_none(&lines)
    )
}

pub fn error_paths(paths: &[ErrorPath]) -> String {
    if paths.is_empty() {
        return format!("{}\n", "(no returns or gotos)".dimmed());
    }
    let mut out = String::new();
    for p in paths {
        let kind = match p.kind {
            ErrorPathKind::Return => "return".green(),
            ErrorPathKind::Goto => "goto".red(),
        };
        match &p.detail {
            Some(detail) => {
                let _ = writeln!(out, "  {:>4}  {} {}", p.line, kind, detail);
            }
            None => {
                let _ = writeln!(out, "  {:>4}  {}", p.line, kind);
            }
        }
    }
    out
}

pub fn side_effects(s: &SideEffects) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  I/O:              {}", list_or_none(&s.io));
    let _ = writeln!(out, "  Allocates memory: {}", yes_no(s.allocates_memory));
    let _ = writeln!(out, "  Frees memory:     {}", yes_no(s.frees_memory));
    let _ = writeln!(out, "  Modifies globals: {}", list_or_none(&s.modifies_globals));
    out
}

pub fn analysis(a: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "File:".bold(), a.file_path);
    out.push('\n');
    out.push_str(&functions(&a.functions));
    out.push_str(&directives(&PreprocessorDirectives {
        includes: a.includes.clone(),
        defines: a.defines.clone(),
        conditionals: a.conditionals.clone(),
    }));

    heading(&mut out, "Structs", a.structs.len());
    for s in &a.structs {
        let _ = writeln!(
            out,
            "  {:>4}  {} {} ({} fields)",
            s.line,
            s.kind,
            s.name.cyan(),
            s.fields.len()
        );
        for field in &s.fields {
            let _ = writeln!(out, "          {} {}", field.type_name, field.name);
        }
    }

    heading(&mut out, "Enums", a.enums.len());
    for e in &a.enums {
        let names: Vec<String> = e.enumerators.iter().map(|v| v.name.clone()).collect();
        let _ = writeln!(out, "  {:>4}  enum {} {{ {} }}", e.line, e.name.cyan(), names.join(", "));
    }

    heading(&mut out, "Typedefs", a.typedefs.len());
    for t in &a.typedefs {
        let _ = writeln!(out, "  {:>4}  {} = {}", t.line, t.name.cyan(), t.underlying);
    }

    out.push_str(&globals(&a.globals));
    out
}
