//! Command-line argument parsing for ccodetools
//!
//! One subcommand per analyzer operation plus `serve` and `config`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::Verbosity;

/// ccodetools - structural analysis of C source files
#[derive(Parser, Debug)]
#[command(name = "ccodetools")]
#[command(version)]
#[command(about = "Analyze C source files from the terminal or serve the analysis over MCP", long_about = None)]
pub struct Cli {
    /// Analyzer backend (default from config)
    #[arg(long, global = true)]
    pub analyzer: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable the analysis cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Verbosity level: -v (info), -vv (debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// A source file
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// C source file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// A function in a source file
#[derive(Args, Debug, Clone)]
pub struct FunctionArgs {
    /// C source file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Function name
    #[arg(value_name = "FUNCTION")]
    pub function: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// An identifier in a source file
#[derive(Args, Debug, Clone)]
pub struct SymbolArgs {
    /// C source file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Identifier to look for
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Complete structure of a file
    AnalyzeCFile(FileArgs),

    /// Functions with signature, lines and doc comment
    ListFunctions(FileArgs),

    /// Body of a function, braces included
    GetFunctionBody(FunctionArgs),

    /// Includes, defines and conditionals
    GetPreprocessorDirectives(FileArgs),

    /// Direct callees of every function
    GetCallGraph(FileArgs),

    /// Calls, types and macros a function uses
    GetFunctionDependencies(FunctionArgs),

    /// Heuristic summary of a function
    SummarizeFunction(FunctionArgs),

    /// File-scope variables
    ListGlobals(FileArgs),

    /// Lines where an identifier occurs
    FindSymbol(SymbolArgs),

    /// Returns and gotos of a function
    GetErrorHandlingPaths(FunctionArgs),

    /// I/O, allocation, frees and modified globals of a function
    ListSideEffects(FunctionArgs),

    /// Run the MCP server on stdin/stdout
    Serve {
        /// Only accept files under this directory (overrides config)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

impl Commands {
    /// Whether output should be JSON
    pub fn json(&self) -> bool {
        match self {
            Commands::AnalyzeCFile(a)
            | Commands::ListFunctions(a)
            | Commands::GetPreprocessorDirectives(a)
            | Commands::GetCallGraph(a)
            | Commands::ListGlobals(a) => a.json,
            Commands::GetFunctionBody(a)
            | Commands::GetFunctionDependencies(a)
            | Commands::SummarizeFunction(a)
            | Commands::GetErrorHandlingPaths(a)
            | Commands::ListSideEffects(a) => a.json,
            Commands::FindSymbol(a) => a.json,
            Commands::Serve { .. } | Commands::Config => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_kebab_case_subcommands() {
        let cli = Cli::try_parse_from(["ccodetools", "analyze-c-file", "a.c"]).unwrap();
        assert!(matches!(cli.command, Commands::AnalyzeCFile(ref a) if a.file == PathBuf::from("a.c")));

        let cli = Cli::try_parse_from(["ccodetools", "get-error-handling-paths", "a.c", "f", "--json"])
            .unwrap();
        match cli.command {
            Commands::GetErrorHandlingPaths(a) => {
                assert_eq!(a.function, "f");
                assert!(a.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ccodetools", "list-functions", "a.c", "--analyzer", "syntax", "--no-cache", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.analyzer.as_deref(), Some("syntax"));
        assert!(cli.no_cache);
        assert_eq!(cli.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_quiet() {
        let cli = Cli::try_parse_from(["ccodetools", "-q", "config"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
        assert!(!cli.command.json());
    }

    #[test]
    fn test_missing_function_argument() {
        assert!(Cli::try_parse_from(["ccodetools", "summarize-function", "a.c"]).is_err());
    }
}
