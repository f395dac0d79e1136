//! ccodetools - command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use ccodetools::{
    build_analyzer,
    cli::{run_query, Cli, Commands},
    config::Config,
    logging,
    server::McpServer,
    tools::{PathJail, ToolExecutor},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(cli.verbosity(), &config.logging.level)?;

    match &cli.command {
        Commands::Serve { root } => serve(cli, &config, root.as_deref()).await,
        Commands::Config => show_config(cli, &config),
        command => {
            let analyzer = build_analyzer(&config, cli.analyzer.as_deref(), !cli.no_cache)?;
            let command = command.clone();
            let rendered =
                tokio::task::spawn_blocking(move || run_query(&command, analyzer.as_ref()))
                    .await
                    .context("Analysis task failed")??;
            if let Some(text) = rendered {
                if text.ends_with('\n') {
                    print!("{}", text);
                } else {
                    println!("{}", text);
                }
            }
            Ok(())
        }
    }
}

async fn serve(cli: &Cli, config: &Config, root: Option<&std::path::Path>) -> Result<()> {
    let analyzer = build_analyzer(config, cli.analyzer.as_deref(), !cli.no_cache)?;
    let mut executor = ToolExecutor::new(analyzer);

    let root = root.map(|p| p.to_path_buf()).or_else(|| config.server_root());
    if let Some(root) = root {
        let jail = PathJail::new(&root)
            .with_context(|| format!("Invalid source root {}", root.display()))?;
        tracing::info!(root = %jail.jail_root().display(), "Confining tools to source root");
        executor = executor.with_jail(jail);
    }

    let server = McpServer::new(Arc::new(executor), config.server.name.clone());
    server.serve_stdio().await?;
    Ok(())
}

fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    let source = match (&cli.config, Config::default_path()) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(path)) if path.exists() => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    };

    println!("{} {}", "# Configuration from".dimmed(), source.dimmed());
    print!("{}", config.to_toml()?);
    Ok(())
}
