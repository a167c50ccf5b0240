//! boggart: decoy template toolkit.
//!
//! ```text
//! boggart --template decoy.yaml check
//! boggart --template decoy.yaml select -X POST /login
//! boggart --template decoy.yaml routes
//! boggart --config boggart.toml watch
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use boggart::observability::{logging, LogFormat};
use boggart::routing::Selector;
use boggart::settings::Settings;
use boggart::template::{load_validated, methods_as_strings, TemplateKind, TemplateStore, TemplateWatcher};

#[derive(Parser)]
#[command(name = "boggart", version)]
#[command(about = "Validate and query decoy HTTP templates", long_about = None)]
struct Cli {
    /// Template file (YAML, or TOML with a .toml extension)
    #[arg(short, long, global = true)]
    template: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive; RUST_LOG wins when set
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the template
    Check,
    /// Show which rule answers a request, as JSON
    Select {
        /// Request method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request path
        path: String,
    },
    /// List the rules of the template
    Routes,
    /// Keep the template loaded and reload it when the file changes
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    logging::init(&settings.logging);

    let path = cli
        .template
        .or(settings.template)
        .ok_or("no template given; pass --template or set `template` in the settings file")?;

    match cli.command {
        Commands::Check => {
            let template = load_validated(&path)?;
            println!(
                "{}: ok ({} template, {} rules, {} ignored paths)",
                path.display(),
                template.kind.as_ref().map(TemplateKind::as_str).unwrap_or("-"),
                template.requests.len(),
                template.ignore.len()
            );
        }
        Commands::Select { method, path: request_path } => {
            let selector = Selector::new(load_validated(&path)?);
            let selection = selector.select(&request_path, &method)?;
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
        Commands::Routes => {
            let template = load_validated(&path)?;
            if let Some(TemplateKind::Shodan) = template.kind {
                println!("shodan template, replaying ip {:?}", template.ip);
            }
            for rule in &template.requests {
                let endpoint = if rule.is_default() { "*" } else { rule.endpoint.as_str() };
                println!(
                    "{:<16} {:<24} {:<24} {:<5} {}",
                    rule.id,
                    methods_as_strings(&rule.methods).join(","),
                    endpoint,
                    rule.response_type.map(|r| r.as_str()).unwrap_or("-"),
                    rule.content_type
                );
            }
            for ignored in &template.ignore {
                println!("ignored {ignored}");
            }
        }
        Commands::Watch => {
            let store = Arc::new(TemplateStore::open(&path)?);
            let (watcher, updates) = TemplateWatcher::new(&path);
            let _watcher = watcher.run()?;

            let updater = Arc::clone(&store);
            tokio::spawn(async move {
                updater.apply_updates(updates).await;
            });

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
