//! vidpulse CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vidpulse::{
    commands::{cmd_init, cmd_report, cmd_suggest, print_report, print_suggestions, ReportOptions},
    config::Config,
    error::Result,
    progress::LogWriterFactory,
};

#[derive(Parser)]
#[command(name = "vidpulse")]
#[command(version, about = "Rank fast-growing YouTube videos for a topic", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Fetch recent videos for a topic and rank them
    Report {
        /// Search topic (defaults to search.topic from the config)
        topic: Option<String>,

        /// Look back this many hours
        #[arg(long)]
        hours: Option<u32>,

        /// Maximum search results (1-50)
        #[arg(long)]
        max_results: Option<u32>,

        /// View count for the fastest-to-threshold view
        #[arg(long)]
        threshold: Option<u64>,

        /// Rows in the top-N views
        #[arg(long)]
        top: Option<usize>,

        /// Also export all rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Drop videos that have no statistics
        #[arg(long)]
        inner_join: bool,
    },

    /// Autocomplete a topic prefix
    Suggest {
        /// Partial topic text
        prefix: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        if e.is_upstream() {
            eprintln!("The YouTube API call failed. Check your API key, quota and network.");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            handle_init(cli.config, force).await?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "vidpulse", &mut std::io::stdout());
        }

        Commands::Report {
            topic,
            hours,
            max_results,
            threshold,
            top,
            csv,
            inner_join,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = ReportOptions {
                topic,
                hours,
                max_results,
                threshold,
                top,
                csv,
                inner_join,
            };

            let report = cmd_report(&config, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Suggest { prefix } => {
            let config = load_config(cli.config.as_deref())?;
            let suggestions = cmd_suggest(&config, &prefix).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                print_suggestions(&prefix, &suggestions);
            }
        }
    }

    Ok(())
}

async fn handle_init(config: Option<PathBuf>, force: bool) -> Result<()> {
    // A .toml path names the file itself; anything else is its directory
    let base_dir = config.map(|path| {
        if path.extension().is_some_and(|e| e == "toml") {
            path.parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir)
        } else {
            path
        }
    });

    let config = cmd_init(base_dir, force).await?;

    println!("✓ vidpulse initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("\nNext steps:");
    println!("  1. Edit the config file to set your default topic");
    println!("  2. Export your API key: export {}=...", config.api_key_env);
    println!("  3. Run a report: vidpulse report");

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
