use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod repl;

use commands::run_query;
use config::{Config, OutputFormat};
use repl::Repl;

#[derive(Parser)]
#[command(name = "quake")]
#[command(
    author,
    version,
    about = "Quake - cached earthquake magnitude queries",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Query events by magnitude range
    Query {
        /// Earthquake CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Lower magnitude bound (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        min: f64,

        /// Upper magnitude bound (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        max: f64,

        /// Run the same query this many times
        #[arg(short, long, default_value = "1")]
        repeat: usize,

        /// Output format (table, json, csv)
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Start interactive REPL
    Repl {
        /// Earthquake CSV file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Query {
            file,
            min,
            max,
            repeat,
            output,
        } => {
            let output = output.unwrap_or(config.output_format);
            run_query(&config, &file, min, max, repeat, output).await?;
        }
        Commands::Repl { file } => {
            print_banner();
            let mut repl = Repl::new(config, &file).await?;
            repl.run().await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        "quake=debug,quake_core=debug,quake_cache=debug,quake_executor=debug,quake_storage=debug"
    } else {
        "quake=info,quake_cache=warn,quake_executor=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
   ____              _
  / __ \__  ______ _| | _____
 / / / / / / / __ `/ |/ / _ \
/ /_/ / /_/ / /_/ /   <  __/
\___\_\__,_/\__,_/_/|_\___|
    "#
        .bright_cyan()
    );
    println!(
        "{}",
        "Cached Earthquake Range Queries v0.1.0".bright_yellow()
    );
    println!("{}", "Type '.help' for available commands\n".bright_black());
}
