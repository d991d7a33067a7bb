//! # butterfly CLI
//!
//! Command-line interface and HTTP server for the Butterfly blog.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "butterfly")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "butterfly.yml", env = "BUTTERFLY_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List articles, newest first
    List {
        /// Only show articles in this category
        #[arg(long)]
        category: Option<String>,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Render a single article
    Article {
        /// Article id (file name without extension)
        id: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = ArticleFormat::Json)]
        format: ArticleFormat,
    },

    /// Search article titles, descriptions and bodies
    Search {
        /// Search term (at least two characters)
        term: String,

        /// Maximum results to return
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Serve the JSON API and content images over HTTP
    Serve {
        /// Server port (overrides server.port from the config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum ArticleFormat {
    Json,
    Html,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::List { category, json } => {
            commands::list_articles(&cli.config, category.as_deref(), json)
        }
        Commands::Article { id, format } => commands::show_article(&cli.config, &id, format),
        Commands::Search { term, limit, json } => {
            commands::search_site(&cli.config, &term, limit, json)
        }
        Commands::Serve { port } => commands::serve(&cli.config, port).await,
    }
}
