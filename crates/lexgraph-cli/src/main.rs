//! LexGraph CLI - Command-line interface
//!
//! Usage:
//!   lexgraph process [<path>] [--dir data/pdfs] [--save] [--clear] [--json out.json]
//!   lexgraph check
//!   lexgraph stats
//!   lexgraph clear [--yes]
//!   lexgraph article <number>
//!
//! Author: hephaex@gmail.com

mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lexgraph_core::{AppConfig, LlmClient, LoggingConfig};
use lexgraph_extractor::LegalGraphPipeline;
use lexgraph_graph::{GraphPersister, SurrealDbStore};
use lexgraph_llm::create_llm_client;

use crate::display::{CliObserver, SourceChoice};

/// Prompt used by `check` to verify the model answers at all
const PING_PROMPT: &str = "안녕하세요. 간단히 인사해주세요.";

#[derive(Parser)]
#[command(name = "lexgraph")]
#[command(about = "Statute knowledge graph builder")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true, env = "LEXGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a knowledge graph from a statute file
    Process {
        /// Statute source (.pdf, .md, .txt); chosen from --dir when omitted
        path: Option<PathBuf>,

        /// Directory listed when no path is given
        #[arg(long, default_value = "data/pdfs")]
        dir: PathBuf,

        /// Document title (defaults to file metadata or name)
        #[arg(long)]
        title: Option<String>,

        /// Law number, e.g. "법률 제19234호"
        #[arg(long, default_value = "")]
        law_number: String,

        /// Save the result to the graph database
        #[arg(long)]
        save: bool,

        /// Clear the graph database before saving
        #[arg(long, requires = "save")]
        clear: bool,

        /// Skip confirmation prompts
        #[arg(long, short)]
        yes: bool,

        /// Write the extracted document as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Rows shown per table
        #[arg(long, default_value_t = 20)]
        max_rows: usize,
    },
    /// Check the language model connection
    Check,
    /// Show graph database statistics
    Stats,
    /// Delete everything in the graph database
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show a stored article and its relations
    Article {
        /// Article number, e.g. "제3조"
        number: String,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("lexgraph_cli={level},lexgraph_extractor={level},lexgraph_llm={level},lexgraph_graph={level}").into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Let the user pick a source from `dir`
fn choose_source(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let sources = lexgraph_parser::list_sources(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    if sources.is_empty() {
        println!("No source files in {}", dir.display());
        println!("Put statute files (.pdf, .md, .txt) there or pass a path");
        return Ok(None);
    }

    let choices = sources
        .into_iter()
        .map(|path| SourceChoice {
            pages: lexgraph_parser::page_count(&path),
            path,
        })
        .collect();
    display::select_source(dir, choices)
}

async fn connect(config: &AppConfig) -> anyhow::Result<GraphPersister<SurrealDbStore>> {
    let store = SurrealDbStore::new(&config.database)
        .await
        .context("Failed to connect to the graph database")?;
    Ok(GraphPersister::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Process {
            path,
            dir,
            title,
            law_number,
            save,
            clear,
            yes,
            json,
            max_rows,
        } => {
            let path = match path {
                Some(path) => path,
                None => match choose_source(&dir)? {
                    Some(path) => path,
                    None => bail!("No source file selected"),
                },
            };

            let source = lexgraph_parser::load_source(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            tracing::info!(
                file = %source.metadata.file_name,
                pages = ?source.metadata.page_count,
                chars = source.text.chars().count(),
                "Source loaded"
            );

            let mut document = source.into_document(law_number);
            if let Some(title) = title {
                document.title = title;
            }

            let client = create_llm_client(&config.llm)?;
            let pipeline =
                LegalGraphPipeline::from_client(client).with_observer(Arc::new(CliObserver::new()));
            let outcome = pipeline.process(document).await;

            display::print_summary(&outcome.document, &outcome.errors, max_rows);

            if let Some(out) = json {
                let body = serde_json::to_string_pretty(&outcome.document)?;
                std::fs::write(&out, body)
                    .with_context(|| format!("Failed to write {}", out.display()))?;
                println!("\nWrote {}", out.display());
            }

            if save {
                let persister = connect(&config).await?;
                if clear {
                    if yes || display::confirm("Delete all existing graph data?")? {
                        persister.clear_database().await?;
                    } else {
                        println!("Keeping existing graph data");
                    }
                }
                persister.create_indexes().await?;
                let report = persister.save_document(&outcome.document).await?;
                display::print_save_report(&report);
            }
        }
        Commands::Check => {
            let client = create_llm_client(&config.llm)?;
            println!("Checking {} ({})...", client.name(), config.llm.provider);

            match client.generate(PING_PROMPT).await {
                Ok(reply) => {
                    println!("OK: {}", display::truncate(&reply, 100));
                }
                Err(e) => {
                    bail!("LLM connection failed: {e}");
                }
            }
        }
        Commands::Stats => {
            let persister = connect(&config).await?;
            let stats = persister.statistics().await?;
            display::print_statistics(&stats);
        }
        Commands::Clear { yes } => {
            if !yes && !display::confirm("Delete all graph data?")? {
                println!("Cancelled");
                return Ok(());
            }
            let persister = connect(&config).await?;
            persister.clear_database().await?;
            println!("Graph database cleared");
        }
        Commands::Article { number } => {
            let persister = connect(&config).await?;
            let Some(article) = persister.query_article(&number).await? else {
                bail!("Article {number} not found");
            };
            let relations = persister.query_relations(&number).await?;
            display::print_article(&article, &relations);
        }
    }

    Ok(())
}
