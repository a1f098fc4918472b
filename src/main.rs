use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use casetwin::config::Config;
use casetwin::extraction::extract_profile;
use casetwin::logging;
use casetwin::profile::CaseProfile;
use casetwin::search::CaseMatcher;
use casetwin::store::qdrant::QdrantStore;

#[derive(Parser)]
#[command(name = "casetwin", version, about = "Visual case matching with clinical-context re-ranking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find indexed cases similar to a query embedding
    Search {
        /// Path to a JSON file holding the query embedding (array of floats,
        /// pre-normalized by the embedding service)
        #[arg(long)]
        embedding: PathBuf,

        /// Optional path to a CaseProfile JSON file; enables context re-ranking
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Maximum number of matches to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Extract a structured CaseProfile from clinical notes
    Extract {
        /// Path to a plain-text notes file
        #[arg(long, conflicts_with = "text")]
        notes: Option<PathBuf>,

        /// Notes passed directly on the command line
        #[arg(long)]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // Logging goes to stderr only — stdout is reserved for JSON output
    logging::init_logging(&config);

    match cli.command {
        Commands::Search {
            embedding,
            profile,
            limit,
        } => {
            let raw = std::fs::read_to_string(&embedding)
                .with_context(|| format!("Failed to read embedding file {}", embedding.display()))?;
            let vector: Vec<f32> =
                serde_json::from_str(&raw).context("Embedding file must be a JSON array of floats")?;

            let parsed_profile: Option<CaseProfile> = match profile {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read profile file {}", path.display()))?;
                    match serde_json::from_str(&raw) {
                        Ok(p) => Some(p),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to parse profile JSON — searching without re-ranking");
                            None
                        }
                    }
                }
                None => None,
            };

            let limit = limit.unwrap_or(config.search.default_limit);
            if limit == 0 {
                anyhow::bail!("limit must be a positive integer");
            }

            let store = Arc::new(QdrantStore::new(&config.qdrant)?);
            tracing::info!(
                url = %config.qdrant.url,
                collection = %config.qdrant.collection,
                dimension = vector.len(),
                "Querying case index"
            );

            let matcher = CaseMatcher::new(store, config.search.clone());
            let matches = matcher
                .search_similar(&vector, parsed_profile.as_ref(), limit)
                .await?;

            let count = matches.len();
            let output = serde_json::json!({
                "matches": matches,
                "count": count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Extract { notes, text } => {
            let notes_text = match (notes, text) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read notes file {}", path.display()))?,
                (None, Some(text)) => text,
                (None, None) => anyhow::bail!("Provide clinical notes via --notes or --text"),
            };

            let profile = extract_profile(&notes_text);
            let output = serde_json::json!({ "profile": profile });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
