

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use folio::db::IndexSnapshot;
use folio::embeddings::EmbedderFactory;
use folio::jobs::EmbeddingJob;
use folio::{
    Book, EmbeddingStore, FolioConfig, FusionWeights, InMemoryCatalog, RecommendRequest,
    RecommendationEngine, SearchFilters, SearchResponse,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};


#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Search and recommend books by prompt, by seed book, or both")]
struct Cli {
    /// Config file (TOML/JSON/YAML). `FOLIO_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file: a JSON array of books.
    #[arg(long, global = true, default_value = "books.json")]
    catalog: PathBuf,

    /// Embedding index snapshot.
    #[arg(long, global = true, default_value = "index.json")]
    index: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only books in this language (catalog language code, e.g. `en`).
    #[arg(long)]
    lang: Option<String>,
    /// Only fiction (`true`) or only non-fiction (`false`).
    #[arg(long)]
    fiction: Option<bool>,
    #[arg(long)]
    min_year: Option<i32>,
    #[arg(long)]
    max_pages: Option<u32>,
}

impl From<FilterArgs> for SearchFilters {
    fn from(args: FilterArgs) -> Self {
        Self {
            language: args.lang,
            fiction: args.fiction,
            min_year: args.min_year,
            max_pages: args.max_pages,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed every catalog book and write the index snapshot.
    Index,

    /// Free-text semantic search.
    Search {
        text: String,
        #[arg(short, long)]
        k: Option<usize>,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Books similar to a seed book.
    Similar {
        book_id: i64,
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Prompt, seed, or a blend of both.
    Recommend {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        seed: Option<i64>,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        w_text: Option<f32>,
        #[arg(long)]
        w_seed: Option<f32>,
        /// JSON object of book id → collaborative-filtering score.
        #[arg(long)]
        cf_scores: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_response(response: &SearchResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = FolioConfig::load(cli.config.as_deref())?;

    let books: Vec<Book> = read_json(&cli.catalog).await?;
    let catalog = Arc::new(InMemoryCatalog::from_books(books));
    let embedder = EmbedderFactory::from_config(&config)?;
    let store = Arc::new(EmbeddingStore::in_memory(config.embedding_dim));

    if let Command::Index = cli.command {
        let job = EmbeddingJob::new(embedder.clone(), store.clone(), catalog, config.embed_batch_size);
        let report = job.run().await?;
        let snapshot = store.snapshot(embedder.model()).await?;
        tokio::fs::write(&cli.index, serde_json::to_vec(&snapshot)?)
            .await
            .with_context(|| format!("writing {}", cli.index.display()))?;
        info!("Wrote {} embeddings to {}", snapshot.records.len(), cli.index.display());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let snapshot: IndexSnapshot = read_json(&cli.index).await?;
    if snapshot.model != embedder.model() {
        anyhow::bail!(
            "index was built with model '{}' but the configured model is '{}'; re-run `folio index`",
            snapshot.model,
            embedder.model()
        );
    }
    store.restore(snapshot).await?;

    let engine = RecommendationEngine::from_config(&config, embedder, store, catalog)?;

    let response = match cli.command {
        Command::Index => unreachable!("handled above"),
        Command::Search { text, k, filters } => {
            let filters = SearchFilters::from(filters);
            if filters.is_empty() {
                engine.search_semantic(&text, k).await?
            } else {
                let mut request = RecommendRequest::text(text).with_filters(filters);
                request.k = k;
                engine.recommend(request).await?
            }
        }
        Command::Similar { book_id, k } => engine.similar(book_id, k).await?,
        Command::Recommend { text, seed, k, w_text, w_seed, cf_scores, filters } => {
            let mut request = RecommendRequest {
                text,
                seed_book_id: seed,
                k,
                filters: Some(filters.into()),
                ..Default::default()
            };
            if w_text.is_some() || w_seed.is_some() {
                let defaults = config.fusion_weights()?;
                request = request.with_weights(FusionWeights::new(
                    w_text.unwrap_or(defaults.w_text()),
                    w_seed.unwrap_or(defaults.w_seed()),
                )?);
            }
            if let Some(path) = cf_scores {
                let scores: HashMap<i64, f64> = read_json(&path).await?;
                request = request.with_secondary_scores(scores);
            }
            engine.recommend(request).await?
        }
    };

    print_response(&response)
}
