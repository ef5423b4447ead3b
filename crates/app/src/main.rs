mod answer;
mod router;
mod weather;

use answer::{AnswerGenerator, ChatConfig};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_rag_core::{
    discover_pdf_files, CharacterNgramEmbedder, Document, EmbeddingConfig, EmbeddingProvider,
    IngestError, IngestionOptions, IngestionPipeline, LopdfExtractor, OpenAiEmbedder, QdrantConfig,
    QdrantStore, RetrievalOptions, Retriever, VectorIndex, DEFAULT_EMBEDDING_DIMENSIONS,
};
use router::{decide_action, extract_city, Action};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weather::{format_weather_summary, WeatherClient};

#[derive(Parser)]
#[command(name = "pdf-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant API key
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    qdrant_api_key: Option<String>,

    /// Collection holding the document chunks
    #[arg(long, env = "QDRANT_COLLECTION", default_value = pdf_rag_core::DEFAULT_COLLECTION)]
    collection: String,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

#[derive(Args)]
struct EmbeddingArgs {
    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Openai)]
    embedder: EmbedderKind,

    /// OpenAI-compatible base URL, or the Azure OpenAI resource URL
    #[arg(long, env = "EMBEDDING_ENDPOINT", default_value = "https://api.openai.com/v1")]
    embedding_endpoint: String,

    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    embedding_api_key: Option<String>,

    /// Model name, or Azure deployment name
    #[arg(long, env = "EMBEDDING_MODEL", default_value = pdf_rag_core::DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Azure OpenAI API version; switches to Azure URL and header conventions
    #[arg(long, env = "EMBEDDING_API_VERSION")]
    embedding_api_version: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Remote OpenAI-compatible embeddings
    Openai,
    /// Offline hashed character trigrams
    Ngram,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a PDF file, or every PDF under a folder.
    Ingest {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, env = "CHUNK_SIZE", default_value_t = pdf_rag_core::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        #[arg(long, env = "CHUNK_OVERLAP", default_value_t = pdf_rag_core::DEFAULT_CHUNK_OVERLAP)]
        chunk_overlap: usize,
        /// Attempts per document when the embedding provider throttles.
        #[arg(long, default_value = "3")]
        max_attempts: usize,
    },
    /// Print the context chunks retrieved for a query.
    Retrieve {
        #[arg(long)]
        query: String,
        #[arg(long, env = "TOP_K")]
        top_k: Option<usize>,
    },
    /// Print the grounded prompt for a question without calling a model.
    Prompt {
        #[arg(long)]
        query: String,
        #[arg(long, env = "TOP_K")]
        top_k: Option<usize>,
    },
    /// Route a question to the weather lookup or to grounded document QA.
    Ask {
        #[arg(long)]
        query: String,
        #[arg(long, env = "TOP_K")]
        top_k: Option<usize>,
        #[command(flatten)]
        chat: ChatArgs,
        #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
        openweather_api_key: Option<String>,
    },
}

#[derive(Args)]
struct ChatArgs {
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "https://api.openai.com/v1")]
    chat_endpoint: String,
    #[arg(long, env = "CHAT_API_KEY", hide_env_values = true)]
    chat_api_key: Option<String>,
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o-mini")]
    chat_model: String,
    #[arg(long, env = "CHAT_API_VERSION")]
    chat_api_version: Option<String>,
}

struct SkippedPdf {
    path: PathBuf,
    reason: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-rag boot"
    );

    let index = Arc::new(QdrantStore::new(
        &QdrantConfig::new(&cli.qdrant_url).with_api_key(cli.qdrant_api_key.clone()),
    )?);

    match cli.command {
        Command::Ingest {
            path,
            chunk_size,
            chunk_overlap,
            max_attempts,
        } => {
            let options = IngestionOptions {
                collection: cli.collection.clone(),
                chunk_size,
                chunk_overlap,
                ..IngestionOptions::default()
            };
            let embedder = build_embedder(&cli.embedding)?;
            let pipeline = IngestionPipeline::new(LopdfExtractor, embedder, index, options)?;
            ingest_path(&pipeline, &path, max_attempts).await?;
        }
        Command::Retrieve { query, top_k } => {
            let embedder = build_embedder(&cli.embedding)?;
            let retriever = Retriever::new(embedder, index, retrieval_options(&cli.collection));
            let contexts = match retriever.retrieve(&query, top_k).await {
                Err(error) if error.is_missing_collection() => {
                    warn!(%error, "collection has not been ingested yet");
                    Vec::new()
                }
                result => result?,
            };
            if contexts.is_empty() {
                println!("no related documents found");
            }
            for (rank, context) in contexts.iter().enumerate() {
                println!("[{}]\n{context}\n", rank + 1);
            }
        }
        Command::Prompt { query, top_k } => {
            let embedder = build_embedder(&cli.embedding)?;
            let retriever = Retriever::new(embedder, index, retrieval_options(&cli.collection));
            let grounded = retriever.grounded_prompt(&query, top_k).await;
            println!("{}", grounded.prompt);
        }
        Command::Ask {
            query,
            top_k,
            chat,
            openweather_api_key,
        } => match decide_action(&query) {
            Action::Weather => {
                let city = extract_city(&query);
                info!(action = "weather", %city, "routing query");
                let client = WeatherClient::new(openweather_api_key.unwrap_or_default())?;
                let weather = client.current(&city).await?;
                println!("{}", format_weather_summary(&weather));
            }
            Action::Document => {
                info!(action = "pdf_rag", "routing query");
                let embedder = build_embedder(&cli.embedding)?;
                let retriever = Retriever::new(embedder, index, retrieval_options(&cli.collection));
                let grounded = retriever.grounded_prompt(&query, top_k).await;
                let generator = AnswerGenerator::new(&ChatConfig {
                    endpoint: chat.chat_endpoint,
                    api_key: chat.chat_api_key.unwrap_or_default(),
                    model: chat.chat_model,
                    api_version: chat.chat_api_version,
                })?;
                let answer = generator.generate(&grounded.prompt).await?;
                println!("{answer}");
                info!(contexts = grounded.contexts.len(), "answered from documents");
            }
        },
    }

    Ok(())
}

fn build_embedder(args: &EmbeddingArgs) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match args.embedder {
        EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder::new(DEFAULT_EMBEDDING_DIMENSIONS)),
        EmbedderKind::Openai => {
            let mut config = EmbeddingConfig::new(
                &args.embedding_endpoint,
                args.embedding_api_key.clone().unwrap_or_default(),
            );
            config.model = args.embedding_model.clone();
            config.api_version = args.embedding_api_version.clone();
            Arc::new(OpenAiEmbedder::new(&config)?)
        }
    };
    Ok(embedder)
}

fn retrieval_options(collection: &str) -> RetrievalOptions {
    RetrievalOptions {
        collection: collection.to_string(),
        ..RetrievalOptions::default()
    }
}

async fn ingest_path<E, V>(
    pipeline: &IngestionPipeline<LopdfExtractor, E, V>,
    path: &Path,
    max_attempts: usize,
) -> anyhow::Result<()>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    if path.is_file() {
        let written = ingest_with_retry(pipeline, path, max_attempts).await?;
        println!("{written} chunks ingested from {}", path.display());
        return Ok(());
    }

    let files = discover_pdf_files(path);
    anyhow::ensure!(!files.is_empty(), "no pdf files found in {}", path.display());

    let mut total = 0usize;
    let mut skipped = Vec::new();
    for file in files {
        match ingest_with_retry(pipeline, &file, max_attempts).await {
            Ok(written) => total += written,
            Err(error) => skipped.push(SkippedPdf {
                path: file,
                reason: error.to_string(),
            }),
        }
    }

    if !skipped.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            skipped.len(),
            path.display()
        );
        for skipped in &skipped {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
        }
    }

    println!(
        "{total} chunks ingested at {} ({} file(s) skipped)",
        Utc::now().to_rfc3339(),
        skipped.len()
    );
    Ok(())
}

/// Retries only throttled embedding calls. Nothing is written before embedding succeeds, so a retry
/// cannot duplicate points.
async fn ingest_with_retry<E, V>(
    pipeline: &IngestionPipeline<LopdfExtractor, E, V>,
    path: &Path,
    max_attempts: usize,
) -> Result<usize, IngestError>
where
    E: EmbeddingProvider,
    V: VectorIndex,
{
    let document = Document::from_path(path)?;
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match pipeline.ingest(&document).await {
            Err(IngestError::Embedding(error)) if error.is_retryable() && attempt < max_attempts => {
                let delay = error.retry_after().unwrap_or_else(|| retry_backoff(attempt));
                warn!(path = %path.display(), attempt, ?delay, "embedding throttled, backing off");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[cfg(test)]
mod tests {
    use super::retry_backoff;
    use clap::CommandFactory;
    use std::time::Duration;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1_000));
        assert_eq!(retry_backoff(2), Duration::from_millis(2_000));
        assert_eq!(retry_backoff(5), retry_backoff(9));
    }

    #[test]
    fn cli_definition_is_consistent() {
        super::Cli::command().debug_assert();
    }
}
