//! Interactive query session over an already-ingested collection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use localrag::{
    OllamaClient, OllamaConfig, OnDiskVectorStore, RagConfig, RagError, RagPipeline,
    run_console,
};

#[derive(Parser, Debug)]
#[command(name = "query", about = "Ask questions about your indexed documents")]
struct QueryArgs {
    /// Directory where the vector database is persisted
    #[arg(long, default_value = "./vector_db")]
    persist_dir: PathBuf,

    /// Collection name within the vector database
    #[arg(long, default_value = "ai_syllabus")]
    collection: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = localrag::ollama::DEFAULT_BASE_URL)]
    ollama_url: String,

    /// Embedding model name; must match the one used at ingestion time
    #[arg(long, env = "OLLAMA_EMBEDDING_MODEL", default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Dimensionality of the embedding model's vectors
    #[arg(long, default_value_t = 768)]
    embedding_dimensions: usize,

    /// Generation model name
    #[arg(long, env = "OLLAMA_GENERATION_MODEL", default_value = "llama3")]
    generation_model: String,

    /// Per-request timeout for Ollama calls, in seconds
    #[arg(long, default_value_t = 360)]
    request_timeout: u64,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = 4)]
    top_k: usize,
}

async fn run(args: QueryArgs) -> localrag::Result<()> {
    println!("--- Initializing offline assistant ---");

    // Precondition probes come first: a missing database or collection is
    // reported with remediation before any model call is attempted.
    let store = Arc::new(OnDiskVectorStore::open_existing(&args.persist_dir).await?);

    let config = RagConfig::builder().collection(&args.collection).top_k(args.top_k).build()?;
    let ollama = Arc::new(OllamaClient::new(
        OllamaConfig::default()
            .with_base_url(&args.ollama_url)
            .with_embedding_model(&args.embedding_model, args.embedding_dimensions)
            .with_generation_model(&args.generation_model)
            .with_request_timeout(Duration::from_secs(args.request_timeout)),
    )?);

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedder(ollama.clone())
        .generator(ollama)
        .store(store)
        .build()?;

    pipeline.require_collection().await?;

    println!("Assistant is ready! Ask questions about your indexed documents.");
    println!("Type 'exit' or 'quit' to end the session.");
    println!("---");

    run_console(&pipeline).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = QueryArgs::parse();

    if let Err(err) = run(args).await {
        match err {
            RagError::Config(message) => eprintln!("Error: {message}"),
            other => eprintln!("Query session failed: {other}"),
        }
        std::process::exit(1);
    }
}
