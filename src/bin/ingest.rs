//! One-shot batch ingestion: index local documents into the vector
//! database.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use localrag::{
    OllamaClient, OllamaConfig, OnDiskVectorStore, RagConfig, RagError, RagPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "ingest", about = "Index local documents into the vector database")]
struct IngestArgs {
    /// Directory containing the documents to index
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Directory where the vector database is persisted
    #[arg(long, default_value = "./vector_db")]
    persist_dir: PathBuf,

    /// Collection name within the vector database
    #[arg(long, default_value = "ai_syllabus")]
    collection: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = localrag::ollama::DEFAULT_BASE_URL)]
    ollama_url: String,

    /// Embedding model name
    #[arg(long, env = "OLLAMA_EMBEDDING_MODEL", default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Dimensionality of the embedding model's vectors
    #[arg(long, default_value_t = 768)]
    embedding_dimensions: usize,

    /// Per-request timeout for Ollama calls, in seconds
    #[arg(long, default_value_t = 360)]
    request_timeout: u64,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = 512)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value_t = 100)]
    chunk_overlap: usize,
}

async fn run(args: IngestArgs) -> localrag::Result<()> {
    let config = RagConfig::builder()
        .collection(&args.collection)
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .build()?;

    let ollama = Arc::new(OllamaClient::new(
        OllamaConfig::default()
            .with_base_url(&args.ollama_url)
            .with_embedding_model(&args.embedding_model, args.embedding_dimensions)
            .with_request_timeout(Duration::from_secs(args.request_timeout)),
    )?);
    let store = Arc::new(OnDiskVectorStore::open(&args.persist_dir).await?);

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedder(ollama.clone())
        .generator(ollama)
        .store(store)
        .build()?;

    println!("--- Starting data ingestion ---");
    println!("Loading documents from '{}'...", args.data_dir.display());
    println!("Indexing may take a while depending on data size.");

    let stats = pipeline.ingest_directory(&args.data_dir).await?;

    println!(
        "Indexed {} chunk(s) from {} document(s) into collection '{}'.",
        stats.chunks, stats.documents, args.collection
    );
    println!("Index stored at '{}'.", args.persist_dir.display());
    println!("--- Data ingestion complete ---");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = IngestArgs::parse();

    if let Err(err) = run(args).await {
        match err {
            RagError::Config(message) => eprintln!("Error: {message}"),
            other => eprintln!("Ingestion failed: {other}"),
        }
        std::process::exit(1);
    }
}
