//! End-to-end pipeline behavior with test doubles at every service seam.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use localrag::{
    EmbeddingProvider, GenerationModel, OnDiskVectorStore, RagConfig, RagError, RagPipeline,
    TurnOutcome, run_turn,
};

/// Deterministic hash-based embeddings, with a call counter and a failure
/// toggle so tests can assert which turns reached the service.
struct MockEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockEmbedder {
    fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0), fail: AtomicBool::new(false) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> localrag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::Embedding {
                provider: "mock".to_string(),
                message: "injected failure".to_string(),
            });
        }
        // Direction depends only on the text, so equal text always lands
        // on the same point and retrieval is reproducible.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, v) in embedding.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Echoes the prompt back so tests can assert what context reached the
/// generation service.
struct MockGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockGenerator {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0), fail: AtomicBool::new(false) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationModel for MockGenerator {
    async fn generate(&self, prompt: &str) -> localrag::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::Generation {
                provider: "mock".to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(format!("echo of prompt: {prompt}"))
    }
}

struct Fixture {
    pipeline: RagPipeline,
    embedder: Arc<MockEmbedder>,
    generator: Arc<MockGenerator>,
    _temp: tempfile::TempDir,
}

async fn fixture_with_top_k(top_k: usize) -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let store = Arc::new(OnDiskVectorStore::open(temp.path().join("db")).await.unwrap());
    let embedder = Arc::new(MockEmbedder::new(16));
    let generator = Arc::new(MockGenerator::new());
    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().collection("docs").top_k(top_k).build().unwrap())
        .embedder(embedder.clone())
        .generator(generator.clone())
        .store(store)
        .build()
        .unwrap();
    Fixture { pipeline, embedder, generator, _temp: temp }
}

fn write_data_dir(root: &Path) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(
        root.join("geography.txt"),
        "The capital of France is Paris. France is in western Europe.",
    )
    .unwrap();
    std::fs::write(
        root.join("astronomy.txt"),
        "Jupiter is the largest planet in the solar system.",
    )
    .unwrap();
}

#[tokio::test]
async fn ingest_then_answer_grounds_the_response_in_source_text() {
    let f = fixture_with_top_k(4).await;
    let data = f._temp.path().join("data");
    write_data_dir(&data);

    let stats = f.pipeline.ingest_directory(&data).await.unwrap();
    assert_eq!(stats.documents, 2);
    assert!(stats.chunks >= 2);

    let answer = f.pipeline.answer("What is the capital of France?").await.unwrap();
    assert!(
        answer.contains("The capital of France is Paris."),
        "verbatim source text should reach the generation prompt: {answer}"
    );
}

#[tokio::test]
async fn missing_data_directory_fails_before_any_embedding_call() {
    let f = fixture_with_top_k(4).await;
    let missing = f._temp.path().join("no_such_dir");

    let err = f.pipeline.ingest_directory(&missing).await.unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
    assert_eq!(f.embedder.calls(), 0, "no embedding call may precede the directory check");
}

#[tokio::test]
async fn empty_data_directory_is_a_clean_no_op() {
    let f = fixture_with_top_k(4).await;
    let data = f._temp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    let stats = f.pipeline.ingest_directory(&data).await.unwrap();
    assert_eq!(stats.documents, 0);
    assert_eq!(stats.chunks, 0);
}

#[tokio::test]
async fn missing_collection_is_reported_with_remediation() {
    let f = fixture_with_top_k(4).await;

    let err = f.pipeline.require_collection().await.unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
    assert!(err.to_string().contains("ingest"));
    assert_eq!(f.embedder.calls(), 0);
    assert_eq!(f.generator.calls(), 0);
}

#[tokio::test]
async fn reingesting_an_unchanged_directory_does_not_grow_the_collection() {
    let f = fixture_with_top_k(50).await;
    let data = f._temp.path().join("data");
    write_data_dir(&data);

    let first = f.pipeline.ingest_directory(&data).await.unwrap();
    let results_after_first = f.pipeline.retrieve("France").await.unwrap();

    let second = f.pipeline.ingest_directory(&data).await.unwrap();
    let results_after_second = f.pipeline.retrieve("France").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(results_after_first.len(), results_after_second.len());

    // Every chunk from the first run is still retrievable by id.
    let mut first_ids: Vec<&str> =
        results_after_first.iter().map(|r| r.chunk.id.as_str()).collect();
    let mut second_ids: Vec<&str> =
        results_after_second.iter().map(|r| r.chunk.id.as_str()).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn exit_sentinel_never_reaches_the_services() {
    let f = fixture_with_top_k(4).await;

    for line in ["exit", "QUIT", "  Exit "] {
        let outcome = run_turn(&f.pipeline, line).await;
        assert!(matches!(outcome, TurnOutcome::Exit), "{line:?} should end the session");
    }
    assert_eq!(f.embedder.calls(), 0);
    assert_eq!(f.generator.calls(), 0);
}

#[tokio::test]
async fn a_failed_turn_leaves_the_session_usable() {
    let f = fixture_with_top_k(4).await;
    let data = f._temp.path().join("data");
    write_data_dir(&data);
    f.pipeline.ingest_directory(&data).await.unwrap();

    f.embedder.set_failing(true);
    let outcome = run_turn(&f.pipeline, "what is Jupiter?").await;
    let TurnOutcome::Failed(message) = outcome else {
        panic!("turn should fail while the embedding service is down");
    };
    assert!(message.contains("injected failure"));

    f.embedder.set_failing(false);
    let outcome = run_turn(&f.pipeline, "what is Jupiter?").await;
    let TurnOutcome::Answered(answer) = outcome else {
        panic!("session should recover once the service is healthy again");
    };
    assert!(answer.contains("Jupiter"));
}
