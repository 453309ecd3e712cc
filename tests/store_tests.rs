//! Persistence and search behavior of the on-disk vector store.

use std::collections::HashMap;

use localrag::document::Chunk;
use localrag::error::RagError;
use localrag::ondisk::OnDiskVectorStore;
use localrag::vectorstore::VectorStore;
use proptest::prelude::*;

fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: format!("text of {id}"),
        embedding,
        metadata: HashMap::new(),
        document_id: "doc".to_string(),
    }
}

#[tokio::test]
async fn snapshot_survives_reopening() {
    let temp = tempfile::tempdir().unwrap();

    let store = OnDiskVectorStore::open(temp.path()).await.unwrap();
    store.create_collection("docs", 3).await.unwrap();
    store
        .upsert(
            "docs",
            &[chunk("a_0", vec![1.0, 0.0, 0.0]), chunk("b_0", vec![0.0, 1.0, 0.0])],
        )
        .await
        .unwrap();
    drop(store);

    let reopened = OnDiskVectorStore::open_existing(temp.path()).await.unwrap();
    assert!(reopened.collection_exists("docs").await.unwrap());
    let results = reopened.search("docs", &[1.0, 0.0, 0.0], 10).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, "a_0");
    assert_eq!(results[0].chunk.text, "text of a_0");
}

#[tokio::test]
async fn upsert_is_idempotent_by_chunk_id() {
    let temp = tempfile::tempdir().unwrap();
    let store = OnDiskVectorStore::open(temp.path()).await.unwrap();
    store.create_collection("docs", 2).await.unwrap();

    let chunks = [chunk("a_0", vec![1.0, 0.0]), chunk("a_1", vec![0.0, 1.0])];
    store.upsert("docs", &chunks).await.unwrap();
    store.upsert("docs", &chunks).await.unwrap();

    let results = store.search("docs", &[1.0, 0.0], 10).await.unwrap();
    assert_eq!(results.len(), 2, "re-upserting the same ids must not grow the collection");
}

#[tokio::test]
async fn missing_persistence_directory_is_a_config_error() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("never_ingested");

    let err = OnDiskVectorStore::open_existing(&missing).await.unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
    let message = err.to_string();
    assert!(message.contains("ingest"), "error should tell the user to run ingestion");
}

#[tokio::test]
async fn dimensionality_is_enforced() {
    let temp = tempfile::tempdir().unwrap();
    let store = OnDiskVectorStore::open(temp.path()).await.unwrap();
    store.create_collection("docs", 3).await.unwrap();

    // Recreating with the same dimensionality is a no-op.
    store.create_collection("docs", 3).await.unwrap();
    // Recreating with a different one is the ingested-with-another-model hazard.
    let err = store.create_collection("docs", 8).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStore { .. }));

    let err = store.upsert("docs", &[chunk("a_0", vec![1.0, 0.0])]).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStore { .. }));

    let err = store.search("docs", &[1.0, 0.0], 5).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStore { .. }));
}

#[tokio::test]
async fn upsert_into_unknown_collection_fails() {
    let temp = tempfile::tempdir().unwrap();
    let store = OnDiskVectorStore::open(temp.path()).await.unwrap();

    let err = store.upsert("ghost", &[chunk("a_0", vec![1.0])]).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStore { .. }));
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", arb_normalized_embedding(dim)).prop_map(|(id, embedding)| chunk(&id, embedding))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Search returns at most `top_k` results, ordered by descending
    /// cosine similarity, regardless of what was stored.
    #[test]
    fn search_is_ordered_and_bounded(
        chunks in proptest::collection::vec(arb_chunk(8), 1..16),
        query in arb_normalized_embedding(8),
        top_k in 1usize..20,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, unique) = rt.block_on(async {
            let temp = tempfile::tempdir().unwrap();
            let store = OnDiskVectorStore::open(temp.path()).await.unwrap();
            store.create_collection("docs", 8).await.unwrap();

            let mut by_id: HashMap<String, Chunk> = HashMap::new();
            for c in &chunks {
                by_id.entry(c.id.clone()).or_insert_with(|| c.clone());
            }
            let unique: Vec<Chunk> = by_id.into_values().collect();
            store.upsert("docs", &unique).await.unwrap();

            (store.search("docs", &query, top_k).await.unwrap(), unique.len())
        });

        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= unique);
        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
        }
    }
}
