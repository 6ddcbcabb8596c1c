use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::*;
use crate::{Artifact, EmbedError, StorePaths};

fn test_dir(prefix: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock must be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("chunkvault_store_{prefix}_{timestamp}"))
}

fn cleanup(root: &Path) {
    if root.exists() {
        fs::remove_dir_all(root).expect("temp directory should be removable");
    }
}

fn abc_store() -> VectorStore {
    let mut store = VectorStore::new(3).expect("store must be valid");
    let embeddings: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    store
        .add_vectors(vec!["a", "b", "c"], &embeddings)
        .expect("add must succeed");
    store
}

fn summary(hits: &[SearchHit]) -> Vec<(&str, f32)> {
    hits.iter()
        .map(|hit| (hit.chunk.as_str(), hit.distance))
        .collect()
}

#[test]
fn rejects_zero_dimension() {
    let error = VectorStore::new(0).expect_err("must fail");
    assert!(matches!(error, StoreError::InvalidConfig(_)));
}

#[test]
fn nearest_neighbors_break_ties_by_insertion_order() {
    let store = abc_store();
    let hits = store.search(&[1.0, 0.0, 0.0], 2).expect("search must succeed");

    assert_eq!(summary(&hits), vec![("a", 0.0), ("b", 2.0)]);
    assert_eq!(hits[0].position, 0);
    assert_eq!(hits[0].similarity(), 1.0);
    assert!((hits[1].similarity() - 1.0 / 3.0).abs() < 1e-6);
}

#[test]
fn add_vectors_reports_new_positions_and_keeps_chunks_aligned() {
    let mut store = abc_store();
    let embeddings: Vec<Vec<f32>> = vec![vec![2.0, 2.0, 2.0], vec![3.0, 3.0, 3.0]];
    let positions = store
        .add_vectors(vec!["d".to_string(), "e\nsecond line".to_string()], &embeddings)
        .expect("add must succeed");

    assert_eq!(positions, 3..5);
    assert_eq!(store.len(), 5);
    assert_eq!(store.chunks().len(), store.index().len());
    let (chunk, vector) = store.get(4).expect("entry must exist");
    assert_eq!(chunk, "e\nsecond line");
    assert_eq!(vector, &[3.0f32, 3.0, 3.0][..]);
}

#[test]
fn dimension_mismatch_leaves_store_unchanged() {
    let mut store = abc_store();
    let embeddings: Vec<Vec<f32>> = vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0]];
    let error = store
        .add_vectors(vec!["x", "y"], &embeddings)
        .expect_err("must fail");

    assert!(matches!(
        error,
        StoreError::DimensionMismatch {
            expected: 3,
            got: 2
        }
    ));
    assert_eq!(store.len(), 3);
    assert_eq!(store.chunks().len(), 3);
}

#[test]
fn batch_length_mismatch_mutates_neither_collection() {
    let mut store = abc_store();
    let embeddings: Vec<Vec<f32>> = vec![vec![1.0, 1.0, 1.0]];
    let error = store
        .add_vectors(vec!["x", "y"], &embeddings)
        .expect_err("must fail");

    assert!(matches!(
        error,
        StoreError::BatchLengthMismatch {
            chunks: 2,
            embeddings: 1
        }
    ));
    assert_eq!(store.index().len(), 3);
    assert_eq!(store.chunks().len(), 3);
}

#[test]
fn empty_store_returns_no_hits() {
    let store = VectorStore::new(3).expect("store must be valid");
    for k in [0, 1, 10] {
        assert!(store
            .search(&[0.0, 0.0, 1.0], k)
            .expect("search must succeed")
            .is_empty());
    }
}

#[test]
fn search_rejects_wrong_query_dimension() {
    let store = abc_store();
    let error = store.search(&[1.0, 0.0], 1).expect_err("must fail");
    assert!(matches!(error, StoreError::DimensionMismatch { .. }));
}

#[test]
fn misaligned_store_degrades_to_fewer_hits() {
    let mut store = abc_store();
    let orphan: [[f32; 3]; 1] = [[1.0, 0.1, 0.0]];
    store.index.add(&orphan).expect("add must succeed");

    let hits = store.search(&[1.0, 0.0, 0.0], 4).expect("search must succeed");

    let positions: Vec<usize> = hits.iter().map(|hit| hit.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(matches!(
        store.get(3),
        Err(StoreError::OutOfRange {
            position: 3,
            len: 3
        })
    ));
}

#[test]
fn save_then_load_reproduces_entries() {
    let root = test_dir("roundtrip");
    let paths = StorePaths::in_dir(&root);
    let mut store = abc_store();
    let extra: Vec<Vec<f32>> = vec![vec![0.1, -0.2, 1.0e-8]];
    store
        .add_vectors(vec!["multi\nline\ttext"], &extra)
        .expect("add must succeed");
    store.save_to(&paths).expect("save must succeed");

    let mut reloaded = VectorStore::new(3).expect("store must be valid");
    reloaded.load_from(&paths).expect("load must succeed");

    assert_eq!(reloaded.len(), store.len());
    let original_bits: Vec<u32> = store
        .index()
        .as_flat()
        .iter()
        .map(|v| v.to_bits())
        .collect();
    let reloaded_bits: Vec<u32> = reloaded
        .index()
        .as_flat()
        .iter()
        .map(|v| v.to_bits())
        .collect();
    assert_eq!(reloaded_bits, original_bits);
    assert_eq!(reloaded.chunks(), store.chunks());

    let hits = reloaded
        .search(&[0.0, 0.0, 1.0], 1)
        .expect("search must succeed");
    assert_eq!(summary(&hits), vec![("c", 0.0)]);

    cleanup(&root);
}

#[test]
fn load_replaces_prior_state() {
    let root = test_dir("replace");
    let paths = StorePaths::in_dir(&root);
    abc_store().save_to(&paths).expect("save must succeed");

    let mut store = VectorStore::new(3).expect("store must be valid");
    let embeddings: Vec<Vec<f32>> = vec![vec![9.0, 9.0, 9.0]; 5];
    store
        .add_vectors(vec!["old"; 5], &embeddings)
        .expect("add must succeed");
    store.load_from(&paths).expect("load must succeed");

    assert_eq!(store.len(), 3);
    assert_eq!(
        store.chunks().iter().collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );

    cleanup(&root);
}

#[test]
fn load_with_missing_file_names_it_and_keeps_state() {
    let root = test_dir("missing");
    let paths = StorePaths::in_dir(&root);
    let mut store = abc_store();

    let error = store.load_from(&paths).expect_err("must fail");
    assert!(matches!(
        error,
        StoreError::NotFound {
            artifact: Artifact::Index,
            ..
        }
    ));

    abc_store().save_to(&paths).expect("save must succeed");
    fs::remove_file(&paths.chunks).expect("chunks file should be removable");
    let error = store.load_from(&paths).expect_err("must fail");
    assert!(matches!(
        error,
        StoreError::NotFound {
            artifact: Artifact::Chunks,
            ..
        }
    ));
    assert!(error.to_string().contains("chunks file not found"));
    assert_eq!(store.len(), 3);

    cleanup(&root);
}

#[test]
fn load_detects_inconsistent_pair_without_mutating() {
    let root = test_dir("inconsistent");
    let paths = StorePaths::in_dir(&root);
    abc_store().save_to(&paths).expect("save must succeed");
    fs::write(&paths.chunks, r#"{"version":1,"chunks":["a","b"]}"#)
        .expect("chunks file should be writable");

    let mut store = VectorStore::new(3).expect("store must be valid");
    let error = store.load_from(&paths).expect_err("must fail");

    assert!(matches!(
        error,
        StoreError::InconsistentStore {
            vectors: 3,
            chunks: 2
        }
    ));
    assert!(store.is_empty());

    cleanup(&root);
}

#[test]
fn open_builds_store_from_pair() {
    let root = test_dir("open");
    let paths = StorePaths::in_dir(&root);
    abc_store().save_to(&paths).expect("save must succeed");

    let config = StoreConfig::with_dimension(3).expect("config must be valid");
    let store =
        VectorStore::open(config, &paths.index, &paths.chunks).expect("open must succeed");
    assert_eq!(store.len(), 3);

    cleanup(&root);
}

#[test]
fn text_helpers_use_injected_embedder() {
    let embedder = |text: &str| match text {
        "apple" => vec![1.0f32, 0.0],
        "banana" => vec![0.0f32, 1.0],
        _ => vec![0.9f32, 0.1],
    };

    let mut store = VectorStore::new(2).expect("store must be valid");
    let positions = store
        .add_texts(vec!["apple", "banana"], &embedder)
        .expect("add must succeed");
    assert_eq!(positions, 0..2);

    let hits = store
        .search_text("fruit", 1, &embedder)
        .expect("search must succeed");
    assert_eq!(hits[0].chunk, "apple");
}

#[test]
fn embedder_failure_is_surfaced_without_mutation() {
    struct Offline;

    impl Embedder for Offline {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::new("model unavailable"))
        }
    }

    let mut store = abc_store();
    let error = store
        .add_texts(vec!["d"], &Offline)
        .expect_err("must fail");
    assert!(matches!(error, StoreError::Embedding(_)));
    assert_eq!(store.len(), 3);
}

#[test]
fn build_and_save_infers_dimension_and_persists() {
    let root = test_dir("build");
    let embeddings: Vec<Vec<f32>> = vec![vec![0.5, 0.5], vec![1.0, -1.0]];
    let store =
        build_and_save(vec!["one", "two"], &embeddings, &root).expect("build must succeed");
    assert_eq!(store.dimension(), 2);

    let config = StoreConfig::with_dimension(2).expect("config must be valid");
    let paths = StorePaths::in_dir(&root);
    let reloaded =
        VectorStore::open(config, &paths.index, &paths.chunks).expect("open must succeed");
    assert_eq!(
        reloaded.chunks().iter().collect::<Vec<_>>(),
        vec!["one", "two"]
    );

    let empty: Vec<Vec<f32>> = Vec::new();
    let error = build_and_save(Vec::<String>::new(), &empty, &root).expect_err("must fail");
    assert!(matches!(error, StoreError::InvalidConfig(_)));

    cleanup(&root);
}
