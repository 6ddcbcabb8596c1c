#![forbid(unsafe_code)]
//! Vector store benchmarks for chunkvault.
//!
//! Scenarios:
//! - `search`: exact top-k scan through `VectorStore::search`
//! - `add`: batched `add_vectors` into an empty store
//! - `persistence`: save + load of the index/chunks pair

use std::env;
use std::process;
use std::time::{Duration, Instant};

use chunkvault_core::{StoreConfig, VectorStore};

mod bench_utils;
mod persistence_bench;

use crate::bench_utils::{chunk_texts, deterministic_vector, generate_dataset, summarize_ms};
use crate::persistence_bench::run_persistence_bench;

const DIMENSION: usize = 384;
const DATASET_SIZE: usize = 10_000;
const TOP_K: usize = 5;
const WARMUP_RUNS: usize = 8;
const MEASURED_RUNS: usize = 50;
const ADD_BATCH: usize = 500;
const ADD_WARMUP_RUNS: usize = 3;
const ADD_MEASURED_RUNS: usize = 15;

fn main() {
    if cfg!(debug_assertions) && env::var("CHUNKVAULT_ALLOW_DEBUG_BENCH").as_deref() != Ok("1") {
        eprintln!(
            "error=debug_build_not_allowed message=\"run `cargo run --release -p chunkvault-bench`\""
        );
        process::exit(2);
    }

    let mode = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    let scenario = env::var("CHUNKVAULT_BENCH_SCENARIO").unwrap_or_else(|_| "all".to_string());
    let ok = match scenario.as_str() {
        "all" => run_search_bench(mode) && run_add_bench(mode) && run_persistence_bench(mode),
        "search" => run_search_bench(mode),
        "add" => run_add_bench(mode),
        "persistence" => run_persistence_bench(mode),
        _ => {
            eprintln!(
                "error=invalid_scenario scenario=\"{}\" allowed=\"all,search,add,persistence\"",
                scenario
            );
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn new_store() -> Option<VectorStore> {
    match StoreConfig::with_dimension(DIMENSION) {
        Ok(config) => Some(VectorStore::with_config(config)),
        Err(error) => {
            eprintln!("error=store_config_failed detail=\"{error}\"");
            None
        }
    }
}

fn run_search_bench(mode: &str) -> bool {
    let Some(mut store) = new_store() else {
        return false;
    };
    let embeddings = generate_dataset(DATASET_SIZE, DIMENSION);
    if let Err(error) = store.add_vectors(chunk_texts(DATASET_SIZE), &embeddings) {
        eprintln!("error=store_add_failed detail=\"{error}\"");
        return false;
    }
    let query = deterministic_vector(1337, DIMENSION);

    for _ in 0..WARMUP_RUNS {
        if run_search_once(&store, &query).is_none() {
            return false;
        }
    }

    let mut elapsed_samples = Vec::with_capacity(MEASURED_RUNS);
    let mut total_duration = Duration::from_secs(0);
    let mut best_position = 0usize;
    let mut best_distance = f32::MAX;

    for _ in 0..MEASURED_RUNS {
        let Some((elapsed, position, distance)) = run_search_once(&store, &query) else {
            return false;
        };
        elapsed_samples.push(elapsed.as_secs_f64() * 1_000.0);
        total_duration += elapsed;
        best_position = position;
        best_distance = distance;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&elapsed_samples);
    let qps = MEASURED_RUNS as f64 / total_duration.as_secs_f64();

    println!(
        "bench=store_search mode={mode} dataset_size={DATASET_SIZE} dimension={DIMENSION} k={TOP_K} warmup_runs={WARMUP_RUNS} measured_runs={MEASURED_RUNS} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6} qps={qps:.2} best_position={best_position} best_distance={best_distance:.6}"
    );

    true
}

fn run_search_once(store: &VectorStore, query: &[f32]) -> Option<(Duration, usize, f32)> {
    let started_at = Instant::now();
    let hits = match store.search(query, TOP_K) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error=store_search_failed detail=\"{error}\"");
            return None;
        }
    };
    let elapsed = started_at.elapsed();

    let Some(best) = hits.first() else {
        eprintln!("error=store_search_empty");
        return None;
    };
    Some((elapsed, best.position, best.distance))
}

fn run_add_bench(mode: &str) -> bool {
    let embeddings = generate_dataset(DATASET_SIZE, DIMENSION);

    for _ in 0..ADD_WARMUP_RUNS {
        if run_add_once(&embeddings).is_none() {
            return false;
        }
    }

    let mut batch_ms = Vec::with_capacity(ADD_MEASURED_RUNS);
    let mut total_duration = Duration::from_secs(0);
    let mut entries = 0usize;

    for _ in 0..ADD_MEASURED_RUNS {
        let Some((elapsed, samples, len)) = run_add_once(&embeddings) else {
            return false;
        };
        batch_ms.extend(samples);
        total_duration += elapsed;
        entries = len;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&batch_ms);
    let vectors_per_sec =
        (ADD_MEASURED_RUNS * DATASET_SIZE) as f64 / total_duration.as_secs_f64();

    println!(
        "bench=store_add mode={mode} points={DATASET_SIZE} dimension={DIMENSION} batch={ADD_BATCH} warmup_runs={ADD_WARMUP_RUNS} measured_runs={ADD_MEASURED_RUNS} batch_p50_ms={p50_ms:.6} batch_p95_ms={p95_ms:.6} batch_avg_ms={avg_ms:.6} vectors_per_sec={vectors_per_sec:.2} entries={entries}"
    );

    true
}

fn run_add_once(embeddings: &[Vec<f32>]) -> Option<(Duration, Vec<f64>, usize)> {
    let mut store = new_store()?;
    let mut samples = Vec::with_capacity(embeddings.len() / ADD_BATCH + 1);
    let mut total = Duration::from_secs(0);

    for batch in embeddings.chunks(ADD_BATCH) {
        let texts = chunk_texts(batch.len());
        let started_at = Instant::now();
        if let Err(error) = store.add_vectors(texts, batch) {
            eprintln!("error=store_add_failed detail=\"{error}\"");
            return None;
        }
        let elapsed = started_at.elapsed();
        samples.push(elapsed.as_secs_f64() * 1_000.0);
        total += elapsed;
    }

    Some((total, samples, store.len()))
}
