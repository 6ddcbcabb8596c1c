use std::time::Instant;

use chunkvault_core::{StoreConfig, StorePaths, VectorStore};

use crate::bench_utils::{
    chunk_texts, clean_root, file_len, generate_dataset, summarize_ms, temp_root,
};

const PERSIST_POINTS: usize = 20_000;
const PERSIST_DIMENSION: usize = 384;
const PERSIST_WARMUP_RUNS: usize = 2;
const PERSIST_MEASURED_RUNS: usize = 10;

pub(crate) fn run_persistence_bench(mode: &str) -> bool {
    let config = match StoreConfig::with_dimension(PERSIST_DIMENSION) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error=store_config_failed detail=\"{error}\"");
            return false;
        }
    };

    let mut store = VectorStore::with_config(config);
    let embeddings = generate_dataset(PERSIST_POINTS, PERSIST_DIMENSION);
    if let Err(error) = store.add_vectors(chunk_texts(PERSIST_POINTS), &embeddings) {
        eprintln!("error=store_add_failed detail=\"{error}\"");
        return false;
    }

    let root = temp_root();
    let paths = StorePaths::in_dir(&root);
    let ok = measure(mode, &store, config, &paths);
    clean_root(&root);
    ok
}

fn measure(mode: &str, store: &VectorStore, config: StoreConfig, paths: &StorePaths) -> bool {
    for _ in 0..PERSIST_WARMUP_RUNS {
        if run_persistence_once(store, config, paths).is_none() {
            return false;
        }
    }

    let mut save_ms = Vec::with_capacity(PERSIST_MEASURED_RUNS);
    let mut load_ms = Vec::with_capacity(PERSIST_MEASURED_RUNS);
    for _ in 0..PERSIST_MEASURED_RUNS {
        let Some((save_elapsed_ms, load_elapsed_ms)) = run_persistence_once(store, config, paths)
        else {
            return false;
        };
        save_ms.push(save_elapsed_ms);
        load_ms.push(load_elapsed_ms);
    }

    let (save_p50_ms, save_p95_ms, save_avg_ms) = summarize_ms(&save_ms);
    let (load_p50_ms, load_p95_ms, load_avg_ms) = summarize_ms(&load_ms);
    let index_bytes = file_len(&paths.index);
    let chunks_bytes = file_len(&paths.chunks);

    println!(
        "bench=store_persistence mode={mode} points={PERSIST_POINTS} dimension={PERSIST_DIMENSION} warmup_runs={PERSIST_WARMUP_RUNS} measured_runs={PERSIST_MEASURED_RUNS} save_p50_ms={save_p50_ms:.6} save_p95_ms={save_p95_ms:.6} save_avg_ms={save_avg_ms:.6} load_p50_ms={load_p50_ms:.6} load_p95_ms={load_p95_ms:.6} load_avg_ms={load_avg_ms:.6} index_bytes={index_bytes} chunks_bytes={chunks_bytes}"
    );

    true
}

fn run_persistence_once(
    store: &VectorStore,
    config: StoreConfig,
    paths: &StorePaths,
) -> Option<(f64, f64)> {
    let save_started = Instant::now();
    if let Err(error) = store.save_to(paths) {
        eprintln!("error=store_save_failed detail=\"{error}\"");
        return None;
    }
    let save_elapsed_ms = save_started.elapsed().as_secs_f64() * 1_000.0;

    let load_started = Instant::now();
    let reloaded = match VectorStore::open(config, &paths.index, &paths.chunks) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error=store_load_failed detail=\"{error}\"");
            return None;
        }
    };
    let load_elapsed_ms = load_started.elapsed().as_secs_f64() * 1_000.0;

    if reloaded.len() != store.len() {
        eprintln!(
            "error=store_reload_mismatch expected={} got={}",
            store.len(),
            reloaded.len()
        );
        return None;
    }

    Some((save_elapsed_ms, load_elapsed_ms))
}
