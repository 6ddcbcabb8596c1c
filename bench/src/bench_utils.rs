use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// p50, p95 and mean of the samples.
pub(crate) fn summarize_ms(samples_ms: &[f64]) -> (f64, f64, f64) {
    let p50_ms = percentile_ms(samples_ms, 0.50);
    let p95_ms = percentile_ms(samples_ms, 0.95);
    (p50_ms, p95_ms, average_ms(samples_ms))
}

pub(crate) fn average_ms(samples_ms: &[f64]) -> f64 {
    if samples_ms.is_empty() {
        return 0.0;
    }
    samples_ms.iter().sum::<f64>() / samples_ms.len() as f64
}

pub(crate) fn percentile_ms(samples_ms: &[f64], quantile: f64) -> f64 {
    if samples_ms.is_empty() {
        return 0.0;
    }
    let mut sorted = samples_ms.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last_index = sorted.len().saturating_sub(1);
    let position = (quantile.clamp(0.0, 1.0) * last_index as f64).round() as usize;
    sorted[position]
}

pub(crate) fn deterministic_vector(seed: u64, dimension: usize) -> Vec<f32> {
    (0..dimension)
        .map(|index| {
            let mixed = (seed as usize)
                .wrapping_mul(31)
                .wrapping_add(index.wrapping_mul(17))
                % 10_000;
            mixed as f32 / 10_000.0
        })
        .collect()
}

pub(crate) fn generate_dataset(size: usize, dimension: usize) -> Vec<Vec<f32>> {
    (0..size)
        .map(|id| deterministic_vector(id as u64, dimension))
        .collect()
}

pub(crate) fn chunk_texts(size: usize) -> Vec<String> {
    (0..size).map(|id| format!("chunk {id} of the bench corpus")).collect()
}

pub(crate) fn temp_root() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("chunkvault_persistence_bench_{stamp}"))
}

pub(crate) fn clean_root(root: &Path) {
    if let Err(error) = fs::remove_dir_all(root) {
        eprintln!(
            "warn=persistence_bench_cleanup_failed root={} detail=\"{}\"",
            root.display(),
            error
        );
    }
}

pub(crate) fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}
