use std::fmt::Write as _;

use anyhow::{Context, Result};
use chunkvault_core::{read_index_header, SearchHit, StoreConfig, VectorStore};

use crate::config::AppConfig;
use crate::input::PairBatch;

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IngestSummary {
    pub(crate) added: usize,
    pub(crate) total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoreInfo {
    pub(crate) dimension: usize,
    pub(crate) entries: usize,
}

/// Loads the configured store, or an empty one when neither file exists yet.
///
/// A lone index or chunks file is reported as missing its counterpart.
pub(crate) fn open_or_create(config: &AppConfig) -> Result<VectorStore> {
    let paths = config.paths();
    if !paths.index.exists() && !paths.chunks.exists() {
        tracing::info!(
            index = %paths.index.display(),
            "no persisted store found, starting empty"
        );
        return Ok(VectorStore::with_config(config.store_config()?));
    }
    open_existing(config)
}

pub(crate) fn open_existing(config: &AppConfig) -> Result<VectorStore> {
    let paths = config.paths();
    VectorStore::open(config.store_config()?, &paths.index, &paths.chunks)
        .with_context(|| format!("failed to open store at {}", paths.index.display()))
}

pub(crate) fn ingest(config: &AppConfig, batch: PairBatch) -> Result<IngestSummary> {
    let mut store = open_or_create(config)?;
    if batch.is_empty() {
        tracing::warn!("pairs file holds no records, store left unchanged");
        return Ok(IngestSummary {
            added: 0,
            total: store.len(),
        });
    }

    let added = store
        .add_vectors(batch.chunks, &batch.embeddings)
        .context("failed to append pairs")?
        .len();
    store
        .save_to(&config.paths())
        .context("failed to save store")?;

    Ok(IngestSummary {
        added,
        total: store.len(),
    })
}

pub(crate) fn search(config: &AppConfig, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
    if k == 0 {
        anyhow::bail!("k must be > 0");
    }
    let store = open_existing(config)?;
    store.search(query, k).context("search failed")
}

/// Describes the persisted store at its recorded width, which may differ from
/// `CHUNKVAULT_DIMENSION`.
pub(crate) fn info(config: &AppConfig) -> Result<StoreInfo> {
    let paths = config.paths();
    let header = read_index_header(&paths.index)
        .with_context(|| format!("failed to read index header {}", paths.index.display()))?;
    let store_config = StoreConfig::new(header.dimension, config.strict_finite)
        .context("invalid persisted dimension")?;
    let store = VectorStore::open(store_config, &paths.index, &paths.chunks)
        .with_context(|| format!("failed to open store at {}", paths.index.display()))?;
    if header.dimension != config.dimension {
        tracing::warn!(
            persisted = header.dimension,
            configured = config.dimension,
            "persisted store width differs from CHUNKVAULT_DIMENSION"
        );
    }

    Ok(StoreInfo {
        dimension: store.dimension(),
        entries: store.len(),
    })
}

pub(crate) fn render_hits(hits: &[SearchHit], preview_chars: usize) -> String {
    if hits.is_empty() {
        return "no results\n".to_string();
    }

    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    for (rank, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}] similarity={:.4} distance={:.4} position={}",
            rank + 1,
            hit.similarity(),
            hit.distance,
            hit.position
        );
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", preview(&hit.chunk, preview_chars));
        out.push('\n');
    }
    out
}

/// Collapses whitespace runs to single spaces and cuts after `max_chars`
/// characters, marking the cut with `...`.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flattened.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flattened[..cut]),
        None => flattened,
    }
}
