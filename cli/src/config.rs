use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chunkvault_core::{StoreConfig, StorePaths, CHUNKS_FILE_NAME, INDEX_FILE_NAME};

use crate::env_utils::parse_bool;

const DATA_DIR_DEFAULT: &str = "data";
const DIMENSION_DEFAULT: usize = 384;
const TOP_K_DEFAULT: usize = 5;
const PREVIEW_CHARS_DEFAULT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) index_path: PathBuf,
    pub(crate) chunks_path: PathBuf,
    pub(crate) dimension: usize,
    pub(crate) strict_finite: bool,
    pub(crate) top_k: usize,
    pub(crate) preview_chars: usize,
}

impl AppConfig {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = parse_path(&lookup, "CHUNKVAULT_DATA_DIR", DATA_DIR_DEFAULT)?;
        let index_path = match lookup("CHUNKVAULT_INDEX_PATH") {
            Some(_) => parse_path(&lookup, "CHUNKVAULT_INDEX_PATH", "")?,
            None => data_dir.join(INDEX_FILE_NAME),
        };
        let chunks_path = match lookup("CHUNKVAULT_CHUNKS_PATH") {
            Some(_) => parse_path(&lookup, "CHUNKVAULT_CHUNKS_PATH", "")?,
            None => data_dir.join(CHUNKS_FILE_NAME),
        };
        let dimension = parse_usize(&lookup, "CHUNKVAULT_DIMENSION", DIMENSION_DEFAULT)?;
        let strict_finite = parse_bool(
            "CHUNKVAULT_STRICT_FINITE",
            lookup("CHUNKVAULT_STRICT_FINITE"),
            true,
        )?;
        let top_k = parse_usize(&lookup, "CHUNKVAULT_TOP_K", TOP_K_DEFAULT)?;
        let preview_chars =
            parse_usize(&lookup, "CHUNKVAULT_PREVIEW_CHARS", PREVIEW_CHARS_DEFAULT)?;

        if dimension == 0 {
            anyhow::bail!("CHUNKVAULT_DIMENSION must be > 0");
        }
        if top_k == 0 {
            anyhow::bail!("CHUNKVAULT_TOP_K must be > 0");
        }
        if index_path == chunks_path {
            anyhow::bail!("CHUNKVAULT_INDEX_PATH and CHUNKVAULT_CHUNKS_PATH must differ");
        }

        Ok(Self {
            index_path,
            chunks_path,
            dimension,
            strict_finite,
            top_k,
            preview_chars,
        })
    }

    pub(crate) fn store_config(&self) -> Result<StoreConfig> {
        StoreConfig::new(self.dimension, self.strict_finite)
            .context("invalid store configuration")
    }

    pub(crate) fn paths(&self) -> StorePaths {
        StorePaths::new(&self.index_path, &self.chunks_path)
    }
}

fn parse_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))
}

fn parse_path(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<PathBuf> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    let path = PathBuf::from(raw);
    if path.as_os_str().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(path)
}
