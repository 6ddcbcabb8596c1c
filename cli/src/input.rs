use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PairRecord {
    text: String,
    vector: Vec<f32>,
}

/// Chunk texts and their embeddings, in file order.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct PairBatch {
    pub(crate) chunks: Vec<String>,
    pub(crate) embeddings: Vec<Vec<f32>>,
}

impl PairBatch {
    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

pub(crate) fn read_pairs_file(path: &Path) -> Result<PairBatch> {
    let file = File::open(path)
        .with_context(|| format!("failed to open pairs file {}", path.display()))?;
    parse_pairs(BufReader::new(file))
        .with_context(|| format!("failed to parse pairs file {}", path.display()))
}

/// Parses one `{"text": .., "vector": [..]}` object per line. Blank lines are skipped.
pub(crate) fn parse_pairs<R: BufRead>(reader: R) -> Result<PairBatch> {
    let mut batch = PairBatch::default();
    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line.with_context(|| format!("failed to read line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PairRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid record on line {line_number}"))?;
        batch.chunks.push(record.text);
        batch.embeddings.push(record.vector);
    }
    Ok(batch)
}

/// Parses `"0.1, 0.2,-3e-2"` into components.
pub(crate) fn parse_vector_list(raw: &str) -> Result<Vec<f32>> {
    raw.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(position, value)| {
            value
                .parse::<f32>()
                .with_context(|| format!("component {position} is not a number: '{value}'"))
        })
        .collect()
}

/// Reads a query vector stored as a JSON array.
pub(crate) fn read_vector_file(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open vector file {}", path.display()))?;
    let vector: Vec<f32> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("vector file {} must hold a JSON array", path.display()))?;
    if vector.is_empty() {
        anyhow::bail!("vector file {} holds an empty array", path.display());
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pairs_keeps_file_order_and_skips_blank_lines() {
        let raw = concat!(
            "{\"text\": \"first chunk\", \"vector\": [1.0, 0.0]}\n",
            "\n",
            "{\"vector\": [0.5, -2], \"text\": \"second\\nline\"}\n",
        );
        let batch = parse_pairs(raw.as_bytes()).expect("pairs must parse");

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.chunks, vec!["first chunk", "second\nline"]);
        assert_eq!(batch.embeddings, vec![vec![1.0, 0.0], vec![0.5, -2.0]]);
    }

    #[test]
    fn parse_pairs_reports_offending_line() {
        let raw = "{\"text\": \"ok\", \"vector\": [1.0]}\n{\"text\": \"missing vector\"}\n";
        let error = parse_pairs(raw.as_bytes()).expect_err("must fail");
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn parse_pairs_of_empty_input_is_empty() {
        let batch = parse_pairs("".as_bytes()).expect("empty input must parse");
        assert!(batch.is_empty());
    }

    #[test]
    fn parse_vector_list_accepts_spacing_and_exponents() {
        let vector = parse_vector_list("0.5, -1,2e-1 ").expect("vector must parse");
        assert_eq!(vector, vec![0.5, -1.0, 0.2]);
    }

    #[test]
    fn parse_vector_list_rejects_garbage() {
        let error = parse_vector_list("1.0,abc").expect_err("must fail");
        assert!(error.to_string().contains("component 1"));
        assert!(parse_vector_list("").is_err());
        assert!(parse_vector_list("1.0,,2.0").is_err());
    }
}
