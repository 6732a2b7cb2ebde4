//! Document corpus ingestion.
//!
//! Turns a directory of elevator documents into the JSON corpus uploaded to
//! the knowledge base. Documents directly under the root carry no metadata;
//! documents inside a subdirectory are tagged with that directory's name as
//! their elevator model.

use crate::filter::ELEVATOR_KEY;
use liftrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// One document in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub file_name: String,

    /// Non-empty trimmed paragraphs, in document order.
    pub content: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(rename = "Elevator")]
    pub elevator: String,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub records: usize,
    pub skipped: usize,
    pub paragraphs: usize,
    pub models: Vec<String>,
}

/// Convert one text document into a record.
pub fn convert_file(path: &Path, metadata: Option<RecordMetadata>) -> AppResult<CorpusRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read document {:?}: {}", path, e))
    })?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Knowledge(format!("Invalid document name: {:?}", path)))?
        .to_string();

    let content = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(CorpusRecord {
        file_name,
        content,
        metadata,
    })
}

/// Walk `root` and convert every supported document.
///
/// Within each directory files come before subdirectories, both by name.
pub fn build_corpus(root: &Path) -> AppResult<(Vec<CorpusRecord>, IngestStats)> {
    if !root.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Document root is not a directory: {:?}",
            root
        )));
    }

    tracing::info!("Ingesting documents from {:?}", root);

    let mut records = Vec::new();
    let mut stats = IngestStats::default();

    let walker = WalkDir::new(root).sort_by(|a, b| {
        (a.file_type().is_dir(), a.file_name()).cmp(&(b.file_type().is_dir(), b.file_name()))
    });

    for entry in walker {
        let entry = entry
            .map_err(|e| AppError::Knowledge(format!("Failed to walk {:?}: {}", root, e)))?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        if !is_supported(path) {
            tracing::debug!("Skipping unsupported document: {:?}", path);
            stats.skipped += 1;
            continue;
        }

        let metadata = path
            .parent()
            .filter(|parent| *parent != root)
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str())
            .map(|name| RecordMetadata {
                elevator: name.to_string(),
            });

        let record = convert_file(path, metadata)?;
        tracing::debug!(
            "Converted {} ({} paragraphs)",
            record.file_name,
            record.content.len()
        );

        stats.paragraphs += record.content.len();
        records.push(record);
    }

    stats.records = records.len();
    stats.models = known_values(&records).into_iter().collect();

    tracing::info!(
        "Ingested {} documents, {} skipped, {} models",
        stats.records,
        stats.skipped,
        stats.models.len()
    );

    Ok((records, stats))
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Write the corpus as pretty JSON.
pub fn write_corpus(path: &Path, records: &[CorpusRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    tracing::info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

pub fn load_corpus(path: &Path) -> AppResult<Vec<CorpusRecord>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read corpus {:?}: {}", path, e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| AppError::Knowledge(format!("Invalid corpus {:?}: {}", path, e)))
}

/// Distinct `Elevator` metadata values, sorted.
pub fn known_values(records: &[CorpusRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| record.metadata.as_ref())
        .map(|metadata| metadata.elevator.clone())
        .collect()
}

/// Allow-list for strict filtering, read from an ingested corpus.
pub fn allow_list_from_corpus(path: &Path) -> AppResult<BTreeSet<String>> {
    let values = known_values(&load_corpus(path)?);
    if values.is_empty() {
        return Err(AppError::Knowledge(format!(
            "Corpus {:?} has no {} metadata to build an allow-list from",
            path, ELEVATOR_KEY
        )));
    }
    Ok(values)
}
