use crate::error::{TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Stable identifier for a converted dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

/// A multiple-choice VQA record as published by the source dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Image path or URI; absent for text-only questions.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    /// Index of the correct choice.
    #[serde(default)]
    pub answer: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageRef {
    Path { path: String },
    /// Solid-color stand-in for a record without an image.
    Blank { width: u32, height: u32, color: String },
}

impl ImageRef {
    #[must_use]
    pub fn placeholder() -> Self {
        Self::Blank { width: 224, height: 224, color: "white".to_string() }
    }
}

/// Training record: `images`, `problem`, `answer`, `mask_image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedRecord {
    pub images: Vec<ImageRef>,
    pub problem: String,
    pub answer: String,
    /// Set when `images` holds a placeholder rather than a real image.
    pub mask_image: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionManifest {
    pub dataset_id: DatasetId,
    pub created_at: DateTime<Utc>,
    pub sources: Vec<PathBuf>,
    pub seed: u64,
    pub train_count: usize,
    pub test_count: usize,
    pub placeholder_images: usize,
}

pub fn compute_dataset_id<T: Serialize>(records: &[T]) -> TrainingResult<DatasetId> {
    let mut hasher = Sha256::new();

    for record in records {
        let bytes = serde_json::to_vec(record)?;
        hasher.update(bytes);
        hasher.update(b"\n");
    }

    Ok(DatasetId(hex::encode(hasher.finalize())))
}

pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> TrainingResult<()> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> TrainingResult<Vec<T>> {
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(line).map_err(|e| {
            TrainingError::Dataset(format!("{}: failed to parse jsonl line {}: {}", path.display(), idx + 1, e))
        })?;
        records.push(record);
    }

    Ok(records)
}
