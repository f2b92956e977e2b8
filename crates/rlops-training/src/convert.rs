//! Conversion of multiple-choice VQA records into training records.
//!
//! Every source split is converted, pooled, shuffled with a fixed seed and
//! re-split into `train` / `test`.

use crate::dataset::{
    ConversionManifest, ConvertedRecord, ImageRef, SourceRecord, compute_dataset_id, read_jsonl, write_jsonl,
};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::DatasetLayout;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub seed: u64,
    /// Number of shuffled records placed in the `test` split.
    pub test_size: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self { seed: 42, test_size: 1500 }
    }
}

fn choice_letter(index: usize) -> Option<char> {
    u8::try_from(index).ok().filter(|i| *i < 26).map(|i| char::from(b'A' + i))
}

/// Convert one source record.
///
/// A missing image becomes a blank placeholder and sets `mask_image`.
pub fn convert_record(record: &SourceRecord) -> TrainingResult<ConvertedRecord> {
    let (image, mask_image) = match &record.image {
        Some(path) if !path.is_empty() => (ImageRef::Path { path: path.clone() }, false),
        _ => (ImageRef::placeholder(), true),
    };

    let mut options = Vec::with_capacity(record.choices.len());
    for (i, choice) in record.choices.iter().enumerate() {
        let letter = choice_letter(i)
            .ok_or_else(|| TrainingError::Dataset(format!("too many choices ({})", record.choices.len())))?;
        options.push(format!("{letter}. {choice}"));
    }
    let options = options.join("\n");

    let problem = match record.hint.as_deref() {
        Some(hint) if !hint.is_empty() => format!(
            "<image>Context: {hint}\n\nQuestion: {}\n\nOptions:\n{options}",
            record.question
        ),
        _ => format!("<image>Question: {}\n\nOptions:\n{options}", record.question),
    };

    let answer = usize::try_from(record.answer)
        .ok()
        .filter(|i| *i < record.choices.len())
        .and_then(choice_letter)
        .ok_or_else(|| TrainingError::Dataset(format!("answer index out of range: {}", record.answer)))?;

    Ok(ConvertedRecord { images: vec![image], problem, answer: answer.to_string(), mask_image })
}

/// Shuffle with `seed` and split; the first `test_size` records form the test split.
pub fn split_train_test(
    mut records: Vec<ConvertedRecord>,
    options: &ConversionOptions,
) -> (Vec<ConvertedRecord>, Vec<ConvertedRecord>) {
    let mut rng = StdRng::seed_from_u64(options.seed);
    records.shuffle(&mut rng);

    let test_len = options.test_size.min(records.len());
    let train = records.split_off(test_len);
    (train, records)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 * 100.0 }
}

/// Convert every source split file and write `train.jsonl`, `test.jsonl` and the manifest.
pub fn convert_dataset(
    sources: &[PathBuf],
    layout: &DatasetLayout,
    options: &ConversionOptions,
) -> TrainingResult<ConversionManifest> {
    let mut converted = Vec::new();

    for source in sources {
        let records: Vec<SourceRecord> = read_jsonl(source)?;
        info!(source = %source.display(), records = records.len(), "Converting split");
        for (idx, record) in records.iter().enumerate() {
            let out = convert_record(record).map_err(|e| {
                TrainingError::Dataset(format!("{} record {}: {}", source.display(), idx + 1, e))
            })?;
            converted.push(out);
        }
    }

    if converted.is_empty() {
        return Err(TrainingError::Dataset("no records to convert".to_string()));
    }

    let total = converted.len();
    let placeholders = converted.iter().filter(|r| r.mask_image).count();
    info!(
        total,
        placeholder_images = placeholders,
        placeholder_pct = percent(placeholders, total),
        real_pct = percent(total - placeholders, total),
        "Collected records"
    );

    let (train, test) = split_train_test(converted, options);
    info!(train = train.len(), test = test.len(), seed = options.seed, "Split dataset");

    std::fs::create_dir_all(layout.root())?;
    write_jsonl(&layout.split_path("train"), &train)?;
    write_jsonl(&layout.split_path("test"), &test)?;

    let all: Vec<&ConvertedRecord> = train.iter().chain(test.iter()).collect();
    let manifest = ConversionManifest {
        dataset_id: compute_dataset_id(&all)?,
        created_at: Utc::now(),
        sources: sources.to_vec(),
        seed: options.seed,
        train_count: train.len(),
        test_count: test.len(),
        placeholder_images: placeholders,
    };
    std::fs::write(layout.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(image: Option<&str>, hint: &str, answer: i64) -> SourceRecord {
        SourceRecord {
            image: image.map(str::to_string),
            hint: Some(hint.to_string()),
            question: "Which animal can fly?".to_string(),
            choices: vec!["cat".to_string(), "bird".to_string()],
            answer,
        }
    }

    #[test]
    fn test_convert_record_with_context() {
        let out = convert_record(&record(Some("img/1.png"), "Look at the picture.", 1)).unwrap();

        assert_eq!(
            out.problem,
            "<image>Context: Look at the picture.\n\nQuestion: Which animal can fly?\n\nOptions:\nA. cat\nB. bird"
        );
        assert_eq!(out.answer, "B");
        assert!(!out.mask_image);
        assert_eq!(out.images, vec![ImageRef::Path { path: "img/1.png".to_string() }]);
    }

    #[test]
    fn test_convert_record_without_image_or_hint() {
        let out = convert_record(&record(None, "", 0)).unwrap();

        assert!(out.problem.starts_with("<image>Question: Which animal can fly?"));
        assert_eq!(out.answer, "A");
        assert!(out.mask_image);
        assert_eq!(out.images, vec![ImageRef::placeholder()]);
    }

    #[test]
    fn test_convert_record_rejects_bad_answer() {
        assert!(convert_record(&record(None, "", -1)).is_err());
        assert!(convert_record(&record(None, "", 2)).is_err());
        assert!(convert_record(&record(None, "", 26)).is_err());
    }

    #[test]
    fn test_split_is_seeded() {
        let records: Vec<_> = (0..10)
            .map(|i| {
                let source = SourceRecord { question: format!("q{i}"), ..record(None, "", 0) };
                convert_record(&source).unwrap()
            })
            .collect();
        let options = ConversionOptions { seed: 7, test_size: 3 };

        let (train_a, test_a) = split_train_test(records.clone(), &options);
        let (train_b, test_b) = split_train_test(records, &options);

        assert_eq!(test_a.len(), 3);
        assert_eq!(train_a.len(), 7);
        assert_eq!(test_a, test_b);
        assert_eq!(train_a, train_b);
    }

    #[test]
    fn test_split_with_small_dataset() {
        let records = vec![convert_record(&record(None, "", 1)).unwrap()];
        let (train, test) = split_train_test(records, &ConversionOptions::default());
        assert!(train.is_empty());
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn test_convert_dataset_writes_splits_and_manifest() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("validation.jsonl");
        let lines: Vec<String> = (0..5)
            .map(|i| {
                serde_json::to_string(&record(if i % 2 == 0 { None } else { Some("x.png") }, "", 0)).unwrap()
            })
            .collect();
        std::fs::write(&source, lines.join("\n")).unwrap();

        let layout = DatasetLayout::new(temp.path().join("out"));
        let manifest =
            convert_dataset(&[source], &layout, &ConversionOptions { seed: 42, test_size: 2 }).unwrap();

        assert_eq!(manifest.train_count, 3);
        assert_eq!(manifest.test_count, 2);
        assert_eq!(manifest.placeholder_images, 3);
        let train: Vec<ConvertedRecord> = read_jsonl(&layout.split_path("train")).unwrap();
        assert_eq!(train.len(), 3);
        assert!(layout.manifest_path().exists());
    }

    #[test]
    fn test_convert_dataset_rejects_empty_input() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("empty.jsonl");
        std::fs::write(&source, "").unwrap();

        let layout = DatasetLayout::new(temp.path().join("out"));
        assert!(convert_dataset(&[source], &layout, &ConversionOptions::default()).is_err());
    }
}
