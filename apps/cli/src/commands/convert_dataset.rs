//! `rlops convert-dataset`: reshape VQA splits into train/test JSONL.

use anyhow::{Context, Result};
use colored::Colorize;
use rlops_training::{ConversionOptions, DatasetLayout, convert_dataset};
use std::path::PathBuf;

pub fn execute(sources: Vec<PathBuf>, out: PathBuf, seed: u64, test_size: usize) -> Result<()> {
    let layout = DatasetLayout::new(out);
    let options = ConversionOptions { seed, test_size };

    let manifest = convert_dataset(&sources, &layout, &options).context("Dataset conversion failed")?;

    println!();
    println!("{}", "Dataset converted".bold().green());
    println!("  Dataset:      {}", manifest.dataset_id.0.cyan());
    println!("  Train:        {}", manifest.train_count);
    println!("  Test:         {}", manifest.test_count);
    println!("  Placeholders: {}", manifest.placeholder_images);
    println!("  Output:       {}", layout.root().display().to_string().dimmed());
    println!();
    Ok(())
}
