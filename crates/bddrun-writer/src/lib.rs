//! Feature file writers.
//!
//! The bucket trees under `bdd_tests/` are rebuilt from scratch on every
//! run: existing `.feature` files are removed first, so the tree always
//! mirrors the latest classification.

use anyhow::{Context, Result};
use bddrun_output_layout::{SlugAllocator, WorkspacePaths, is_feature_file};
use bddrun_schema::feature::{Bucket, ClassifiedFeature};
use std::path::{Path, PathBuf};

/// Contents of one bucket file.
pub fn render_bucket_file(title: &str, bucket: Bucket, scenarios: &[&str]) -> String {
    let mut text = format!("Feature: {title}\n\n  {}", bucket.comment());
    for scenario in scenarios {
        text.push_str("\n\n");
        text.push_str(scenario);
    }
    let mut text = text.trim_end().to_string();
    text.push('\n');
    text
}

/// Rebuild `bdd_tests/functional/` and `bdd_tests/non_functional/`.
///
/// Writes at most two files per feature and skips empty buckets.
/// Returns the written paths in feature order, functional first.
pub fn write_bucket_trees(
    paths: &WorkspacePaths,
    features: &[ClassifiedFeature],
) -> Result<Vec<PathBuf>> {
    for bucket in Bucket::ALL {
        let dir = paths.bucket_dir(bucket);
        std::fs::create_dir_all(&dir).with_context(|| format!("create {dir:?}"))?;
        clear_feature_files(&dir)?;
    }

    let mut slugs = SlugAllocator::new();
    let mut written = Vec::new();
    for feature in features {
        if feature.scenarios.is_empty() {
            continue;
        }
        let slug = slugs.allocate(&feature.title, feature.index);
        for bucket in Bucket::ALL {
            let scenarios = feature.bucket(bucket);
            if scenarios.is_empty() {
                continue;
            }
            let path = paths.bucket_feature(bucket, &slug);
            let text = render_bucket_file(&feature.title, bucket, &scenarios);
            std::fs::write(&path, text).with_context(|| format!("write {path:?}"))?;
            written.push(path);
        }
    }
    Ok(written)
}

/// A normalized feature ready to be saved as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFeature {
    /// 0-based position in the segmented input, used for untitled features.
    pub index: usize,
    pub title: String,
    pub text: String,
}

/// Write each feature to `bdd_tests/<slug>.feature`, replacing the
/// previously saved top-level files. The bucket subdirectories are untouched.
pub fn save_features(paths: &WorkspacePaths, features: &[SavedFeature]) -> Result<Vec<PathBuf>> {
    let dir = paths.bdd_tests();
    std::fs::create_dir_all(&dir).with_context(|| format!("create {dir:?}"))?;
    clear_feature_files(&dir)?;

    let mut slugs = SlugAllocator::new();
    let mut written = Vec::new();
    for feature in features {
        let slug = slugs.allocate(&feature.title, feature.index);
        let path = paths.saved_feature(&slug);
        let mut text = feature.text.trim_end().to_string();
        text.push('\n');
        std::fs::write(&path, text).with_context(|| format!("write {path:?}"))?;
        written.push(path);
    }
    Ok(written)
}

/// Delete every `.feature` file directly inside `dir`. Returns how many.
pub fn clear_feature_files(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {dir:?}"))? {
        let path = entry.with_context(|| format!("read {dir:?}"))?.path();
        if path.is_file() && is_feature_file(&path) {
            std::fs::remove_file(&path).with_context(|| format!("remove {path:?}"))?;
            removed += 1;
        }
    }
    Ok(removed)
}
