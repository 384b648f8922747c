//! Classification pipeline against a real directory tree.

use bddrun_engine::ClassificationPipeline;
use bddrun_logging::{LogLevel, Logger, LoggingConfig};
use bddrun_output_layout::WorkspacePaths;
use bddrun_schema::feature::Bucket;
use bddrun_tags::TagVocabulary;
use bddrun_testkit::MIXED_FEATURES;
use bddrun_testkit::proptest::strategy_feature_text;
use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn feature_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".feature"))
        .collect();
    names.sort();
    names
}

#[test]
fn writes_bucket_trees() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let out = ClassificationPipeline::new(&vocab)
        .classify(MIXED_FEATURES, &paths)
        .unwrap();

    assert_eq!(out.functional, 2);
    assert_eq!(out.non_functional, 1);
    assert_eq!(out.written.len(), 3);
    assert_eq!(
        feature_files(&paths.bucket_dir(Bucket::Functional)),
        vec!["health.feature", "user_management.feature"]
    );
    assert_eq!(
        feature_files(&paths.bucket_dir(Bucket::NonFunctional)),
        vec!["user_management.feature"]
    );

    let functional =
        std::fs::read_to_string(paths.bucket_feature(Bucket::Functional, "user_management")).unwrap();
    assert!(functional.starts_with("Feature: User management\n\n  # Functional scenarios\n\n  @smoke\n"));
    assert!(!functional.contains("@security"));
    assert!(functional.ends_with("should be 200\n"));
}

#[test]
fn reruns_replace_stale_files() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let pipeline = ClassificationPipeline::new(&vocab);
    pipeline.classify(MIXED_FEATURES, &paths).unwrap();

    let second = "Feature: Orders\n  Scenario: List orders\n    When I GET /orders\n";
    pipeline.classify(second, &paths).unwrap();
    assert_eq!(
        feature_files(&paths.bucket_dir(Bucket::Functional)),
        vec!["orders.feature"]
    );
    assert!(feature_files(&paths.bucket_dir(Bucket::NonFunctional)).is_empty());
}

#[test]
fn untitled_feature_is_named_by_input_position() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let text = "Feature: Intro\n  just a description\nFeature:\n  Scenario: X\n    When I GET /x\n";
    let pipeline = ClassificationPipeline::new(&vocab);

    pipeline.classify(text, &paths).unwrap();
    assert_eq!(
        feature_files(&paths.bucket_dir(Bucket::Functional)),
        vec!["feature_1.feature"]
    );

    pipeline.save(text, &paths).unwrap();
    assert_eq!(feature_files(&paths.bdd_tests()), vec!["feature_1.feature"]);
}

#[test]
fn classifying_written_output_is_stable() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let pipeline = ClassificationPipeline::new(&vocab);
    pipeline.classify(MIXED_FEATURES, &paths).unwrap();

    let file = paths.bucket_feature(Bucket::NonFunctional, "user_management");
    let first = std::fs::read_to_string(&file).unwrap();
    pipeline.classify(&first, &paths).unwrap();
    assert_eq!(std::fs::read_to_string(&file).unwrap(), first);
}

#[test]
fn save_writes_normalized_features() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let out = ClassificationPipeline::new(&vocab)
        .save(MIXED_FEATURES, &paths)
        .unwrap();

    assert_eq!(
        feature_files(&paths.bdd_tests()),
        vec!["health.feature", "user_management.feature"]
    );
    let saved = std::fs::read_to_string(paths.saved_feature("user_management")).unwrap();
    assert!(saved.contains("  @smoke\n  Scenario: List users\n"));
    assert!(out.normalized_text.contains("Feature: Health"));
    assert!(out.normalized_text.contains("Feature: User management"));
}

#[test]
fn segment_warnings_are_returned_and_logged() {
    let tmp = TempDir::new().unwrap();
    let paths = WorkspacePaths::new(tmp.path());
    let vocab = TagVocabulary::builtin();
    let (logger, collector) = Logger::capturing(LoggingConfig::default().with_level(LogLevel::Warn));
    let text = "Feature: F\n  Scenario: A\n    When I GET /a\n  @performance\n";
    let out = ClassificationPipeline::new(&vocab)
        .with_logger(&logger)
        .classify(text, &paths)
        .unwrap();

    assert_eq!(out.warnings.len(), 1);
    let c = collector.lock().unwrap();
    assert_eq!(c.entries().len(), 1);
    assert!(c.contains("@performance"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_scenario_lands_in_exactly_one_bucket(text in strategy_feature_text()) {
        let vocab = TagVocabulary::builtin();
        let c = ClassificationPipeline::new(&vocab).classify_text(&text);
        let total: usize = c.features.iter().map(|f| f.scenarios.len()).sum();
        let [functional, non_functional] = c.counts();
        prop_assert_eq!(functional + non_functional, total);
        let expected = text.matches("Scenario:").count();
        prop_assert_eq!(total, expected);
    }

    #[test]
    fn reclassifying_normalized_text_changes_nothing(text in strategy_feature_text()) {
        let vocab = TagVocabulary::builtin();
        let pipeline = ClassificationPipeline::new(&vocab);
        let once = pipeline.classify_text(&text);
        let twice = pipeline.classify_text(&once.normalized_text());
        prop_assert_eq!(once.features, twice.features);
    }
}
