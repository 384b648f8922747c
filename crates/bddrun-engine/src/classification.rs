use anyhow::Result;
use bddrun_classify::classify;
use bddrun_logging::Logger;
use bddrun_normalize::normalize_block;
use bddrun_output_layout::WorkspacePaths;
use bddrun_schema::feature::{Bucket, ClassifiedFeature, ClassifiedScenario, FEATURE_KEYWORD};
use bddrun_segment::{SegmentWarning, segment};
use bddrun_tags::TagVocabulary;
use bddrun_writer::{SavedFeature, save_features, write_bucket_trees};
use std::path::PathBuf;

/// Everything the pipeline derives from one input text, before any file is
/// touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub features: Vec<ClassifiedFeature>,
    /// Full normalized feature texts, one per feature with scenarios.
    pub saved: Vec<SavedFeature>,
    pub warnings: Vec<SegmentWarning>,
}

impl Classification {
    /// Scenario counts in `Bucket::ALL` order.
    pub fn counts(&self) -> [usize; 2] {
        let mut counts = [0, 0];
        for scenario in self.features.iter().flat_map(|f| &f.scenarios) {
            match scenario.bucket {
                Bucket::Functional => counts[0] += 1,
                Bucket::NonFunctional => counts[1] += 1,
            }
        }
        counts
    }

    /// All normalized features as one text, for redisplay.
    pub fn normalized_text(&self) -> String {
        self.saved
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug)]
pub struct ClassifyOutputs {
    pub written: Vec<PathBuf>,
    pub functional: usize,
    pub non_functional: usize,
    pub warnings: Vec<SegmentWarning>,
}

#[derive(Debug)]
pub struct SaveOutputs {
    pub written: Vec<PathBuf>,
    pub normalized_text: String,
    pub warnings: Vec<SegmentWarning>,
}

pub struct ClassificationPipeline<'a> {
    vocabulary: &'a TagVocabulary,
    logger: Logger,
}

impl<'a> ClassificationPipeline<'a> {
    pub fn new(vocabulary: &'a TagVocabulary) -> Self {
        Self {
            vocabulary,
            logger: Logger::silent(),
        }
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.for_component("classify");
        self
    }

    /// Segment, normalize and classify without writing anything.
    pub fn classify_text(&self, text: &str) -> Classification {
        let segmented = segment(text);
        let mut out = Classification {
            warnings: segmented.warnings,
            ..Classification::default()
        };

        for (index, block) in segmented.features.iter().enumerate() {
            if block.scenarios.is_empty() {
                continue;
            }
            let mut feature = ClassifiedFeature::new(index, block.title.clone());
            for scenario in &block.scenarios {
                let normalized = normalize_block(scenario, self.vocabulary);
                let bucket = classify(&normalized.tags, self.vocabulary);
                feature.scenarios.push(ClassifiedScenario {
                    bucket,
                    tags: normalized.tags,
                    text: normalized.text,
                });
            }
            out.saved.push(SavedFeature {
                index,
                title: block.title.clone(),
                text: feature_text(&feature, &block.description),
            });
            out.features.push(feature);
        }
        out
    }

    /// Rebuild the functional and non-functional trees from `text`.
    pub fn classify(&self, text: &str, paths: &WorkspacePaths) -> Result<ClassifyOutputs> {
        let classification = self.classify_text(text);
        self.log_warnings(&classification.warnings);

        let written = write_bucket_trees(paths, &classification.features)?;
        let [functional, non_functional] = classification.counts();
        self.logger.info(format!(
            "classified {} scenarios ({functional} functional, {non_functional} non-functional) into {} files",
            functional + non_functional,
            written.len()
        ));
        Ok(ClassifyOutputs {
            written,
            functional,
            non_functional,
            warnings: classification.warnings,
        })
    }

    /// Save each normalized feature to `bdd_tests/<slug>.feature`.
    pub fn save(&self, text: &str, paths: &WorkspacePaths) -> Result<SaveOutputs> {
        let classification = self.classify_text(text);
        self.log_warnings(&classification.warnings);

        let written = save_features(paths, &classification.saved)?;
        self.logger
            .info(format!("saved {} normalized features", written.len()));
        Ok(SaveOutputs {
            written,
            normalized_text: classification.normalized_text(),
            warnings: classification.warnings,
        })
    }

    fn log_warnings(&self, warnings: &[SegmentWarning]) {
        for warning in warnings {
            self.logger.warn(warning.to_string());
        }
    }
}

/// `Feature:` header, description, then the scenarios separated by blank lines.
/// The implicit untitled feature gets no header.
fn feature_text(feature: &ClassifiedFeature, description: &[String]) -> String {
    let mut parts = Vec::new();
    if !feature.title.is_empty() {
        let mut head = format!("{FEATURE_KEYWORD} {}", feature.title);
        for line in description {
            head.push_str("\n  ");
            head.push_str(line);
        }
        parts.push(head);
    }
    parts.extend(feature.scenarios.iter().map(|s| s.text.trim_end().to_string()));
    parts.join("\n\n")
}
