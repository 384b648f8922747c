use crate::tag::TagSet;
use serde::{Deserialize, Serialize};

pub const FEATURE_KEYWORD: &str = "Feature:";
pub const SCENARIO_KEYWORD: &str = "Scenario:";
pub const DOCSTRING_DELIMITER: &str = "\"\"\"";

pub fn is_feature_header(line: &str) -> bool {
    line.trim_start().starts_with(FEATURE_KEYWORD)
}

pub fn is_scenario_header(line: &str) -> bool {
    line.trim_start().starts_with(SCENARIO_KEYWORD)
}

pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Text after the keyword on a header line, trimmed.
pub fn header_title<'a>(line: &'a str, keyword: &str) -> &'a str {
    let trimmed = line.trim_start();
    trimmed.strip_prefix(keyword).unwrap_or(trimmed).trim()
}

/// One `Scenario:` block as it appeared in the source text.
///
/// Lines are kept verbatim (indentation included) so that the normalizer
/// and the writers can reproduce the author's layout.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioBlock {
    pub title: String,
    /// The `Scenario:` line itself.
    pub header: String,
    /// Tag lines (and blank lines between them) directly above the header.
    pub tag_lines: Vec<String>,
    /// Step lines up to the next scenario, trailing blank lines trimmed.
    pub body_lines: Vec<String>,
    /// Tags found in `tag_lines`, lowercased.
    pub existing_tags: TagSet,
    /// 1-based line of the header in the input text.
    pub line: usize,
}

impl ScenarioBlock {
    /// Tag block, header and body joined back into text.
    pub fn raw_text(&self) -> String {
        self.tag_lines
            .iter()
            .chain(std::iter::once(&self.header))
            .chain(self.body_lines.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Header and body only, without the tag block.
    pub fn body_text(&self) -> String {
        std::iter::once(&self.header)
            .chain(self.body_lines.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureBlock {
    /// Free text after `Feature:`. Empty for scenarios that precede any header.
    pub title: String,
    /// Narrative lines between the header and the first scenario.
    pub description: Vec<String>,
    pub scenarios: Vec<ScenarioBlock>,
    /// 1-based line of the header, 0 for the implicit untitled feature.
    pub line: usize,
}

/// Which output tree a scenario is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Functional,
    NonFunctional,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Functional, Bucket::NonFunctional];

    /// Comment line written under the feature header of a bucket file.
    pub fn comment(&self) -> &'static str {
        match self {
            Bucket::Functional => "# Functional scenarios",
            Bucket::NonFunctional => "# Non-functional scenarios",
        }
    }
}

/// One normalized scenario with its classification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedScenario {
    pub bucket: Bucket,
    pub tags: TagSet,
    pub text: String,
}

/// A feature after normalization and classification, scenarios in source order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedFeature {
    /// 0-based position of the feature in the segmented input.
    #[serde(default)]
    pub index: usize,
    pub title: String,
    pub scenarios: Vec<ClassifiedScenario>,
}

impl ClassifiedFeature {
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            scenarios: Vec::new(),
        }
    }

    /// Normalized texts of one bucket, in source order.
    pub fn bucket(&self, bucket: Bucket) -> Vec<&str> {
        self.scenarios
            .iter()
            .filter(|s| s.bucket == bucket)
            .map(|s| s.text.as_str())
            .collect()
    }

    pub fn has(&self, bucket: Bucket) -> bool {
        self.scenarios.iter().any(|s| s.bucket == bucket)
    }
}
