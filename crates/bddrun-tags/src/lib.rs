//! Tag vocabulary shared by the normalizer and the classifier.
//!
//! Maps parenthesized scenario title labels (`"(Security)"`) to canonical tags
//! and names the tags that route a scenario to the non-functional bucket.
//! A vocabulary is a plain value passed to whoever needs it.

use anyhow::{Result, anyhow};
use bddrun_schema::tag::{Tag, TagSet};
use std::collections::BTreeMap;

/// Built-in label table. Keys are lowercase.
pub const BUILTIN_LABELS: &[(&str, &str)] = &[
    ("happy path", "@smoke"),
    ("happy", "@smoke"),
    ("smoke", "@smoke"),
    ("edge", "@edge"),
    ("negative", "@negative"),
    ("error", "@negative"),
    ("security", "@security"),
    ("performance", "@performance"),
    ("perf", "@performance"),
];

pub const BUILTIN_NON_FUNCTIONAL: &[&str] = &["@security", "@performance"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagVocabulary {
    labels: BTreeMap<String, Tag>,
    non_functional: TagSet,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TagVocabulary {
    pub fn builtin() -> Self {
        let labels = BUILTIN_LABELS
            .iter()
            .filter_map(|(label, tag)| Some((label.to_string(), Tag::parse(tag)?)))
            .collect();
        let non_functional = BUILTIN_NON_FUNCTIONAL
            .iter()
            .filter_map(|t| Tag::parse(t))
            .collect();
        Self {
            labels,
            non_functional,
        }
    }

    /// A vocabulary with nothing in it. Every label is unknown and every
    /// scenario is functional.
    pub fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
            non_functional: TagSet::new(),
        }
    }

    /// Add label entries and non-functional tags on top of this vocabulary.
    /// Later entries override earlier ones for the same label.
    pub fn extend<L, K, V, N, T>(mut self, labels: L, non_functional: N) -> Result<Self>
    where
        L: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        N: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for (label, tag) in labels {
            let key = normalize_label(label.as_ref());
            if key.is_empty() {
                return Err(anyhow!("empty vocabulary label for tag {:?}", tag.as_ref()));
            }
            let tag = parse_tag(tag.as_ref())?;
            self.labels.insert(key, tag);
        }
        for tag in non_functional {
            self.non_functional.insert(parse_tag(tag.as_ref())?);
        }
        Ok(self)
    }

    /// Tag for a title label, case-insensitive, surrounding blanks ignored.
    pub fn tag_for_label(&self, label: &str) -> Option<&Tag> {
        self.labels.get(&normalize_label(label))
    }

    pub fn is_non_functional(&self, tag: &Tag) -> bool {
        self.non_functional.contains(tag)
    }

    pub fn non_functional(&self) -> &TagSet {
        &self.non_functional
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn parse_tag(raw: &str) -> Result<Tag> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    };
    Tag::parse(&candidate).ok_or_else(|| anyhow!("invalid tag in vocabulary: {raw:?}"))
}
