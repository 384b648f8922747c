use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A canonical scenario tag: `@` followed by `[a-z0-9_-]+`.
///
/// Tags are always stored lowercase so that `@Smoke` and `@smoke` collapse
/// into the same set member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

/// Tags attached to one scenario. Ordered so re-emitted tag blocks are stable.
pub type TagSet = BTreeSet<Tag>;

impl Tag {
    /// Parse one `@token`, lowercasing it. Returns `None` for anything that is
    /// not a well-formed tag.
    pub fn parse(token: &str) -> Option<Tag> {
        let rest = token.trim().strip_prefix('@')?;
        if rest.is_empty() {
            return None;
        }
        let lower = rest.to_ascii_lowercase();
        if lower
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Some(Tag(format!("@{lower}")))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All well-formed tags on a tag line (`@smoke @edge`).
    pub fn all_in_line(line: &str) -> Vec<Tag> {
        line.split_whitespace().filter_map(Tag::parse).collect()
    }
}

/// A tag line is any line whose first non-blank character is `@`.
pub fn is_tag_line(line: &str) -> bool {
    line.trim_start().starts_with('@')
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for Tag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::parse(&value).ok_or_else(|| format!("invalid tag: {value:?}"))
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}
