//! Scenario normalization.
//!
//! Collects the tags written above a scenario header and the known
//! parenthesized labels at the end of its title, then rewrites the tag block
//! in canonical form: one tag per line, sorted, indented like the header.
//! Running the normalizer on its own output changes nothing.

use bddrun_schema::feature::{SCENARIO_KEYWORD, ScenarioBlock, header_title, is_scenario_header};
use bddrun_schema::tag::{Tag, TagSet, is_tag_line};
use bddrun_tags::TagVocabulary;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Scenario title with known labels removed. Empty when there is no header.
    pub title: String,
    pub tags: TagSet,
}

pub fn normalize(text: &str, vocabulary: &TagVocabulary) -> Normalized {
    let lines: Vec<&str> = text.split('\n').collect();
    let Some(header_idx) = lines.iter().position(|l| is_scenario_header(l)) else {
        return unchanged(text, String::new());
    };
    let header = lines[header_idx];

    // Walk up through the tag block. Blank lines inside it are part of it,
    // blank lines above the topmost tag line are not.
    let mut tags = TagSet::new();
    let mut top = header_idx;
    for idx in (0..header_idx).rev() {
        let line = lines[idx];
        if is_tag_line(line) {
            tags.extend(Tag::all_in_line(line));
            top = idx;
        } else if !line.trim().is_empty() {
            break;
        }
    }

    let (new_header, label_tags) = strip_labels(header, vocabulary);
    let title = header_title(&new_header, SCENARIO_KEYWORD).to_string();
    tags.extend(label_tags);

    if tags.is_empty() {
        return unchanged(text, title);
    }

    let indent = &header[..header.len() - header.trim_start().len()];
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + tags.len());
    out.extend(lines[..top].iter().map(|l| l.to_string()));
    out.extend(tags.iter().map(|t| format!("{indent}{t}")));
    out.push(new_header);
    out.extend(lines[header_idx + 1..].iter().map(|l| l.to_string()));

    Normalized {
        text: out.join("\n"),
        title,
        tags,
    }
}

/// Normalize a segmented scenario (its tag block, header and body).
pub fn normalize_block(block: &ScenarioBlock, vocabulary: &TagVocabulary) -> Normalized {
    normalize(&block.raw_text(), vocabulary)
}

fn unchanged(text: &str, title: String) -> Normalized {
    Normalized {
        text: text.to_string(),
        title,
        tags: TagSet::new(),
    }
}

/// Remove trailing `(Label)` groups the vocabulary knows, innermost last.
/// Stops at the first unknown label.
fn strip_labels(header: &str, vocabulary: &TagVocabulary) -> (String, Vec<Tag>) {
    let title_start = header
        .find(SCENARIO_KEYWORD)
        .map_or(0, |i| i + SCENARIO_KEYWORD.len());
    let mut head = header.trim_end();
    let mut found = Vec::new();

    while let Some(label) = trailing_label(head, title_start) {
        let Some(tag) = vocabulary.tag_for_label(label.text) else {
            break;
        };
        found.push(tag.clone());
        head = head[..label.open].trim_end();
    }

    if found.is_empty() {
        (header.to_string(), found)
    } else {
        (head.to_string(), found)
    }
}

struct Label<'a> {
    open: usize,
    text: &'a str,
}

fn trailing_label(head: &str, title_start: usize) -> Option<Label<'_>> {
    let inner = head.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    if open < title_start {
        return None;
    }
    let text = &inner[open + 1..];
    if text.trim().is_empty() {
        return None;
    }
    Some(Label { open, text })
}
