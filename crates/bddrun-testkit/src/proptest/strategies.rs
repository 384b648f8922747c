//! Reusable generators for Gherkin-like text and HTTP data.

use bddrun_schema::tag::{Tag, TagSet};
use proptest::prelude::*;

/// A canonical tag, sometimes one of the built-in non-functional ones.
pub fn strategy_tag() -> impl Strategy<Value = Tag> {
    prop_oneof![
        Just("@security".to_string()),
        Just("@performance".to_string()),
        Just("@smoke".to_string()),
        "@[a-z][a-z0-9_-]{0,8}",
    ]
    .prop_filter_map("valid tag", |s| Tag::parse(&s))
}

pub fn strategy_tag_set() -> impl Strategy<Value = TagSet> {
    prop::collection::btree_set(strategy_tag(), 0..4)
}

/// Labels the built-in vocabulary knows, in assorted spellings.
pub fn strategy_known_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Security".to_string()),
        Just("Happy Path".to_string()),
        Just("perf".to_string()),
        Just("EDGE".to_string()),
        Just("Negative".to_string()),
    ]
}

pub fn strategy_scenario_title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,20}".prop_map(|s| s.trim_end().to_string())
}

pub fn strategy_status_code() -> impl Strategy<Value = u16> {
    100u16..600
}

/// One scenario: optional tag line, header with optional label, a request
/// line and a status line.
pub fn strategy_scenario() -> impl Strategy<Value = String> {
    (
        prop::option::of(strategy_tag()),
        strategy_scenario_title(),
        prop::option::of(strategy_known_label()),
        "/[a-z]{1,8}",
        strategy_status_code(),
    )
        .prop_map(|(tag, title, label, path, status)| {
            let mut lines = Vec::new();
            if let Some(tag) = tag {
                lines.push(format!("  {tag}"));
            }
            match label {
                Some(label) => lines.push(format!("  Scenario: {title} ({label})")),
                None => lines.push(format!("  Scenario: {title}")),
            }
            lines.push(format!("    When I GET {path}"));
            lines.push(format!("    Then the response status should be {status}"));
            lines.join("\n")
        })
}

/// One to three features of one to four scenarios each.
pub fn strategy_feature_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            strategy_scenario_title(),
            prop::collection::vec(strategy_scenario(), 1..5),
        ),
        1..4,
    )
    .prop_map(|features| {
        features
            .into_iter()
            .map(|(title, scenarios)| format!("Feature: {title}\n\n{}", scenarios.join("\n\n")))
            .collect::<Vec<_>>()
            .join("\n\n")
    })
}
