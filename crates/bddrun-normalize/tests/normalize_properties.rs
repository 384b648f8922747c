//! Property tests for the normalizer.

use bddrun_normalize::normalize;
use bddrun_tags::TagVocabulary;
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Security".to_string()),
        Just("happy path".to_string()),
        Just("PERF".to_string()),
        Just("Edge".to_string()),
        Just("error".to_string()),
        "[a-z0-9]{1,6}",
    ]
}

fn tag_line() -> impl Strategy<Value = String> {
    ("[ \t]{0,4}", prop::collection::vec("@[A-Za-z_-]{1,8}", 1..4))
        .prop_map(|(indent, tags)| format!("{indent}{}", tags.join(" ")))
}

fn header() -> impl Strategy<Value = String> {
    (
        "[ ]{0,4}",
        "[A-Za-z][A-Za-z ]{0,12}",
        prop::collection::vec(label(), 0..3),
    )
        .prop_map(|(indent, title, labels)| {
            let suffix: String = labels.iter().map(|l| format!(" ({l})")).collect();
            format!("{indent}Scenario: {}{suffix}", title.trim_end())
        })
}

fn other_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("    Given a user".to_string()),
        Just("# comment".to_string()),
        Just("    When I GET /users".to_string()),
        "[ ]{0,6}[A-Za-z ]{0,20}",
    ]
}

fn scenario_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(other_line(), 0..3),
        prop::collection::vec(prop_oneof![tag_line(), Just(String::new())], 0..4),
        header(),
        prop::collection::vec(other_line(), 0..4),
    )
        .prop_map(|(pre, tags, header, body)| {
            pre.into_iter()
                .chain(tags)
                .chain(std::iter::once(header))
                .chain(body)
                .collect::<Vec<_>>()
                .join("\n")
        })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in scenario_text()) {
        let vocab = TagVocabulary::builtin();
        let once = normalize(&text, &vocab);
        let twice = normalize(&once.text, &vocab);
        prop_assert_eq!(&once.text, &twice.text);
        prop_assert_eq!(&once.tags, &twice.tags);
        prop_assert_eq!(&once.title, &twice.title);
    }

    #[test]
    fn detected_tags_are_lowercase(text in scenario_text()) {
        let n = normalize(&text, &TagVocabulary::builtin());
        for tag in &n.tags {
            prop_assert_eq!(tag.as_str().to_string(), tag.as_str().to_lowercase());
        }
    }

    #[test]
    fn arbitrary_text_never_panics(text in "(?s).{0,300}") {
        let vocab = TagVocabulary::builtin();
        let once = normalize(&text, &vocab);
        let twice = normalize(&once.text, &vocab);
        prop_assert_eq!(once.text, twice.text);
    }
}
