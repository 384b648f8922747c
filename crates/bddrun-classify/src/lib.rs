//! Scenario classification.
//!
//! A scenario is non-functional as soon as one of its tags is in the
//! vocabulary's non-functional set. Everything else, including untagged
//! scenarios, is functional.

use bddrun_schema::feature::Bucket;
use bddrun_schema::tag::TagSet;
use bddrun_tags::TagVocabulary;

pub fn classify(tags: &TagSet, vocabulary: &TagVocabulary) -> Bucket {
    if tags.iter().any(|t| vocabulary.is_non_functional(t)) {
        Bucket::NonFunctional
    } else {
        Bucket::Functional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bddrun_schema::tag::Tag;
    use proptest::prelude::*;

    fn tags(list: &[&str]) -> TagSet {
        list.iter().filter_map(|t| Tag::parse(t)).collect()
    }

    #[test]
    fn untagged_is_functional() {
        assert_eq!(
            classify(&TagSet::new(), &TagVocabulary::builtin()),
            Bucket::Functional
        );
    }

    #[test]
    fn functional_tags_stay_functional() {
        let v = TagVocabulary::builtin();
        assert_eq!(classify(&tags(&["@smoke", "@edge"]), &v), Bucket::Functional);
    }

    #[test]
    fn non_functional_dominates() {
        let v = TagVocabulary::builtin();
        assert_eq!(
            classify(&tags(&["@smoke", "@security"]), &v),
            Bucket::NonFunctional
        );
        assert_eq!(classify(&tags(&["@performance"]), &v), Bucket::NonFunctional);
    }

    #[test]
    fn custom_non_functional_tags_count() {
        let v = TagVocabulary::builtin()
            .extend(Vec::<(String, String)>::new(), ["@load"])
            .unwrap();
        assert_eq!(classify(&tags(&["@load"]), &v), Bucket::NonFunctional);
    }

    proptest! {
        #[test]
        fn classification_matches_intersection(names in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
            let v = TagVocabulary::builtin();
            let set: TagSet = names.iter().filter_map(|n| Tag::parse(&format!("@{n}"))).collect();
            let expected = if set.iter().any(|t| v.non_functional().contains(t)) {
                Bucket::NonFunctional
            } else {
                Bucket::Functional
            };
            prop_assert_eq!(classify(&set, &v), expected);
        }

        #[test]
        fn adding_a_non_functional_tag_always_wins(names in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
            let v = TagVocabulary::builtin();
            let mut set: TagSet = names.iter().filter_map(|n| Tag::parse(&format!("@{n}"))).collect();
            set.insert(Tag::parse("@security").unwrap());
            prop_assert_eq!(classify(&set, &v), Bucket::NonFunctional);
        }
    }
}
