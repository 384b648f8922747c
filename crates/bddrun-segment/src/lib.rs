//! Line-based segmentation of Gherkin-like text.
//!
//! Splits text into [`FeatureBlock`]s and each feature into ordered
//! [`ScenarioBlock`]s. The segmenter is tolerant: it never fails, it only
//! reports [`SegmentWarning`]s for tag lines it had to move or drop.

use bddrun_schema::feature::{
    DOCSTRING_DELIMITER, FEATURE_KEYWORD, FeatureBlock, SCENARIO_KEYWORD, ScenarioBlock,
    header_title, is_comment_line, is_feature_header, is_scenario_header,
};
use bddrun_schema::tag::{Tag, TagSet, is_tag_line};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the segmenter had to repair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentWarning {
    /// Tags followed by a non-scenario line were attached to the next scenario.
    CarriedTags {
        line: usize,
        scenario_line: usize,
        tags: Vec<String>,
    },
    /// Tags with no scenario after them in their feature.
    DroppedTags { line: usize, tags: Vec<String> },
}

impl fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentWarning::CarriedTags {
                line,
                scenario_line,
                tags,
            } => write!(
                f,
                "line {line}: tags {} moved to scenario at line {scenario_line}",
                tags.join(" ")
            ),
            SegmentWarning::DroppedTags { line, tags } => write!(
                f,
                "line {line}: tags {} not followed by a scenario, dropped",
                tags.join(" ")
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segmented {
    pub features: Vec<FeatureBlock>,
    pub warnings: Vec<SegmentWarning>,
}

impl Segmented {
    pub fn scenario_count(&self) -> usize {
        self.features.iter().map(|f| f.scenarios.len()).sum()
    }

    /// All scenarios with their feature, in document order.
    pub fn scenarios(&self) -> impl Iterator<Item = (&FeatureBlock, &ScenarioBlock)> {
        self.features
            .iter()
            .flat_map(|f| f.scenarios.iter().map(move |s| (f, s)))
    }
}

/// A run of tag lines (blank lines allowed in between) not yet claimed.
#[derive(Default)]
struct TagRun {
    start: usize,
    lines: Vec<String>,
}

impl TagRun {
    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, line_no: usize, line: &str) {
        if self.lines.is_empty() {
            self.start = line_no;
        }
        self.lines.push(line.to_string());
    }

    fn take(&mut self) -> TagRun {
        let mut run = std::mem::take(self);
        trim_trailing_blank(&mut run.lines);
        run
    }

    fn tags(&self) -> Vec<String> {
        self.lines
            .iter()
            .flat_map(|l| Tag::all_in_line(l))
            .map(String::from)
            .collect()
    }
}

/// An odd number of `"""` on a line opens or closes a docstring.
fn toggles_docstring(trimmed: &str) -> bool {
    trimmed.matches(DOCSTRING_DELIMITER).count() % 2 == 1
}

#[derive(Default)]
struct Segmenter {
    out: Segmented,
    feature: Option<FeatureBlock>,
    scenario: Option<ScenarioBlock>,
    pending: TagRun,
    carried: Vec<TagRun>,
    in_docstring: bool,
}

pub fn segment(text: &str) -> Segmented {
    let mut s = Segmenter::default();
    for (idx, line) in text.lines().enumerate() {
        s.line(idx + 1, line);
    }
    s.finish()
}

impl Segmenter {
    fn line(&mut self, line_no: usize, line: &str) {
        let trimmed = line.trim();

        if self.in_docstring {
            self.body(line);
            if toggles_docstring(trimmed) {
                self.in_docstring = false;
            }
            return;
        }

        if trimmed.starts_with(DOCSTRING_DELIMITER) {
            self.dangle();
            self.body(line);
            self.in_docstring = toggles_docstring(trimmed);
            return;
        }

        if is_comment_line(line) {
            return;
        }

        if is_tag_line(line) {
            self.pending.push(line_no, line);
            return;
        }

        if trimmed.is_empty() {
            if !self.pending.is_empty() {
                self.pending.lines.push(line.to_string());
            } else if let Some(sc) = self.scenario.as_mut() {
                sc.body_lines.push(line.to_string());
            }
            return;
        }

        if is_feature_header(line) {
            self.close_feature();
            // Feature-level tags are not scenario tags.
            self.pending = TagRun::default();
            self.feature = Some(FeatureBlock {
                title: header_title(line, FEATURE_KEYWORD).to_string(),
                description: Vec::new(),
                scenarios: Vec::new(),
                line: line_no,
            });
            return;
        }

        if is_scenario_header(line) {
            self.open_scenario(line_no, line);
            return;
        }

        self.dangle();
        if let Some(sc) = self.scenario.as_mut() {
            sc.body_lines.push(line.to_string());
        } else if let Some(feature) = self.feature.as_mut() {
            feature.description.push(trimmed.to_string());
        }
        // A step such as `When I POST to /x with body """` opens a block too.
        self.in_docstring = toggles_docstring(trimmed);
    }

    fn body(&mut self, line: &str) {
        if let Some(sc) = self.scenario.as_mut() {
            sc.body_lines.push(line.to_string());
        }
    }

    /// The pending tag run is followed by something that is not a scenario.
    fn dangle(&mut self) {
        if !self.pending.is_empty() {
            let run = self.pending.take();
            self.carried.push(run);
        }
    }

    fn open_scenario(&mut self, line_no: usize, line: &str) {
        self.close_scenario();
        if self.feature.is_none() {
            self.feature = Some(FeatureBlock {
                title: String::new(),
                description: Vec::new(),
                scenarios: Vec::new(),
                line: 0,
            });
        }

        let mut tag_lines = Vec::new();
        for run in std::mem::take(&mut self.carried) {
            self.out.warnings.push(SegmentWarning::CarriedTags {
                line: run.start,
                scenario_line: line_no,
                tags: run.tags(),
            });
            tag_lines.extend(run.lines);
        }
        tag_lines.extend(std::mem::take(&mut self.pending).lines);

        let existing_tags: TagSet = tag_lines
            .iter()
            .filter(|l| is_tag_line(l))
            .flat_map(|l| Tag::all_in_line(l))
            .collect();

        self.scenario = Some(ScenarioBlock {
            title: header_title(line, SCENARIO_KEYWORD).to_string(),
            header: line.to_string(),
            tag_lines,
            body_lines: Vec::new(),
            existing_tags,
            line: line_no,
        });
    }

    fn close_scenario(&mut self) {
        if let Some(mut sc) = self.scenario.take() {
            trim_trailing_blank(&mut sc.body_lines);
            if let Some(feature) = self.feature.as_mut() {
                feature.scenarios.push(sc);
            }
        }
    }

    fn drop_carried(&mut self) {
        for run in std::mem::take(&mut self.carried) {
            self.out.warnings.push(SegmentWarning::DroppedTags {
                line: run.start,
                tags: run.tags(),
            });
        }
    }

    fn close_feature(&mut self) {
        self.close_scenario();
        self.drop_carried();
        if let Some(feature) = self.feature.take() {
            self.out.features.push(feature);
        }
    }

    fn finish(mut self) -> Segmented {
        self.dangle();
        self.in_docstring = false;
        self.close_feature();
        self.out
    }
}

fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(seg: &Segmented) -> Vec<(&str, Vec<&str>)> {
        seg.features
            .iter()
            .map(|f| {
                (
                    f.title.as_str(),
                    f.scenarios.iter().map(|s| s.title.as_str()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn splits_features_and_scenarios() {
        let text = "Feature: Users\n  Scenario: List\n    When I GET /users\n\n  Scenario: Create\n    When I POST to /users\nFeature: Orders\n  Scenario: List orders\n    When I GET /orders\n";
        let seg = segment(text);
        assert_eq!(
            titles(&seg),
            vec![
                ("Users", vec!["List", "Create"]),
                ("Orders", vec!["List orders"])
            ]
        );
        assert!(seg.warnings.is_empty());
        assert_eq!(seg.scenario_count(), 3);
    }

    #[test]
    fn tags_after_blank_line_belong_to_next_scenario() {
        let text = "Feature: F\n  Scenario: A\n    Given x\n\n  @security\n\n  @edge\n  Scenario: B\n    Given y\n";
        let seg = segment(text);
        let f = &seg.features[0];
        assert_eq!(f.scenarios[0].body_lines, vec!["    Given x"]);
        assert!(f.scenarios[0].tag_lines.is_empty());
        assert_eq!(
            f.scenarios[1].tag_lines,
            vec!["  @security", "", "  @edge"]
        );
        let tags: Vec<&str> = f.scenarios[1].existing_tags.iter().map(Tag::as_str).collect();
        assert_eq!(tags, vec!["@edge", "@security"]);
    }

    #[test]
    fn comments_and_feature_tags_are_stripped() {
        let text = "# generated\n@api\nFeature: F\n  # only a note\n  Scenario: A\n    # inline note\n    Given x\n";
        let seg = segment(text);
        let sc = &seg.features[0].scenarios[0];
        assert!(sc.tag_lines.is_empty());
        assert_eq!(sc.body_lines, vec!["    Given x"]);
        assert!(seg.warnings.is_empty());
    }

    #[test]
    fn docstring_lines_are_verbatim() {
        let text = "Feature: F\n  Scenario: A\n    When I POST to /users\n    \"\"\"\n    @notatag\n    Scenario: not a header\n    # not a comment\n    \"\"\"\n    Then status should be 201\n";
        let seg = segment(text);
        assert_eq!(seg.scenario_count(), 1);
        let body = &seg.features[0].scenarios[0].body_lines;
        assert_eq!(body.len(), 7);
        assert_eq!(body[2], "    @notatag");
        assert_eq!(body[4], "    # not a comment");
    }

    #[test]
    fn single_line_docstring_does_not_open_a_block() {
        let text = "Feature: F\n  Scenario: A\n    When I POST to /x\n    \"\"\"{\"a\": 1}\"\"\"\n  Scenario: B\n    Given y\n";
        let seg = segment(text);
        assert_eq!(seg.scenario_count(), 2);
    }

    #[test]
    fn inline_docstring_opener_keeps_following_scenarios() {
        let text = "Feature: Users\n  Scenario: Create\n    When I POST to /users with body \"\"\"\n    {\"name\": \"Ann\"}\n    \"\"\"\n    Then status should be 201\n\n  Scenario: List\n    When I GET /users\n    Then status should be 200\n";
        let seg = segment(text);
        assert_eq!(titles(&seg), vec![("Users", vec!["Create", "List"])]);
        let create = &seg.features[0].scenarios[0];
        assert_eq!(create.body_lines.len(), 4);
        assert_eq!(create.body_lines[3], "    Then status should be 201");
        assert_eq!(
            seg.features[0].scenarios[1].body_lines,
            vec!["    When I GET /users", "    Then status should be 200"]
        );
    }

    #[test]
    fn inline_opener_protects_headers_inside_the_block() {
        let text = "Feature: F\n  Scenario: A\n    When I POST to /x with \"\"\"\n    Scenario: not a header\n    \"\"\"\n  Scenario: B\n    Given y\n";
        let seg = segment(text);
        assert_eq!(titles(&seg), vec![("F", vec!["A", "B"])]);
    }

    #[test]
    fn description_lines_are_not_scenarios() {
        let text = "Feature: Users\n  As an admin\n  I want to manage users\n\n  Scenario: A\n    Given x\n";
        let seg = segment(text);
        let f = &seg.features[0];
        assert_eq!(f.description, vec!["As an admin", "I want to manage users"]);
        assert_eq!(f.scenarios.len(), 1);
    }

    #[test]
    fn scenarios_before_first_feature_form_implicit_feature() {
        let text = "Scenario: Orphan\n  Given x\nFeature: Real\n  Scenario: A\n    Given y\n";
        let seg = segment(text);
        assert_eq!(titles(&seg), vec![("", vec!["Orphan"]), ("Real", vec!["A"])]);
        assert_eq!(seg.features[0].line, 0);
    }

    #[test]
    fn preamble_without_scenarios_is_ignored() {
        let seg = segment("Here are your tests:\n\nFeature: F\n  Scenario: A\n");
        assert_eq!(seg.features.len(), 1);
        assert_eq!(seg.features[0].title, "F");
    }

    #[test]
    fn dangling_tags_are_carried_to_next_scenario() {
        let text = "Feature: F\n  @security\n  Some narrative\n  @edge\n  Scenario: A\n    Given x\n";
        let seg = segment(text);
        let sc = &seg.features[0].scenarios[0];
        assert_eq!(sc.tag_lines, vec!["  @security", "  @edge"]);
        assert_eq!(sc.existing_tags.len(), 2);
        assert_eq!(
            seg.warnings,
            vec![SegmentWarning::CarriedTags {
                line: 2,
                scenario_line: 5,
                tags: vec!["@security".into()],
            }]
        );
    }

    #[test]
    fn dangling_tags_without_following_scenario_are_dropped() {
        let text = "Feature: F\n  Scenario: A\n    Given x\n  @perf\n    And y\nFeature: G\n";
        let seg = segment(text);
        assert_eq!(
            seg.warnings,
            vec![SegmentWarning::DroppedTags {
                line: 4,
                tags: vec!["@perf".into()],
            }]
        );
        assert_eq!(
            seg.features[0].scenarios[0].body_lines,
            vec!["    Given x", "    And y"]
        );
    }

    #[test]
    fn trailing_tags_at_end_of_text_are_dropped() {
        let seg = segment("Feature: F\n  Scenario: A\n    Given x\n  @orphan\n");
        assert_eq!(seg.warnings.len(), 1);
        assert!(seg.warnings[0].to_string().contains("@orphan"));
    }

    #[test]
    fn header_lines_are_kept_verbatim() {
        let seg = segment("Feature: F\n\n    Scenario: Login (Security)\n      Given x\n");
        let sc = &seg.features[0].scenarios[0];
        assert_eq!(sc.header, "    Scenario: Login (Security)");
        assert_eq!(sc.title, "Login (Security)");
        assert_eq!(sc.line, 3);
    }

    #[test]
    fn crlf_input() {
        let seg = segment("Feature: F\r\n  Scenario: A\r\n    Given x\r\n");
        assert_eq!(seg.features[0].scenarios[0].body_lines, vec!["    Given x"]);
    }

    #[test]
    fn empty_input() {
        let seg = segment("");
        assert!(seg.features.is_empty());
        assert!(seg.warnings.is_empty());
    }

    #[test]
    fn warning_serializes_with_kind() {
        let w = SegmentWarning::DroppedTags {
            line: 3,
            tags: vec!["@x".into()],
        };
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["kind"], "dropped_tags");
    }
}
