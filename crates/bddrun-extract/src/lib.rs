//! Scenario step extraction.
//!
//! Turns the natural-language steps of one scenario into an [`HttpCall`] and
//! a list of [`StatusRule`]s. Both grammars are ordered phrase tables:
//! supporting a new phrasing means adding a row, not a branch.

use bddrun_schema::http::{HttpCall, HttpMethod, StatusRule};
use regex::Regex;
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("HTTP method or URL not found.\nScenario:\n{scenario}")]
    MissingHttpCall { scenario: String },
    #[error("Invalid JSON payload: {message}")]
    InvalidPayload { message: String },
    #[error("No status code in expectation: {line}")]
    InvalidExpectation { line: String },
}

/// One way of phrasing a request step. The pattern must define the named
/// groups `method` and `path` and is matched against the trimmed line.
#[derive(Clone, Copy, Debug)]
pub struct CallPhrase {
    pub name: &'static str,
    pub pattern: &'static str,
}

const METHOD: &str = r"(?P<method>GET|POST|PUT|DELETE|PATCH)";
const PATH: &str = r"(?P<path>/[\w\-/{}.~%?=&:]*)";

pub const CALL_PHRASES: &[CallPhrase] = &[
    CallPhrase {
        name: "when-i-method-to-path",
        pattern: r"^when\s+i\s+{METHOD}\s+to\s+{PATH}",
    },
    CallPhrase {
        name: "when-i-method-path",
        pattern: r"^when\s+i\s+{METHOD}\s+{PATH}",
    },
    CallPhrase {
        name: "when-client-sends-request",
        pattern: r"^when\s+the\s+client\s+sends\s+an?\s+{METHOD}\s+request\s+to\s+{PATH}",
    },
    CallPhrase {
        name: "when-i-send-request",
        pattern: r"^when\s+i\s+send\s+an?\s+{METHOD}\s+request\s+to\s+{PATH}",
    },
];

/// What a matched expectation phrase contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpectationAction {
    /// `Range(min, max)` from the first two status codes after the phrase.
    RangeFromCodes,
    /// `OneOf` when the rest of the line lists codes joined by "or",
    /// otherwise `Exact` of the first code.
    ExactOrOneOf,
    Fixed(u16, u16),
}

#[derive(Clone, Copy, Debug)]
pub struct ExpectationPhrase {
    pub pattern: &'static str,
    pub action: ExpectationAction,
}

pub const EXPECTATION_PHRASES: &[ExpectationPhrase] = &[
    ExpectationPhrase {
        pattern: r"status(?:\s+code)?\s+should\s+be\s+in\s+range\b",
        action: ExpectationAction::RangeFromCodes,
    },
    ExpectationPhrase {
        pattern: r"status(?:\s+code)?\s+should\s+be\b",
        action: ExpectationAction::ExactOrOneOf,
    },
    ExpectationPhrase {
        pattern: r"should\s+succeed\b",
        action: ExpectationAction::Fixed(200, 299),
    },
    ExpectationPhrase {
        pattern: r"should\s+fail\b",
        action: ExpectationAction::Fixed(400, 599),
    },
];

/// Compiled phrase tables.
#[derive(Debug, Clone)]
pub struct Extractor {
    calls: Vec<Regex>,
    expectations: Vec<(Regex, ExpectationAction)>,
    payload: Regex,
    status_code: Regex,
    or_word: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_grammar(CALL_PHRASES, EXPECTATION_PHRASES)
    }

    pub fn with_grammar(
        calls: &[CallPhrase],
        expectations: &[ExpectationPhrase],
    ) -> Result<Self, regex::Error> {
        let calls = calls
            .iter()
            .map(|p| {
                let pattern = p.pattern.replace("{METHOD}", METHOD).replace("{PATH}", PATH);
                Regex::new(&format!("(?i){pattern}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let expectations = expectations
            .iter()
            .map(|p| Ok((Regex::new(&format!("(?i){}", p.pattern))?, p.action)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            calls,
            expectations,
            payload: Regex::new(r#"(?s)"""(.*?)""""#)?,
            status_code: Regex::new(r"\b\d{3}\b")?,
            or_word: Regex::new(r"(?i)\bor\b")?,
        })
    }

    /// The request described by the first matching `When` line, with the
    /// first `"""` block as JSON body.
    pub fn http_call(&self, scenario: &str) -> Result<HttpCall, ExtractError> {
        let (method, path) = scenario
            .lines()
            .map(str::trim)
            .filter(|line| starts_with_when(line))
            .find_map(|line| self.match_call(line))
            .ok_or_else(|| ExtractError::MissingHttpCall {
                scenario: scenario.to_string(),
            })?;
        let body = self.payload(scenario)?;
        Ok(HttpCall { method, path, body })
    }

    fn match_call(&self, line: &str) -> Option<(HttpMethod, String)> {
        self.calls.iter().find_map(|re| {
            let caps = re.captures(line)?;
            let method = caps.name("method")?.as_str().parse().ok()?;
            let path = trim_path(caps.name("path")?.as_str());
            Some((method, path.to_string()))
        })
    }

    /// JSON body from the first `"""` block, `None` when there is no block.
    pub fn payload(&self, scenario: &str) -> Result<Option<Value>, ExtractError> {
        let Some(caps) = self.payload.captures(scenario) else {
            return Ok(None);
        };
        let raw = caps.get(1).map_or("", |m| m.as_str()).trim();
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| ExtractError::InvalidPayload {
                message: e.to_string(),
            })
    }

    /// Status rules in the order their lines appear. Empty means "not checked".
    pub fn expectations(&self, scenario: &str) -> Result<Vec<StatusRule>, ExtractError> {
        let mut rules = Vec::new();
        for line in scenario.lines() {
            if let Some(rule) = self.match_expectation(line)? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    fn match_expectation(&self, line: &str) -> Result<Option<StatusRule>, ExtractError> {
        let Some((m, action)) = self
            .expectations
            .iter()
            .find_map(|(re, action)| re.find(line).map(|m| (m, *action)))
        else {
            return Ok(None);
        };
        let rest = &line[m.end()..];
        let invalid = || ExtractError::InvalidExpectation {
            line: line.trim().to_string(),
        };

        let rule = match action {
            ExpectationAction::Fixed(lo, hi) => StatusRule::Range(lo, hi),
            ExpectationAction::RangeFromCodes => {
                let codes = self.codes(rest).ok_or_else(invalid)?;
                match codes.as_slice() {
                    [a, b, ..] => StatusRule::Range(*a.min(b), *a.max(b)),
                    _ => return Err(invalid()),
                }
            }
            ExpectationAction::ExactOrOneOf => {
                let codes = self.codes(rest).ok_or_else(invalid)?;
                let Some(&first) = codes.first() else {
                    return Err(invalid());
                };
                if codes.len() > 1 && self.or_word.is_match(rest) {
                    StatusRule::OneOf(codes)
                } else {
                    StatusRule::Exact(first)
                }
            }
        };
        Ok(Some(rule))
    }

    /// Three-digit codes in `text`; `None` if one does not fit a `u16`.
    fn codes(&self, text: &str) -> Option<Vec<u16>> {
        self.status_code
            .find_iter(text)
            .map(|m| m.as_str().parse().ok())
            .collect()
    }
}

fn starts_with_when(line: &str) -> bool {
    line.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("when"))
}

/// Sentence punctuation after a path is not part of it.
fn trim_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    if trimmed.is_empty() { "/" } else { trimmed }
}
