use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Lowercase form used as the operation key in OpenAPI path items.
    pub fn operation_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// The request a scenario describes. `path` always starts with `/` and may
/// still contain `{placeholder}` segments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpCall {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// One constraint on a response status code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusRule {
    Exact(u16),
    OneOf(Vec<u16>),
    /// Inclusive on both ends.
    Range(u16, u16),
}

impl StatusRule {
    pub fn holds(&self, status: u16) -> bool {
        match self {
            StatusRule::Exact(code) => status == *code,
            StatusRule::OneOf(codes) => codes.contains(&status),
            StatusRule::Range(lo, hi) => (*lo..=*hi).contains(&status),
        }
    }
}

impl fmt::Display for StatusRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusRule::Exact(code) => write!(f, "{code}"),
            StatusRule::OneOf(codes) => {
                let parts: Vec<String> = codes.iter().map(u16::to_string).collect();
                write!(f, "one of {}", parts.join(", "))
            }
            StatusRule::Range(lo, hi) => write!(f, "{lo}..={hi}"),
        }
    }
}

/// Rules are a conjunction. An empty list holds for every status.
pub fn rules_hold(rules: &[StatusRule], status: u16) -> bool {
    rules.iter().all(|rule| rule.holds(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("HEAD".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
    }

    #[test]
    fn exact_and_range_conjunction() {
        let rules = vec![StatusRule::Exact(200), StatusRule::Range(200, 299)];
        assert!(rules_hold(&rules, 200));
        assert!(!rules_hold(&rules, 201));
    }

    #[test]
    fn one_of_matches_members_only() {
        let rule = StatusRule::OneOf(vec![200, 204]);
        assert!(rule.holds(204));
        assert!(!rule.holds(201));
    }

    #[test]
    fn http_call_omits_missing_body() {
        let call = HttpCall {
            method: HttpMethod::Get,
            path: "/users".into(),
            body: None,
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json, serde_json::json!({"method": "GET", "path": "/users"}));
    }

    #[test]
    fn status_rule_tagging() {
        let json = serde_json::to_value(StatusRule::Range(400, 499)).unwrap();
        assert_eq!(json, serde_json::json!({"range": [400, 499]}));
    }

    proptest! {
        #[test]
        fn empty_rules_hold_for_any_status(status in 100u16..600) {
            prop_assert!(rules_hold(&[], status));
        }

        #[test]
        fn range_holds_inside_bounds(lo in 100u16..400, width in 0u16..100, offset in 0u16..100) {
            let hi = lo + width;
            let status = lo + offset.min(width);
            prop_assert!(StatusRule::Range(lo, hi).holds(status));
        }
    }
}
