//! reqwest-backed [`HttpTransport`].

use anyhow::{Context, Result};
use bddrun_ports::{HttpRequest, HttpResponse, HttpTransport};
use bddrun_schema::http::HttpMethod;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("bddrun/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("build reqwest client")?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut req = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .with_context(|| format!("{} {}", request.method, request.url))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .with_context(|| format!("read body of {} {}", request.method, request.url))?;
        Ok(HttpResponse {
            status,
            body: parse_body(&text),
        })
    }
}

fn method(m: HttpMethod) -> reqwest::Method {
    match m {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

/// JSON when the text parses, `null` when empty, the raw text otherwise.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_user_agent_is_a_build_error() {
        let err = ReqwestTransport::new(Duration::from_secs(1), "bad\nagent").unwrap_err();
        assert!(format!("{err:#}").contains("build reqwest client"));
    }

    #[test]
    fn body_parsing() {
        assert_eq!(parse_body(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body("Internal error"), json!("Internal error"));
    }

    #[test]
    fn method_mapping() {
        assert_eq!(method(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(method(HttpMethod::Delete), reqwest::Method::DELETE);
    }
}
