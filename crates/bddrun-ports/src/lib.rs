use anyhow::Result;
use bddrun_schema::execution::{ReportEnvelope, SchemaValidation};
use bddrun_schema::http::HttpMethod;
use serde_json::Value;

/// One outgoing request, fully resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

/// What came back. `body` is parsed JSON when the payload was JSON,
/// otherwise a JSON string holding the raw text.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

/// Issues one request.
///
/// An `Err` means no response was received (connection refused, timeout).
/// Any status code, including 5xx, is an `Ok`.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Checks a response against the API description.
///
/// Adapters live in `bddrun-openapi`.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, url: &str, method: HttpMethod, status: u16, body: &Value)
    -> SchemaValidation;
}

/// Authentication capability consulted before and during a run.
pub trait AuthContext: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn auth_summary(&self) -> String;

    /// Headers added to every request.
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Rendering.
///
/// Renderers are pure: envelope in, value out. The returned object must carry
/// an `execution_output` field.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, envelope: &ReportEnvelope) -> Result<Value>;
}
