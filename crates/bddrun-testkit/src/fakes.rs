//! In-memory port adapters.

use anyhow::{Result, anyhow};
use bddrun_ports::{
    AuthContext, HttpRequest, HttpResponse, HttpTransport, ReportRenderer, SchemaValidator,
};
use bddrun_schema::execution::{ReportEnvelope, SchemaValidation};
use bddrun_schema::http::HttpMethod;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers by `(method, url)`; unknown requests get 404 with a `null` body.
/// Every request is recorded.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: HashMap<(HttpMethod, String), HttpResponse>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: HttpMethod, url: &str, status: u16, body: Value) -> Self {
        self.routes
            .insert((method, url.to_string()), HttpResponse { status, body });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl HttpTransport for FakeTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        Ok(self
            .routes
            .get(&(request.method, request.url.clone()))
            .cloned()
            .unwrap_or(HttpResponse {
                status: 404,
                body: Value::Null,
            }))
    }
}

/// Never gets a response.
#[derive(Debug, Default)]
pub struct FailingTransport;

impl HttpTransport for FailingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        Err(anyhow!("connection refused: {} {}", request.method, request.url))
    }
}

/// Returns the same validation for every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedValidator(pub SchemaValidation);

impl FixedValidator {
    pub fn not_found() -> Self {
        Self(SchemaValidation::not_found())
    }

    pub fn invalid() -> Self {
        Self(SchemaValidation {
            schema_found: true,
            schema_valid: false,
        })
    }
}

impl SchemaValidator for FixedValidator {
    fn validate(&self, _url: &str, _method: HttpMethod, _status: u16, _body: &Value) -> SchemaValidation {
        self.0
    }
}

/// Authenticated with fixed headers.
#[derive(Debug, Clone)]
pub struct StaticAuth {
    pub headers: Vec<(String, String)>,
}

impl StaticAuth {
    pub fn bearer(token: &str) -> Self {
        Self {
            headers: vec![("Authorization".to_string(), format!("Bearer {token}"))],
        }
    }
}

impl AuthContext for StaticAuth {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn auth_summary(&self) -> String {
        "static test token".to_string()
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }
}

/// Puts the envelope under `execution_output` verbatim.
#[derive(Debug, Default)]
pub struct EchoRenderer;

impl ReportRenderer for EchoRenderer {
    fn render(&self, envelope: &ReportEnvelope) -> Result<Value> {
        Ok(json!({ "execution_output": serde_json::to_value(envelope)? }))
    }
}

/// Output without the `execution_output` field.
#[derive(Debug, Default)]
pub struct MisshapenRenderer;

impl ReportRenderer for MisshapenRenderer {
    fn render(&self, _envelope: &ReportEnvelope) -> Result<Value> {
        Ok(json!({ "something_else": true }))
    }
}

#[derive(Debug, Default)]
pub struct FailingRenderer;

impl ReportRenderer for FailingRenderer {
    fn render(&self, _envelope: &ReportEnvelope) -> Result<Value> {
        Err(anyhow!("renderer exploded"))
    }
}
