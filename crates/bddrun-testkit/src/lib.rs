//! Shared test helpers for the bddrun workspace.
//!
//! Fixture texts and documents, result builders, fake port adapters and
//! proptest strategies. Keeping them here avoids copy-paste across the
//! engine, renderer and CLI tests.

pub mod fakes;
pub mod proptest;

use bddrun_ids::{RunId, ScenarioId};
use bddrun_schema::execution::{ExecutionResult, RunReport, SchemaValidation, Verdict};
use bddrun_schema::http::{HttpCall, HttpMethod};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two features, one label-tagged functional scenario and one security
/// scenario in the first, a single untagged scenario in the second.
pub const MIXED_FEATURES: &str = "\
Feature: User management

  Scenario: List users (Happy Path)
    When I GET /users
    Then the response status should be 200

  @security
  Scenario: Reject anonymous access
    When I GET /admin
    Then the response status should be 401

Feature: Health
  Scenario: Ping
    When I GET /health
    Then the request should succeed
";

pub const GET_USERS: &str = "\
Feature: Users
  Scenario: List users
    When I GET /users
    Then status should be 200
";

/// No request line at all.
pub const NO_HTTP_CALL: &str = "\
Feature: Users
  Scenario: Vague
    Then the API should fail
";

pub const BAD_PAYLOAD: &str = "\
Feature: Users
  Scenario: Broken body
    When I POST /users
    \"\"\"{\"bad json\"\"\"
    Then the request should fail
";

/// Minimal OpenAPI 3 document with one server and a typed `GET /users`.
pub fn openapi_doc(server: &str) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "fixture", "version": "1"},
        "servers": [{"url": server}],
        "paths": {
            "/users": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {"application/json": {"schema": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/User"}
                            }}}
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "integer"}}
                }
            }
        }
    })
}

pub fn openapi_doc_without_servers() -> Value {
    json!({"openapi": "3.0.3", "info": {"title": "fixture", "version": "1"}, "paths": {}})
}

/// A temporary workspace with `doc` saved as `output/openapi.json`.
pub fn workspace_with_doc(doc: &Value) -> TempDir {
    let dir = TempDir::new().expect("create temp workspace");
    write_doc(dir.path(), "openapi.json", doc);
    dir
}

/// Write `doc` to `<root>/output/<name>`, creating the directory.
pub fn write_doc(root: &Path, name: &str, doc: &Value) -> PathBuf {
    let dir = root.join("output");
    std::fs::create_dir_all(&dir).expect("create output dir");
    let path = dir.join(name);
    let text = serde_json::to_string_pretty(doc).expect("serialize doc");
    std::fs::write(&path, text).expect("write doc");
    path
}

pub fn get_call(path: &str) -> HttpCall {
    HttpCall {
        method: HttpMethod::Get,
        path: path.to_string(),
        body: None,
    }
}

pub fn result(name: &str, verdict: Verdict) -> ExecutionResult {
    ExecutionResult {
        scenario_id: ScenarioId::for_scenario("Fixture", name, 0),
        scenario_name: name.to_string(),
        http_call: Some(get_call("/users")),
        resolved_url: "http://localhost/users".to_string(),
        status_code: Some(200),
        response_body: json!([]),
        schema_validation: Some(SchemaValidation::not_found()),
        verdict,
    }
}

pub fn report(results: Vec<ExecutionResult>) -> RunReport {
    RunReport {
        run_id: RunId("run_fixture".to_string()),
        generated_at: Utc.timestamp_opt(0, 0).unwrap(),
        base_url: "http://localhost".to_string(),
        results,
    }
}
