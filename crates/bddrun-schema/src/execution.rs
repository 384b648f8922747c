use crate::http::HttpCall;
use bddrun_ids::{RunId, ScenarioId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// What the schema validator found for one response.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidation {
    pub schema_found: bool,
    pub schema_valid: bool,
}

impl SchemaValidation {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A missing schema never fails a scenario.
    pub fn accepts(&self) -> bool {
        !self.schema_found || self.schema_valid
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

/// Result of executing one scenario. Built once by the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub http_call: Option<HttpCall>,
    /// Empty when no request was made.
    pub resolved_url: String,
    pub status_code: Option<u16>,
    /// Parsed JSON when possible, otherwise the raw text or the error message.
    pub response_body: Value,
    pub schema_validation: Option<SchemaValidation>,
    pub verdict: Verdict,
}

impl ExecutionResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

/// The fixed shape handed to report renderers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    pub results: Vec<ExecutionResult>,
    pub curl_commands: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: RunId,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub base_url: String,
    pub results: Vec<ExecutionResult>,
}

impl RunSummary {
    pub fn of(results: &[ExecutionResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary::of(&self.results)
    }

    pub fn envelope(&self) -> ReportEnvelope {
        ReportEnvelope {
            results: self.results.clone(),
            curl_commands: Vec::new(),
        }
    }
}

/// The single value every run produces.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Completed {
        report: RunReport,
        execution_output: Value,
    },
    Failed {
        error: String,
    },
}

impl RunOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        RunOutcome::Failed {
            error: error.into(),
        }
    }

    /// The renderer's output, or `{"error": ...}` for a failed run.
    pub fn execution_output(&self) -> Value {
        match self {
            RunOutcome::Completed {
                execution_output, ..
            } => execution_output.clone(),
            RunOutcome::Failed { error } => json!({ "error": error }),
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed { report, .. } => Some(report),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}
