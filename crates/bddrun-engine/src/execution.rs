use anyhow::{Context, Result};
use bddrun_extract::Extractor;
use bddrun_ids::{RunId, ScenarioId};
use bddrun_logging::Logger;
use bddrun_openapi::{OpenApiDocument, OpenApiSchemaValidator};
use bddrun_ports::{AuthContext, HttpRequest, HttpTransport, ReportRenderer, SchemaValidator};
use bddrun_schema::execution::{ExecutionResult, RunOutcome, RunReport, RunSummary, Verdict};
use bddrun_schema::http::{HttpCall, StatusRule, rules_hold};
use bddrun_segment::segment;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scenario as the execution engine sees it: header and body, no tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedScenario {
    pub id: ScenarioId,
    pub name: String,
    pub text: String,
}

/// Scenarios of `feature_text` in document order. Feature and tag lines are
/// not part of a scenario's text.
pub fn plan_scenarios(feature_text: &str) -> Vec<PlannedScenario> {
    let segmented = segment(feature_text);
    segmented
        .features
        .iter()
        .flat_map(|feature| {
            feature
                .scenarios
                .iter()
                .enumerate()
                .map(move |(ordinal, scenario)| PlannedScenario {
                    id: ScenarioId::for_scenario(&feature.title, &scenario.title, ordinal),
                    name: scenario.title.clone(),
                    text: scenario.body_text(),
                })
        })
        .collect()
}

/// What the extractors make of one scenario, without sending anything.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPlan {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub http_call: Option<HttpCall>,
    pub status_rules: Vec<StatusRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioPlan {
    pub fn is_executable(&self) -> bool {
        self.error.is_none()
    }
}

/// What `extractor` finds in each scenario of `feature_text`.
pub fn extract_plan(extractor: &Extractor, feature_text: &str) -> Vec<ScenarioPlan> {
    plan_scenarios(feature_text)
        .into_iter()
        .map(|scenario| {
            let extracted = extractor.http_call(&scenario.text).and_then(|call| {
                let rules = extractor.expectations(&scenario.text)?;
                Ok((call, rules))
            });
            let (http_call, status_rules, error) = match extracted {
                Ok((call, rules)) => (Some(call), rules, None),
                Err(e) => (None, Vec::new(), Some(e.to_string())),
            };
            ScenarioPlan {
                scenario_id: scenario.id,
                scenario_name: scenario.name,
                http_call,
                status_rules,
                error,
            }
        })
        .collect()
}

/// Runs scenarios against a live API.
///
/// Scenario failures never abort a run; only document problems (no API
/// description, no servers) and renderer failures turn into
/// [`RunOutcome::Failed`].
pub struct ExecutionEngine<'a> {
    transport: &'a dyn HttpTransport,
    auth: &'a dyn AuthContext,
    renderer: &'a dyn ReportRenderer,
    extractor: Extractor,
    concurrency: usize,
    logger: Logger,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        auth: &'a dyn AuthContext,
        renderer: &'a dyn ReportRenderer,
    ) -> Result<Self> {
        let extractor = Extractor::new().context("compile phrase grammar")?;
        Ok(Self {
            transport,
            auth,
            renderer,
            extractor,
            concurrency: 1,
            logger: Logger::silent(),
        })
    }

    /// Scenarios run at once. Results keep document order regardless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.for_component("engine");
        self
    }

    /// Dry run: extracted calls and status rules per scenario.
    pub fn plan(&self, feature_text: &str) -> Vec<ScenarioPlan> {
        extract_plan(&self.extractor, feature_text)
    }

    /// Execute against the newest API description in `openapi_dir`.
    pub fn execute_project(&self, feature_text: &str, openapi_dir: &Path) -> RunOutcome {
        self.log_auth();
        match OpenApiDocument::load_latest(openapi_dir) {
            Ok(doc) => {
                self.logger.debug(format!("API description: {:?}", doc.path));
                self.run_document(feature_text, &doc)
            }
            Err(e) => self.fail(format!("{e:#}")),
        }
    }

    /// Execute with an explicit base URL and validator.
    pub fn execute(
        &self,
        feature_text: &str,
        base_url: &str,
        validator: &dyn SchemaValidator,
    ) -> RunOutcome {
        self.log_auth();
        self.run(feature_text, base_url, validator)
    }

    /// One scenario through extraction, request and checks.
    pub fn run_scenario(
        &self,
        scenario: &PlannedScenario,
        base_url: &str,
        validator: &dyn SchemaValidator,
    ) -> ExecutionResult {
        let extracted = self.extractor.http_call(&scenario.text).and_then(|call| {
            let rules = self.extractor.expectations(&scenario.text)?;
            Ok((call, rules))
        });
        let (call, rules) = match extracted {
            Ok(found) => found,
            Err(e) => return failed_before_request(scenario, e.to_string()),
        };

        let url = format!("{base_url}{}", call.path);
        let request = HttpRequest {
            method: call.method,
            url: url.clone(),
            body: call.body.clone(),
            headers: self.auth.headers(),
        };
        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(e) => {
                return ExecutionResult {
                    scenario_id: scenario.id.clone(),
                    scenario_name: scenario.name.clone(),
                    http_call: Some(call),
                    resolved_url: url,
                    status_code: None,
                    response_body: Value::String(format!("{e:#}")),
                    schema_validation: None,
                    verdict: Verdict::Failed,
                };
            }
        };

        let status_ok = rules_hold(&rules, response.status);
        let schema = validator.validate(&url, call.method, response.status, &response.body);
        let verdict = if status_ok && schema.accepts() {
            Verdict::Passed
        } else {
            Verdict::Failed
        };
        ExecutionResult {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            http_call: Some(call),
            resolved_url: url,
            status_code: Some(response.status),
            response_body: response.body,
            schema_validation: Some(schema),
            verdict,
        }
    }

    fn run_document(&self, feature_text: &str, doc: &OpenApiDocument) -> RunOutcome {
        let base_url = match doc.base_url() {
            Ok(url) => url,
            Err(e) => return self.fail(e.to_string()),
        };
        let validator = OpenApiSchemaValidator::new(doc.value.clone());
        self.run(feature_text, &base_url, &validator)
    }

    fn run(&self, feature_text: &str, base_url: &str, validator: &dyn SchemaValidator) -> RunOutcome {
        self.logger.info(format!("Base URL: {base_url}"));
        let scenarios = plan_scenarios(feature_text);
        let results = self.run_all(&scenarios, base_url, validator);

        let report = RunReport {
            run_id: RunId::now("run"),
            generated_at: chrono::Utc::now(),
            base_url: base_url.to_string(),
            results,
        };
        let RunSummary {
            total,
            passed,
            failed,
        } = report.summary();
        self.logger
            .info(format!("{total} scenarios: {passed} passed, {failed} failed"));

        let rendered = match self.renderer.render(&report.envelope()) {
            Ok(rendered) => rendered,
            Err(e) => return self.fail(format!("render report: {e:#}")),
        };
        match rendered.get("execution_output") {
            Some(output) => RunOutcome::Completed {
                execution_output: output.clone(),
                report,
            },
            None => self.fail("renderer output has no execution_output field"),
        }
    }

    fn run_all(
        &self,
        scenarios: &[PlannedScenario],
        base_url: &str,
        validator: &dyn SchemaValidator,
    ) -> Vec<ExecutionResult> {
        let workers = self.concurrency.min(scenarios.len());
        if workers <= 1 {
            return scenarios
                .iter()
                .map(|s| self.run_logged(s, base_url, validator))
                .collect();
        }

        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<ExecutionResult>> = vec![None; scenarios.len()];
        std::thread::scope(|s| {
            let next = &next;
            let mut joins = Vec::with_capacity(workers);
            for _ in 0..workers {
                joins.push(s.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(scenario) = scenarios.get(idx) else {
                            break;
                        };
                        done.push((idx, self.run_logged(scenario, base_url, validator)));
                    }
                    done
                }));
            }
            for join in joins {
                // A panicked worker leaves its slots empty; they are filled below.
                if let Ok(done) = join.join() {
                    for (idx, result) in done {
                        slots[idx] = Some(result);
                    }
                }
            }
        });

        slots
            .into_iter()
            .zip(scenarios)
            .map(|(slot, scenario)| {
                slot.unwrap_or_else(|| {
                    failed_before_request(scenario, "worker thread panicked".to_string())
                })
            })
            .collect()
    }

    fn run_logged(
        &self,
        scenario: &PlannedScenario,
        base_url: &str,
        validator: &dyn SchemaValidator,
    ) -> ExecutionResult {
        let result = self.run_scenario(scenario, base_url, validator);
        match result.verdict {
            Verdict::Passed => self.logger.info(format!("PASS {}", scenario.name)),
            Verdict::Failed => self.logger.warn(format!("FAIL {}", scenario.name)),
        }
        result
    }

    fn log_auth(&self) {
        if self.auth.is_authenticated() {
            self.logger
                .info(format!("Authentication: {}", self.auth.auth_summary()));
        } else {
            self.logger.info("Running tests without authentication");
        }
    }

    fn fail(&self, error: impl Into<String>) -> RunOutcome {
        let error = error.into();
        self.logger.error(error.clone());
        RunOutcome::failed(error)
    }
}

fn failed_before_request(scenario: &PlannedScenario, error: String) -> ExecutionResult {
    ExecutionResult {
        scenario_id: scenario.id.clone(),
        scenario_name: scenario.name.clone(),
        http_call: None,
        resolved_url: String::new(),
        status_code: None,
        response_body: Value::String(error),
        schema_validation: None,
        verdict: Verdict::Failed,
    }
}
