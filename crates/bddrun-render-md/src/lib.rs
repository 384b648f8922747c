//! Markdown report renderer.
//!
//! Produces a short human-readable report: summary counts, one table row
//! per scenario and a failure section with the response or error text.

use anyhow::Result;
use bddrun_ports::ReportRenderer;
use bddrun_schema::execution::{ExecutionResult, ReportEnvelope, RunSummary, Verdict};
use serde_json::{Value, json};

/// The `execution_output` of this renderer is the Markdown string itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownRenderer;

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, envelope: &ReportEnvelope) -> Result<Value> {
        Ok(json!({ "execution_output": render_markdown(envelope) }))
    }
}

pub fn render_markdown(envelope: &ReportEnvelope) -> String {
    let summary = RunSummary::of(&envelope.results);
    let mut out = String::new();

    out.push_str("# Scenario execution report\n\n");
    out.push_str(&format!("- **Total:** {}\n", summary.total));
    out.push_str(&format!("- **Passed:** {}\n", summary.passed));
    out.push_str(&format!("- **Failed:** {}\n\n", summary.failed));

    if envelope.results.is_empty() {
        out.push_str("_No scenarios were executed._\n");
        return out;
    }

    out.push_str("| # | Scenario | Request | Status | Schema | Verdict |\n");
    out.push_str("|---|----------|---------|--------|--------|---------|\n");
    for (i, r) in envelope.results.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            cell(&r.scenario_name),
            cell(&request_label(r)),
            r.status_code.map_or_else(|| "-".to_string(), |s| s.to_string()),
            schema_label(r),
            verdict_label(r.verdict),
        ));
    }

    let failures: Vec<&ExecutionResult> = envelope.results.iter().filter(|r| !r.passed()).collect();
    if !failures.is_empty() {
        out.push_str("\n## Failures\n");
        for r in failures {
            out.push_str(&format!("\n### {}\n\n", inline(&r.scenario_name)));
            if !r.resolved_url.is_empty() {
                out.push_str(&format!("- **URL:** {}\n\n", r.resolved_url));
            }
            let body = body_text(&r.response_body);
            let fence = fence_for(&body);
            out.push_str(&format!("{fence}\n{body}\n{fence}\n"));
        }
    }

    out
}

fn request_label(r: &ExecutionResult) -> String {
    r.http_call
        .as_ref()
        .map_or_else(|| "-".to_string(), |c| format!("{} {}", c.method, c.path))
}

fn schema_label(r: &ExecutionResult) -> &'static str {
    match r.schema_validation {
        None => "-",
        Some(v) if !v.schema_found => "none",
        Some(v) if v.schema_valid => "valid",
        Some(_) => "invalid",
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Passed => "passed",
        Verdict::Failed => "**failed**",
    }
}

/// Table cells cannot hold pipes or newlines.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Single-line text with Markdown punctuation escaped.
fn inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => out.push(' '),
            '\\' | '`' | '*' | '_' | '#' | '[' | ']' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// A backtick fence longer than any backtick run in `body`, at least three.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

fn body_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
