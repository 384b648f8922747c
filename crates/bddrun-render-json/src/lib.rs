//! JSON rendering and writers for execution reports.
//!
//! The renderer wraps the report envelope (plus summary counts) in an
//! `execution_output` object. [`write_report_json`] persists rendered output
//! as pretty-printed JSON.

use anyhow::{Context, Result};
use bddrun_ports::ReportRenderer;
use bddrun_schema::execution::{ReportEnvelope, RunSummary};
use serde_json::{Value, json};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, envelope: &ReportEnvelope) -> Result<Value> {
        let mut output = serde_json::to_value(envelope).context("serialize report envelope")?;
        let summary = serde_json::to_value(RunSummary::of(&envelope.results))
            .context("serialize run summary")?;
        if let Value::Object(map) = &mut output {
            map.insert("summary".into(), summary);
        }
        Ok(json!({ "execution_output": output }))
    }
}

/// Write any rendered output value.
pub fn write_report_json(path: &Path, output: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(output).context("serialize execution output")?;
    std::fs::write(path, text).with_context(|| format!("write {path:?}"))?;
    Ok(())
}
