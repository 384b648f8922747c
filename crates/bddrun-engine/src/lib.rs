//! Orchestration for bddrun.
//!
//! Two independent pipelines live here:
//!
//! - [`ClassificationPipeline`]: segment, normalize, classify, then rebuild the
//!   `bdd_tests/` bucket trees (or save the normalized features).
//! - [`ExecutionEngine`]: turn each scenario into one HTTP request, check the
//!   response against its status rules and the API description, and hand the
//!   collected results to a report renderer.

mod classification;
mod execution;

pub use classification::{Classification, ClassificationPipeline, ClassifyOutputs, SaveOutputs};
pub use execution::{
    ExecutionEngine, PlannedScenario, ScenarioPlan, extract_plan, plan_scenarios,
};
