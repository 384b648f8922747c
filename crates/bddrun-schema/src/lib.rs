//! Canonical data model for the bddrun pipelines.
//!
//! Defines scenario tags, feature and scenario blocks, the HTTP call and
//! status rule types extracted from scenario steps, and the execution
//! results and run reports produced by the engine.
//! All other crates depend on these types.

pub mod execution;
pub mod feature;
pub mod http;
pub mod tag;
