//! Assessment Pipeline
//!
//! The orchestrator that drives a report run through its five phases, and
//! the plumbing its phases share.

pub mod orchestrator;
pub mod phases;

pub use orchestrator::Orchestrator;
pub use phases::{SectionSpec, REPORT_SECTIONS};
