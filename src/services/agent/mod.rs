//! Agents
//!
//! One agent = one system prompt + one output slot in the fact store. The
//! base module carries the shared run discipline, context assembly bounds
//! the evidence each call sees, and the roster lists the concrete agents
//! the pipeline runs.

pub mod base;
pub mod context;
pub mod roster;

pub use base::{Agent, AgentConfig, AgentRunResult};
pub use context::{assemble_context, ScoredSnippet, SimilaritySearch, MAX_CONTEXT_CHARS};
pub use roster::{
    achievability_agent, capex_agent, document_processing_agent, governance_agent,
    kpi_extraction_agent, narrative_agent, regulatory_checklist_agent, verification_agent,
    visualization_agent,
};
