//! Services
//!
//! The working layers of the assessment pipeline: structured-output
//! recovery, the shared fact store, the provider gateway, the agents, and
//! the orchestrator that drives them.

pub mod agent;
pub mod llm;
pub mod memory;
pub mod pipeline;
pub mod recovery;

pub use agent::{Agent, AgentConfig, AgentRunResult};
pub use llm::{LlmGateway, ModelGateway, ProviderRegistry};
pub use memory::FactStore;
pub use pipeline::Orchestrator;
pub use recovery::recover;
