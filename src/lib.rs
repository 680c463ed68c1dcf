//! Covenant - Climate-Transition Credit Assessment
//!
//! Document-grounded credit assessment reports for corporate transition
//! plans. The library is organized as:
//! - Agents and their shared fact store
//! - An LLM gateway over an ordered provider-tier ladder
//! - Structured-output recovery for model replies
//! - The five-phase orchestrator that assembles the final report
//! - Storage edges: config, document loading, report persistence
//!
//! The deterministic peer-benchmark engine lives in the `covenant-benchmark`
//! workspace crate and is re-exported here for callers of the pipeline.

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use covenant_benchmark::{AmbitionAssessment, AmbitionClass, BenchmarkEngine, ReferenceDataset};

pub use models::fact::Fact;
pub use models::report::{AssessmentReport, FinalDecision, PipelinePhase, Recommendation};
pub use services::agent::{Agent, AgentConfig};
pub use services::llm::{LlmGateway, ModelGateway, ProviderRegistry, UNAVAILABLE_SENTINEL};
pub use services::memory::FactStore;
pub use services::pipeline::Orchestrator;
pub use services::recovery::recover;
pub use storage::{AppConfig, ConfigService, JsonFileSink, PlainTextSource, ReportSink};
pub use utils::error::{AppError, AppResult};
