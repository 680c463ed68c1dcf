//! Report Model
//!
//! The single nested record an assessment run produces: per-phase partial
//! results, the benchmark classification, the final decision, and the
//! models-used audit list. The report always renders in full; degraded
//! sections carry explicit markers instead of going silently missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use covenant_benchmark::{AmbitionAssessment, ConfidenceLevel};

/// The five fixed pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    DocumentIntelligence,
    DataExtraction,
    BenchmarkingRegulatory,
    AnalysisSynthesis,
    FinalDecision,
}

impl PipelinePhase {
    /// All phases in execution order
    pub fn all() -> [PipelinePhase; 5] {
        [
            PipelinePhase::DocumentIntelligence,
            PipelinePhase::DataExtraction,
            PipelinePhase::BenchmarkingRegulatory,
            PipelinePhase::AnalysisSynthesis,
            PipelinePhase::FinalDecision,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::DocumentIntelligence => "Document Intelligence",
            PipelinePhase::DataExtraction => "Data Extraction",
            PipelinePhase::BenchmarkingRegulatory => "Benchmarking & Regulatory",
            PipelinePhase::AnalysisSynthesis => "Analysis & Synthesis",
            PipelinePhase::FinalDecision => "Final Decision",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// All agents in the phase produced recovered output
    Completed,
    /// At least one agent fell back to its documented default payload
    Degraded,
    /// The phase precondition failed outright; outputs carry markers only
    Failed,
}

/// One phase's named partial result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: PipelinePhase,
    pub status: PhaseStatus,
    /// Agent outputs keyed by agent name
    pub outputs: Map<String, Value>,
    /// Recorded data-insufficiency gaps and precondition failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<String>,
    pub duration_ms: u64,
}

impl PhaseReport {
    pub fn new(phase: PipelinePhase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Completed,
            outputs: Map::new(),
            gaps: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Final recommendation values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    ConditionalApprove,
    Decline,
    ManualReview,
}

impl Recommendation {
    /// Map free-text model output onto a recommendation value. Returns None
    /// for anything unrecognized so the caller can apply its conservative
    /// default.
    pub fn from_model_text(raw: &str) -> Option<Recommendation> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "approve" | "approved" | "approval" => Some(Recommendation::Approve),
            "conditional_approve" | "conditional_approval" | "approve_with_conditions" => {
                Some(Recommendation::ConditionalApprove)
            }
            "decline" | "declined" | "reject" | "rejected" => Some(Recommendation::Decline),
            "manual_review" | "manual_review_required" | "refer" => {
                Some(Recommendation::ManualReview)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Recommendation::Approve => "approve",
            Recommendation::ConditionalApprove => "conditional_approve",
            Recommendation::Decline => "decline",
            Recommendation::ManualReview => "manual_review",
        };
        write!(f, "{}", label)
    }
}

/// The decision object closing every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalDecision {
    pub recommendation: Recommendation,
    pub confidence: ConfidenceLevel,
    pub rationale: String,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl FinalDecision {
    /// Conservative decision used when synthesis could not be recovered
    pub fn manual_review(rationale: impl Into<String>) -> Self {
        Self {
            recommendation: Recommendation::ManualReview,
            confidence: ConfidenceLevel::Low,
            rationale: rationale.into(),
            conditions: vec!["Manual underwriter review required".to_string()],
        }
    }
}

/// One provider attempt in the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Pipeline section or agent the attempt served
    pub section: String,
    pub provider: String,
    pub model: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub latency_ms: u64,
}

/// The complete assessment report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub run_id: String,
    pub subject_id: String,
    pub generated_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<AmbitionAssessment>,
    pub final_decision: FinalDecision,
    pub models_used: Vec<ModelUsage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_gaps: Vec<String>,
}

impl AssessmentReport {
    /// The phase report for a given phase, if the run reached it
    pub fn phase(&self, phase: PipelinePhase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}
