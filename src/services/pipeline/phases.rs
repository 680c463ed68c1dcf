//! Phase Plumbing
//!
//! Shared pieces between the orchestrator's five phases: recording agent
//! outcomes into phase reports, folding gateway attempts into the audit
//! list, the fixed section plan for the report draft fan-out, and the
//! parsers that turn recovered model output into typed decisions and
//! benchmark inputs.

use serde_json::{Map, Value};

use covenant_benchmark::ConfidenceLevel;

use crate::models::report::{FinalDecision, ModelUsage, PhaseReport, PhaseStatus, Recommendation};
use crate::services::agent::AgentRunResult;
use crate::services::llm::CallAttempt;
use crate::utils::error::AppResult;

/// One section of the drafted report
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub id: &'static str,
    pub heading: &'static str,
    /// What the drafting call is told to cover
    pub focus: &'static str,
}

/// Sections drafted concurrently during Analysis & Synthesis
pub const REPORT_SECTIONS: [SectionSpec; 6] = [
    SectionSpec {
        id: "executive_summary",
        heading: "Executive Summary",
        focus: "the borrower, the headline target, the benchmark position, and the recommendation direction in under 200 words",
    },
    SectionSpec {
        id: "emissions_profile",
        heading: "Emissions Profile",
        focus: "reported baseline emissions by scope, reporting period, and assurance status",
    },
    SectionSpec {
        id: "target_ambition",
        heading: "Target Ambition",
        focus: "the stated reduction target and how it sits against the sector peer distribution",
    },
    SectionSpec {
        id: "governance_capex",
        heading: "Governance and Capital Allocation",
        focus: "board oversight, remuneration linkage, and whether committed capex supports the target",
    },
    SectionSpec {
        id: "regulatory_readiness",
        heading: "Regulatory Readiness",
        focus: "framework alignment claims and the disclosure gaps the checklist surfaced",
    },
    SectionSpec {
        id: "risk_outlook",
        heading: "Risks and Achievability",
        focus: "the achievability judgement, its drivers, and the residual risks to delivery",
    },
];

/// Downgrade a phase status one step; Failed is sticky
pub fn downgrade(status: PhaseStatus) -> PhaseStatus {
    match status {
        PhaseStatus::Failed => PhaseStatus::Failed,
        _ => PhaseStatus::Degraded,
    }
}

/// Fold one call's tier attempts into the audit list
pub fn record_attempts(models_used: &mut Vec<ModelUsage>, section: &str, attempts: &[CallAttempt]) {
    for attempt in attempts {
        models_used.push(ModelUsage {
            section: section.to_string(),
            provider: attempt.tier.clone(),
            model: attempt.model.clone(),
            succeeded: attempt.succeeded,
            failure: attempt.error.clone(),
            latency_ms: attempt.duration_ms,
        });
    }
}

/// Record one agent outcome on a phase report.
///
/// A fallback payload degrades the phase; a data-insufficiency abort is
/// recorded as a gap and degrades the phase. Either way the phase keeps
/// going and the report keeps rendering.
pub fn record_agent_outcome(
    phase: &mut PhaseReport,
    models_used: &mut Vec<ModelUsage>,
    agent_name: &str,
    outcome: AppResult<AgentRunResult>,
) {
    match outcome {
        Ok(result) => {
            record_attempts(models_used, agent_name, &result.attempts);
            if result.fallback_used {
                phase.status = downgrade(phase.status);
            }
            phase
                .outputs
                .insert(agent_name.to_string(), Value::Object(result.output));
        }
        Err(err) => {
            phase.gaps.push(err.to_string());
            phase.status = downgrade(phase.status);
        }
    }
}

// ============================================================================
// Recovered-output parsers
// ============================================================================

/// Typed inputs the benchmark engine needs out of the KPI extraction output
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkInputs {
    pub target_value: f64,
    pub sector: String,
    pub scope: String,
    pub science_validated: bool,
}

fn numeric_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn evidenced_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("not evidenced"))
}

/// Pull benchmark inputs out of a recovered KPI payload. Missing target or
/// sector is a gap; a dubious scope string is passed through so the engine
/// can report it as invalid rather than being silently papered over.
pub fn benchmark_inputs(kpis: &Value) -> Result<BenchmarkInputs, String> {
    let target_value = kpis
        .get("target_value_pct")
        .and_then(numeric_field)
        .ok_or_else(|| "benchmark skipped: no quantified reduction target".to_string())?;
    let sector = evidenced_str(kpis.get("sector"))
        .ok_or_else(|| "benchmark skipped: borrower sector not evidenced".to_string())?
        .to_string();
    let scope = kpis
        .get("scope")
        .and_then(|v| v.as_str())
        .unwrap_or("Not evidenced")
        .to_string();
    let science_validated = match kpis.get("science_validated") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    };

    Ok(BenchmarkInputs {
        target_value,
        sector,
        scope,
        science_validated,
    })
}

/// Section id to file a drafted section under: the id the model returned
/// when it gave a usable one, otherwise the id it was asked to draft.
pub fn resolve_section_id(output: &Map<String, Value>, requested: &str) -> String {
    evidenced_str(output.get("section_id"))
        .unwrap_or(requested)
        .to_string()
}

fn confidence_from_text(raw: Option<&str>) -> ConfidenceLevel {
    match raw.map(|s| s.trim().to_uppercase()).as_deref() {
        Some("HIGH") => ConfidenceLevel::High,
        Some("MEDIUM") => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    }
}

/// Turn a recovered synthesis payload into the typed final decision. An
/// unrecognized recommendation value routes to manual review; it is never
/// guessed into an approval.
pub fn parse_decision(output: &Map<String, Value>) -> FinalDecision {
    let rationale = evidenced_str(output.get("rationale"))
        .unwrap_or("Not evidenced")
        .to_string();

    let recommendation = output
        .get("recommendation")
        .and_then(|v| v.as_str())
        .and_then(Recommendation::from_model_text);
    let Some(recommendation) = recommendation else {
        return FinalDecision::manual_review(rationale);
    };

    let conditions = output
        .get("conditions")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    FinalDecision {
        recommendation,
        confidence: confidence_from_text(output.get("confidence").and_then(|v| v.as_str())),
        rationale,
        conditions,
    }
}
