//! Agent Roster
//!
//! The concrete agents the pipeline instantiates. Each differs only in the
//! categories it reads, the task instruction it issues, the output slot it
//! writes, and its documented fallback payload; the run discipline lives in
//! [`super::base::Agent`].

use std::sync::Arc;

use serde_json::json;

use super::base::{Agent, AgentConfig};
use crate::models::fact::categories;
use crate::services::llm::{ModelGateway, RoleProfile};
use crate::services::memory::FactStore;

/// Classifies the ingested disclosure documents
pub fn document_processing_agent(
    store: Arc<FactStore>,
    gateway: Arc<dyn ModelGateway>,
) -> Agent {
    let config = AgentConfig::new(
        "document_processing",
        RoleProfile::Extraction,
        categories::DOCUMENT,
        "analysis",
        r#"You are a credit analyst triaging a borrower's climate disclosure documents.
From the context excerpts, classify the document and surface what a transition
assessment will need from it.

Return JSON with fields:
- "document_type": e.g. "annual report", "sustainability report", "transition plan"
- "reporting_period": fiscal period the document covers
- "key_topics": array of short topic labels
- "summary": two sentences at most
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT])
    .with_fallback(json!({
        "document_type": "Not evidenced",
        "reporting_period": "Not evidenced",
        "key_topics": [],
        "summary": "Not evidenced",
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Checks third-party assurance of the reported emissions data
pub fn verification_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "verification",
        RoleProfile::Extraction,
        categories::VERIFICATION,
        "status",
        r#"You verify whether a borrower's reported emissions figures carry independent
assurance. Look for auditor statements, assurance standards (e.g. ISAE 3410),
and the level of assurance given.

Return JSON with fields:
- "third_party_verified": true | false | "Not evidenced"
- "verifier": name of the assurance provider
- "assurance_level": "limited" | "reasonable" | "Not evidenced"
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT])
    .with_fallback(json!({
        "third_party_verified": "Not evidenced",
        "verifier": "Not evidenced",
        "assurance_level": "Not evidenced",
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Extracts the headline reduction target and baseline figures
pub fn kpi_extraction_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "kpi_extraction",
        RoleProfile::Extraction,
        categories::TARGET,
        "kpis",
        r#"You extract the borrower's headline emissions reduction target and baseline.
Prefer the most recent, most specific target. Scope must be given in digit
form ("1+2" or "1+2+3"). Percentages are reductions against the baseline year.

Return JSON with fields:
- "target_value_pct": number, the reduction percentage
- "target_year": number
- "baseline_year": number
- "sector": the borrower's industry sector as stated
- "scope": "1+2" | "1+2+3" | "3"
- "science_validated": true only if an external initiative has validated the target
- "baseline": object with "scope1_tonnes", "scope2_tonnes", "scope3_tonnes" where stated
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT, categories::VERIFICATION])
    .with_fallback(json!({
        "target_value_pct": "Not evidenced",
        "target_year": "Not evidenced",
        "baseline_year": "Not evidenced",
        "sector": "Not evidenced",
        "scope": "Not evidenced",
        "science_validated": false,
        "baseline": {},
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Profiles climate governance arrangements
pub fn governance_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "governance",
        RoleProfile::Extraction,
        categories::GOVERNANCE,
        "profile",
        r#"You assess the borrower's climate governance. Check board-level oversight,
management accountability, and whether remuneration is linked to climate
performance.

Return JSON with fields:
- "board_oversight": true | false | "Not evidenced"
- "oversight_body": the committee or role responsible
- "remuneration_linked": true | false | "Not evidenced"
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT])
    .with_fallback(json!({
        "board_oversight": "Not evidenced",
        "oversight_body": "Not evidenced",
        "remuneration_linked": "Not evidenced",
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Maps capital expenditure against the stated target
pub fn capex_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "capex",
        RoleProfile::Extraction,
        categories::CAPEX,
        "alignment",
        r#"You assess whether the borrower's capital expenditure plans support its
reduction target. Look for committed green or transition capex, its share of
total capex, and named decarbonization projects.

Return JSON with fields:
- "green_capex_share": fraction of total capex, or "Not evidenced"
- "committed_projects": array of short project descriptions
- "alignment": "supportive" | "partial" | "misaligned" | "Not evidenced"
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT, categories::TARGET])
    .with_fallback(json!({
        "green_capex_share": "Not evidenced",
        "committed_projects": [],
        "alignment": "Not evidenced",
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Runs the disclosure-framework checklist
pub fn regulatory_checklist_agent(
    store: Arc<FactStore>,
    gateway: Arc<dyn ModelGateway>,
) -> Agent {
    let config = AgentConfig::new(
        "regulatory_checklist",
        RoleProfile::Extraction,
        categories::REGULATORY,
        "checklist",
        r#"You check the borrower's disclosures against common reporting frameworks
(CSRD, TCFD, ISSB). Record which frameworks the documents claim alignment
with and which required disclosures are visibly missing.

Return JSON with fields:
- "frameworks": array of {"name", "status": "aligned" | "partial" | "absent"}
- "gaps": array of short descriptions of missing disclosures
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[categories::DOCUMENT, categories::TARGET])
    .with_fallback(json!({
        "frameworks": [],
        "gaps": ["Not evidenced"],
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Judges whether the target is achievable on the evidence
pub fn achievability_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "achievability",
        RoleProfile::ReasoningHeavy,
        categories::ACHIEVABILITY,
        "assessment",
        r#"You judge how achievable the borrower's reduction target is, given its
baseline trajectory, committed capex, governance arrangements, and peer
benchmark position. Weigh the evidence; do not restate it.

Return JSON with fields:
- "achievability": "high" | "moderate" | "low" | "Not evidenced"
- "drivers": array of factors supporting achievement
- "risks": array of factors against achievement
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[
        categories::TARGET,
        categories::BASELINE,
        categories::CAPEX,
        categories::GOVERNANCE,
        categories::BENCHMARK,
    ])
    .with_required_categories(&[categories::TARGET])
    .with_fallback(json!({
        "achievability": "Not evidenced",
        "drivers": [],
        "risks": [],
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Drafts one named report section
pub fn narrative_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "narrative_synthesis",
        RoleProfile::ReasoningHeavy,
        categories::NARRATIVE,
        "sections",
        r#"You draft one section of a credit assessment report from the collected
evidence. Write in measured, audit-ready prose. Every claim must trace to the
context; where the evidence is missing, say "Not evidenced" in the body.

Return JSON with fields:
- "section_id": the identifier you were asked to draft
- "heading": section heading
- "body": the section prose
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[
        categories::DOCUMENT,
        categories::TARGET,
        categories::BENCHMARK,
        categories::REGULATORY,
        categories::ACHIEVABILITY,
        categories::GOVERNANCE,
        categories::CAPEX,
    ])
    .with_fallback(json!({
        "section_id": "Not evidenced",
        "heading": "Not evidenced",
        "body": "Not evidenced",
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}

/// Specifies the report's charts
pub fn visualization_agent(store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Agent {
    let config = AgentConfig::new(
        "visualization",
        RoleProfile::Default,
        categories::VISUALIZATION,
        "charts",
        r#"You specify the charts a credit assessment report should carry for this
borrower: target trajectory against the baseline, and position against the
peer distribution where benchmark data exists.

Return JSON with fields:
- "charts": array of {"chart_id", "kind": "line" | "bar" | "distribution", "title", "series": object}
- "confidence": "HIGH" | "MEDIUM" | "LOW""#,
    )
    .with_context_categories(&[
        categories::TARGET,
        categories::BENCHMARK,
        categories::BASELINE,
    ])
    .with_fallback(json!({
        "charts": [],
        "confidence": "LOW"
    }));
    Agent::new(config, store, gateway)
}
