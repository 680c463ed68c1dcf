//! Covenant CLI
//!
//! Runs one assessment end to end: load config, discover provider tiers
//! from the environment, ingest the given documents, drive the five-phase
//! pipeline, and persist the report as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use covenant::services::llm::{CredentialSet, LlmGateway, ProviderRegistry};
use covenant::services::memory::FactStore;
use covenant::services::pipeline::Orchestrator;
use covenant::storage::{read_env, ConfigService, JsonFileSink, PlainTextSource, ReportSink};
use covenant::utils::paths::ensure_reports_dir;
use covenant_benchmark::{BenchmarkEngine, ReferenceDataset};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut subject: Option<String> = None;
    let mut documents: Vec<PathBuf> = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--subject" => subject = args.next(),
            "--help" | "-h" => {
                usage();
                return Ok(());
            }
            other => documents.push(PathBuf::from(other)),
        }
    }

    let Some(subject) = subject else {
        usage();
        anyhow::bail!("--subject is required");
    };
    if documents.is_empty() {
        usage();
        anyhow::bail!("at least one document path is required");
    }

    let config_service = ConfigService::new().context("loading configuration")?;
    let config = config_service.get_config().clone();

    let credentials = CredentialSet {
        openrouter_key: read_env(&config.provider.openrouter_key_var),
        deepseek_key: read_env(&config.provider.deepseek_key_var),
        glm_key: read_env(&config.provider.glm_key_var),
        openai_key: read_env(&config.provider.openai_key_var),
        ollama_base_url: read_env(&config.provider.ollama_url_var),
    };
    if credentials.is_empty() {
        warn!("No provider credentials found; the run will complete with fallback content only");
    }
    let registry = Arc::new(ProviderRegistry::discover(&credentials));
    let gateway = Arc::new(LlmGateway::new(registry.clone()));

    let dataset = match &config.peer_dataset_path {
        Some(path) => ReferenceDataset::from_path(path).context("loading peer dataset")?,
        None => ReferenceDataset::embedded().context("loading embedded peer dataset")?,
    };
    let engine = BenchmarkEngine::new(dataset);

    let store = Arc::new(FactStore::new(&subject));
    let orchestrator = Orchestrator::new(store, gateway, engine, Arc::new(PlainTextSource))
        .with_registry(registry)
        .with_call_timeout(Duration::from_secs(config.provider.call_timeout_secs));

    let report = orchestrator.run(&documents).await;

    let report_dir = match &config.report_dir {
        Some(dir) => dir.clone(),
        None => ensure_reports_dir().context("resolving report directory")?,
    };
    let sink = JsonFileSink::new(report_dir);
    let location = sink.persist(&report).await.context("persisting report")?;

    info!(recommendation = %report.final_decision.recommendation, "Assessment finished");
    println!("{}", location);
    Ok(())
}

fn usage() {
    eprintln!("covenant - climate-transition credit assessment");
    eprintln!();
    eprintln!("Usage: covenant --subject <id> <document.txt> [more documents...]");
    eprintln!();
    eprintln!("Documents are plain text (page breaks as form feeds or [Page N] lines).");
    eprintln!("Provider credentials are read from the environment; config.json under");
    eprintln!("~/.covenant names the variables checked.");
}
