//! Storage Layer
//!
//! Configuration, document loading, and report persistence. Nothing here
//! talks to a model; these are the filesystem edges of the pipeline.

pub mod config;
pub mod documents;
pub mod reports;

pub use config::{read_env, AppConfig, ConfigService, ConfigUpdate, ProviderSettings};
pub use documents::{DocumentIndex, DocumentSource, LoadedDocument, PlainTextSource};
pub use reports::{JsonFileSink, ReportSink};
