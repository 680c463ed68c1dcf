//! Covenant Benchmark
//!
//! Deterministic peer-benchmark engine for ambition classification. This
//! crate has no model dependency and no async surface; everything in it is a
//! pure function of the reference dataset and the request:
//!
//! - `dataset` - Peer reference table (embedded copy plus file loading)
//! - `sector` - Layered sector matching and emission-scope compatibility
//! - `stats` - Percentile summary of a qualifying peer pool
//! - `classify` - The `BenchmarkEngine` and ambition tiers
//!
//! The LLM-facing pipeline lives in the main crate; it consumes this engine
//! during the Benchmarking phase and stores the assessment as a fact.

pub mod classify;
pub mod dataset;
pub mod sector;
pub mod stats;

// Re-export the engine and its result types
pub use classify::{
    AmbitionAssessment, AmbitionClass, BenchmarkEngine, ConfidenceLevel, PeerStatistics,
    PEER_POOL_WARN_THRESHOLD,
};

// Re-export dataset types
pub use dataset::{DatasetError, PeerRecord, ReferenceDataset};

// Re-export matching types
pub use sector::{match_sector, MatchStrategy, ScopeSet, SectorMatch, SectorMatchError};

// Re-export statistics
pub use stats::{summarize, PercentileSummary, MIN_PEERS_FOR_PERCENTILES};
