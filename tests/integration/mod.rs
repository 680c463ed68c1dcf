//! Integration Tests Module
//!
//! End-to-end tests for the Covenant assessment pipeline exercised through
//! the public crate API only. Tests cover structured-output recovery against
//! realistic provider replies, the shared fact store with its remote mirror,
//! the deterministic benchmark engine, and full pipeline runs with scripted
//! and unavailable model gateways.
//!
//! No network calls are made: gateways are either scripted doubles or the
//! real gateway over an empty provider ladder.

// Structured-output recovery against provider reply shapes
mod recovery_test;

// Fact store dual-write, retrieval guarantees, and mirror degradation
mod fact_store_test;

// Benchmark engine classification and dataset loading
mod benchmark_test;

// Five-phase orchestrator runs and report persistence
mod pipeline_test;
