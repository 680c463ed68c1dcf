//! Run Memory System
//!
//! Fact storage shared across every agent in one assessment run: an
//! append-only local log with an optional remote semantic mirror.
//!
//! ## Module Structure
//!
//! - `store`: `FactStore` with dual-write and fallback retrieval
//! - `remote`: semantic mirror contract, payload normalization, and the
//!   in-process keyword index

pub mod remote;
pub mod store;

pub use remote::{normalize_remote_payload, KeywordIndex, SemanticIndex};
pub use store::{FactStore, RETRIEVE_LIMIT};
