//! Peer Reference Dataset
//!
//! The read-only table of peer decarbonization commitments that ambition
//! classification runs against. A vetted dataset ships embedded in the
//! binary; deployments can swap in their own table from a JSON file of the
//! same shape. The dataset is never mutated during a run and may be shared
//! across runs.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded reference table, curated from public commitment registries
const EMBEDDED_PEERS: &str = include_str!("../data/peers.json");

/// One peer company's published reduction commitment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerRecord {
    pub company: String,
    pub sector: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Emission scope coverage, e.g. "1+2" or "1+2+3"
    pub scope: String,
    /// Committed reduction in percent against the baseline year
    pub target_value: f64,
    pub target_year: u16,
    #[serde(default)]
    pub baseline_year: Option<u16>,
    /// Independently validated against a science-based pathway
    #[serde(default)]
    pub science_validated: bool,
}

/// Errors loading a reference dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Dataset contains no records")]
    Empty,
}

/// Immutable table of peer records
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Vec<PeerRecord>,
}

impl ReferenceDataset {
    /// Load the embedded reference table
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json_str(EMBEDDED_PEERS)
    }

    /// Parse a dataset from a JSON array of peer records
    pub fn from_json_str(raw: &str) -> Result<Self, DatasetError> {
        let records: Vec<PeerRecord> = serde_json::from_str(raw)?;
        Self::from_records(records)
    }

    /// Load a dataset from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Build a dataset from already-parsed records
    pub fn from_records(records: Vec<PeerRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PeerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique sector names, sorted, for match diagnostics
    pub fn sectors(&self) -> Vec<String> {
        sector_names(&self.records)
    }
}

/// Unique sector names across a record slice, sorted for deterministic output
pub fn sector_names(records: &[PeerRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records.iter().map(|r| r.sector.as_str()).collect();
    set.into_iter().map(|s| s.to_string()).collect()
}
