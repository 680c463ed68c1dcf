//! Fact Model
//!
//! The atomic unit of shared knowledge between pipeline steps. Facts are
//! immutable once written; a later write under the same category/key is an
//! additional fact, never an update. Consumers read the most recent
//! matching fact(s).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Well-known fact categories. The vocabulary is open: agents may write any
/// category string, these are the ones the built-in pipeline uses.
pub mod categories {
    pub const DOCUMENT: &str = "document";
    pub const VERIFICATION: &str = "verification";
    pub const BASELINE: &str = "baseline";
    pub const GOVERNANCE: &str = "governance";
    pub const CAPEX: &str = "capex";
    pub const TARGET: &str = "target";
    pub const BENCHMARK: &str = "benchmark";
    pub const REGULATORY: &str = "regulatory";
    pub const ACHIEVABILITY: &str = "achievability";
    pub const NARRATIVE: &str = "narrative";
    pub const VISUALIZATION: &str = "visualization";
    pub const DECISION: &str = "decision";
}

/// One immutable, categorized, keyed piece of shared knowledge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    pub id: String,
    pub category: String,
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: category.into(),
            key: key.into(),
            value,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Fact rebuilt from a remote payload that only carried raw text
    pub fn from_raw_text(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(category, "raw", Value::String(text.into()), Map::new())
    }

    /// Flat text rendering used by keyword search over the local log
    pub fn normalized_text(&self) -> String {
        let value_text = match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("{} {} {}", self.category, self.key, value_text).to_lowercase()
    }
}
