//! Sector Matching and Scope Compatibility
//!
//! Peer selection starts from a free-text sector name coming out of document
//! extraction, which rarely matches the reference table's canonical names
//! exactly. Matching runs layered strategies in decreasing strictness:
//! exact name, substring, significant-word overlap, then a curated alias
//! table. When nothing matches, the error carries the full list of available
//! sectors so the gap is diagnosable from the report.
//!
//! Scope filtering compares emission-scope digit sets: a requested scope
//! qualifies a peer row when its digits are a subset of the row's digits,
//! except that a "1+2" request never matches a "1+2+3" row (a combined
//! 1+2+3 target is not comparable to a 1+2 target).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Words too generic to identify a sector on their own
const GENERIC_SECTOR_WORDS: &[&str] = &[
    "and",
    "the",
    "for",
    "other",
    "industry",
    "industries",
    "sector",
    "sectors",
    "services",
    "general",
    "products",
    "miscellaneous",
    "misc",
];

/// Known shorthand names mapped to canonical reference-table sectors
const SECTOR_ALIASES: &[(&str, &str)] = &[
    ("capital goods", "Electrical Equipment and Machinery"),
    ("automotive", "Automobiles and Components"),
    ("oem", "Automobiles and Components"),
    ("cement", "Construction Materials"),
    ("tech", "Software and IT Services"),
    ("it", "Software and IT Services"),
    ("f&b", "Food and Beverage Processing"),
    ("fmcg", "Food and Beverage Processing"),
    ("petrochemicals", "Chemicals"),
    ("utilities", "Electric Utilities and Independent Power Producers"),
];

/// Which strategy produced a sector match, strictest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Substring,
    SignificantWord,
    Alias,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::Substring => "substring",
            MatchStrategy::SignificantWord => "significant_word",
            MatchStrategy::Alias => "alias",
        };
        write!(f, "{}", label)
    }
}

/// A resolved sector match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMatch {
    /// Canonical sector name as it appears in the reference table
    pub sector: String,
    pub strategy: MatchStrategy,
}

/// Sector resolution failure, surfacing what was available
#[derive(Error, Debug)]
pub enum SectorMatchError {
    #[error("No sector match for '{requested}' ({n} sectors available)", n = .available.len())]
    NoMatch {
        requested: String,
        available: Vec<String>,
    },
}

/// Resolve a requested sector name against the available canonical names.
///
/// `available` is expected sorted (see `ReferenceDataset::sectors`) so that
/// ties resolve deterministically.
pub fn match_sector(requested: &str, available: &[String]) -> Result<SectorMatch, SectorMatchError> {
    let requested_trimmed = requested.trim();
    let requested_lower = requested_trimmed.to_lowercase();

    let no_match = || SectorMatchError::NoMatch {
        requested: requested_trimmed.to_string(),
        available: available.to_vec(),
    };

    if requested_lower.is_empty() {
        return Err(no_match());
    }

    // Strategy 1: exact name, case-insensitive
    if let Some(hit) = available.iter().find(|c| c.to_lowercase() == requested_lower) {
        return Ok(SectorMatch {
            sector: hit.clone(),
            strategy: MatchStrategy::Exact,
        });
    }

    // Strategy 2: substring in either direction
    if let Some(hit) = available.iter().find(|c| {
        let candidate = c.to_lowercase();
        candidate.contains(&requested_lower) || requested_lower.contains(&candidate)
    }) {
        return Ok(SectorMatch {
            sector: hit.clone(),
            strategy: MatchStrategy::Substring,
        });
    }

    // Strategy 3: significant-word overlap, best hit count wins
    let requested_words = significant_words(requested_trimmed);
    if !requested_words.is_empty() {
        let mut best: Option<(usize, &String)> = None;
        for candidate in available {
            let candidate_lower = candidate.to_lowercase();
            let hits = requested_words
                .iter()
                .filter(|w| candidate_lower.contains(w.as_str()))
                .count();
            if hits > 0 && best.map_or(true, |(b, _)| hits > b) {
                best = Some((hits, candidate));
            }
        }
        if let Some((_, hit)) = best {
            return Ok(SectorMatch {
                sector: hit.clone(),
                strategy: MatchStrategy::SignificantWord,
            });
        }
    }

    // Strategy 4: curated aliases
    if let Some((_, canonical)) = SECTOR_ALIASES
        .iter()
        .find(|(alias, _)| *alias == requested_lower)
    {
        if let Some(hit) = available
            .iter()
            .find(|c| c.to_lowercase() == canonical.to_lowercase())
        {
            return Ok(SectorMatch {
                sector: hit.clone(),
                strategy: MatchStrategy::Alias,
            });
        }
    }

    Err(no_match())
}

/// Sector-identifying words: lowercased, length >= 3, not in the generic list
pub fn significant_words(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3 && !GENERIC_SECTOR_WORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Emission-scope digit set (scopes 1 to 3) as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeSet(u8);

impl ScopeSet {
    pub const SCOPE_1_2: ScopeSet = ScopeSet(0b011);
    pub const SCOPE_1_2_3: ScopeSet = ScopeSet(0b111);

    /// Parse a scope expression such as "1+2", "Scope 1 and 2", "1, 2 and 3".
    ///
    /// Tokens other than scope digits and filler words make the whole
    /// expression unparsable (so "2030" never reads as scope 3).
    pub fn parse(raw: &str) -> Option<ScopeSet> {
        let mut mask = 0u8;
        for token in raw
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            match token {
                "1" => mask |= 0b001,
                "2" => mask |= 0b010,
                "3" => mask |= 0b100,
                "scope" | "scopes" | "and" => {}
                _ => return None,
            }
        }
        if mask == 0 {
            None
        } else {
            Some(ScopeSet(mask))
        }
    }

    pub fn is_subset_of(self, other: ScopeSet) -> bool {
        self.0 & other.0 == self.0
    }

    /// Canonical label, digits ascending joined with '+'
    pub fn label(self) -> String {
        let mut parts = Vec::new();
        for (bit, digit) in [(0b001, "1"), (0b010, "2"), (0b100, "3")] {
            if self.0 & bit != 0 {
                parts.push(digit);
            }
        }
        parts.join("+")
    }
}

impl std::fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Subset rule with the explicit 1+2 vs 1+2+3 exclusion
pub fn scope_compatible(requested: ScopeSet, peer: ScopeSet) -> bool {
    if !requested.is_subset_of(peer) {
        return false;
    }
    !(requested == ScopeSet::SCOPE_1_2 && peer == ScopeSet::SCOPE_1_2_3)
}
