//! Ambition Classification
//!
//! Deterministic classification of a company's reduction target against its
//! sector peer pool. No model call is involved anywhere in this path: the
//! classification is a pure function of the target value, the matched peer
//! distribution, and the science-validation flag, so the same inputs always
//! produce the same report line.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{sector_names, PeerRecord, ReferenceDataset};
use crate::sector::{match_sector, scope_compatible, MatchStrategy, ScopeSet, SectorMatchError};
use crate::stats::{summarize, PercentileSummary, MIN_PEERS_FOR_PERCENTILES};

/// Pools above this size log a warning but are still used whole; trimming
/// would bias the distribution.
pub const PEER_POOL_WARN_THRESHOLD: usize = 100;

/// Ambition tiers, ordered weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmbitionClass {
    Weak,
    MarketStandard,
    AboveMarket,
    ScienceAligned,
}

impl std::fmt::Display for AmbitionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AmbitionClass::Weak => "WEAK",
            AmbitionClass::MarketStandard => "MARKET_STANDARD",
            AmbitionClass::AboveMarket => "ABOVE_MARKET",
            AmbitionClass::ScienceAligned => "SCIENCE_ALIGNED",
        };
        write!(f, "{}", label)
    }
}

/// Confidence in the peer statistics, a direct function of pool size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Insufficient,
}

impl ConfidenceLevel {
    pub fn from_peer_count(peer_count: usize) -> Self {
        if peer_count >= 15 {
            ConfidenceLevel::High
        } else if peer_count >= 8 {
            ConfidenceLevel::Medium
        } else if peer_count >= 5 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Insufficient
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Insufficient => "INSUFFICIENT",
        };
        write!(f, "{}", label)
    }
}

/// Peer-pool summary attached to a classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatistics {
    pub peer_count: usize,
    pub percentiles: PercentileSummary,
    pub confidence_level: ConfidenceLevel,
    pub match_quality: MatchStrategy,
    pub matched_sector: String,
}

/// Outcome of an ambition classification request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmbitionAssessment {
    Classified {
        classification: AmbitionClass,
        target_value: f64,
        scope: String,
        statistics: PeerStatistics,
    },
    /// Sector matched but the qualifying pool is too small for percentiles.
    /// No industry default is substituted in its place.
    InsufficientPeers {
        matched_sector: String,
        match_quality: MatchStrategy,
        peer_count: usize,
        required: usize,
    },
    NoSectorMatch {
        requested: String,
        available_sectors: Vec<String>,
    },
    InvalidScope {
        scope: String,
    },
}

impl AmbitionAssessment {
    pub fn classification(&self) -> Option<AmbitionClass> {
        match self {
            AmbitionAssessment::Classified { classification, .. } => Some(*classification),
            _ => None,
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, AmbitionAssessment::Classified { .. })
    }
}

/// Deterministic benchmark engine over a reference dataset
#[derive(Debug, Clone)]
pub struct BenchmarkEngine {
    dataset: ReferenceDataset,
}

impl BenchmarkEngine {
    pub fn new(dataset: ReferenceDataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }

    /// Classify a reduction target against the sector peer pool.
    ///
    /// `peer_data` overrides the engine's dataset for this call when given
    /// (used when a caller already carries a pre-filtered pool).
    pub fn classify_ambition(
        &self,
        target_value: f64,
        sector: &str,
        scope: &str,
        science_validated: bool,
        peer_data: Option<&[PeerRecord]>,
    ) -> AmbitionAssessment {
        let records = peer_data.unwrap_or_else(|| self.dataset.records());
        let available = sector_names(records);

        let matched = match match_sector(sector, &available) {
            Ok(m) => m,
            Err(SectorMatchError::NoMatch {
                requested,
                available,
            }) => {
                debug!(sector = %requested, "no sector match for classification");
                return AmbitionAssessment::NoSectorMatch {
                    requested,
                    available_sectors: available,
                };
            }
        };

        let Some(requested_scope) = ScopeSet::parse(scope) else {
            debug!(scope = %scope, "unparsable scope expression");
            return AmbitionAssessment::InvalidScope {
                scope: scope.to_string(),
            };
        };

        let pool: Vec<f64> = records
            .iter()
            .filter(|r| r.sector == matched.sector)
            .filter(|r| {
                ScopeSet::parse(&r.scope)
                    .map_or(false, |peer_scope| scope_compatible(requested_scope, peer_scope))
            })
            .map(|r| r.target_value)
            .filter(|v| v.is_finite())
            .collect();

        if pool.len() > PEER_POOL_WARN_THRESHOLD {
            warn!(
                sector = %matched.sector,
                peer_count = pool.len(),
                "peer pool above warning threshold, using whole pool"
            );
        }

        let Some(percentiles) = summarize(&pool) else {
            return AmbitionAssessment::InsufficientPeers {
                matched_sector: matched.sector,
                match_quality: matched.strategy,
                peer_count: pool.len(),
                required: MIN_PEERS_FOR_PERCENTILES,
            };
        };

        let base = if target_value < percentiles.median {
            AmbitionClass::Weak
        } else if target_value < percentiles.p75 {
            AmbitionClass::MarketStandard
        } else {
            AmbitionClass::AboveMarket
        };
        // Science validation upgrades, never downgrades
        let classification = if science_validated && base == AmbitionClass::AboveMarket {
            AmbitionClass::ScienceAligned
        } else {
            base
        };

        debug!(
            sector = %matched.sector,
            strategy = %matched.strategy,
            peer_count = pool.len(),
            target = target_value,
            %classification,
            "ambition classified"
        );

        AmbitionAssessment::Classified {
            classification,
            target_value,
            scope: requested_scope.label(),
            statistics: PeerStatistics {
                peer_count: pool.len(),
                percentiles,
                confidence_level: ConfidenceLevel::from_peer_count(pool.len()),
                match_quality: matched.strategy,
                matched_sector: matched.sector,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> BenchmarkEngine {
        BenchmarkEngine::new(ReferenceDataset::embedded().unwrap())
    }

    fn synthetic_pool(sector: &str, values: &[f64]) -> Vec<PeerRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PeerRecord {
                company: format!("Peer {}", i),
                sector: sector.to_string(),
                region: None,
                scope: "1+2".to_string(),
                target_value: *v,
                target_year: 2030,
                baseline_year: Some(2020),
                science_validated: false,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Confidence thresholds
    // -----------------------------------------------------------------------

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(ConfidenceLevel::from_peer_count(15), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_peer_count(14), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_peer_count(8), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_peer_count(7), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_peer_count(5), ConfidenceLevel::Low);
        assert_eq!(
            ConfidenceLevel::from_peer_count(4),
            ConfidenceLevel::Insufficient
        );
    }

    // -----------------------------------------------------------------------
    // Classification tiers
    // -----------------------------------------------------------------------

    #[test]
    fn test_below_median_is_weak() {
        let peers = synthetic_pool("Chemicals", &[30.0, 40.0, 50.0, 60.0, 70.0]);
        let a = engine().classify_ambition(35.0, "Chemicals", "1+2", false, Some(&peers));
        assert_eq!(a.classification(), Some(AmbitionClass::Weak));
    }

    #[test]
    fn test_between_median_and_p75_is_market_standard() {
        let peers = synthetic_pool("Chemicals", &[30.0, 40.0, 50.0, 60.0, 70.0]);
        let a = engine().classify_ambition(55.0, "Chemicals", "1+2", false, Some(&peers));
        assert_eq!(a.classification(), Some(AmbitionClass::MarketStandard));
    }

    #[test]
    fn test_at_p75_is_above_market() {
        let peers = synthetic_pool("Chemicals", &[30.0, 40.0, 50.0, 60.0, 70.0]);
        // p75 of this pool is 60
        let a = engine().classify_ambition(60.0, "Chemicals", "1+2", false, Some(&peers));
        assert_eq!(a.classification(), Some(AmbitionClass::AboveMarket));
    }

    #[test]
    fn test_science_validation_upgrades_above_market_only() {
        let peers = synthetic_pool("Chemicals", &[30.0, 40.0, 50.0, 60.0, 70.0]);
        let e = engine();

        let above = e.classify_ambition(75.0, "Chemicals", "1+2", true, Some(&peers));
        assert_eq!(above.classification(), Some(AmbitionClass::ScienceAligned));

        // Science flag on a mid-pool target stays MARKET_STANDARD
        let mid = e.classify_ambition(55.0, "Chemicals", "1+2", true, Some(&peers));
        assert_eq!(mid.classification(), Some(AmbitionClass::MarketStandard));
    }

    #[test]
    fn test_classification_monotonic_in_target() {
        let peers = synthetic_pool("Chemicals", &[20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
        let e = engine();
        let mut previous = AmbitionClass::Weak;
        for target in [10.0, 25.0, 45.0, 55.0, 65.0, 75.0, 95.0] {
            let class = e
                .classify_ambition(target, "Chemicals", "1+2", false, Some(&peers))
                .classification()
                .unwrap();
            assert!(class >= previous, "classification regressed at {}", target);
            previous = class;
        }
    }

    // -----------------------------------------------------------------------
    // Degraded outcomes
    // -----------------------------------------------------------------------

    #[test]
    fn test_insufficient_peers_below_three() {
        let peers = synthetic_pool("Chemicals", &[30.0, 40.0]);
        let a = engine().classify_ambition(50.0, "Chemicals", "1+2", false, Some(&peers));
        match a {
            AmbitionAssessment::InsufficientPeers {
                peer_count,
                required,
                ..
            } => {
                assert_eq!(peer_count, 2);
                assert_eq!(required, 3);
            }
            other => panic!("expected InsufficientPeers, got {:?}", other),
        }
    }

    #[test]
    fn test_no_sector_match_lists_available() {
        let a = engine().classify_ambition(50.0, "Asteroid Mining", "1+2", false, None);
        match a {
            AmbitionAssessment::NoSectorMatch {
                requested,
                available_sectors,
            } => {
                assert_eq!(requested, "Asteroid Mining");
                assert!(!available_sectors.is_empty());
            }
            other => panic!("expected NoSectorMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_scope_reported() {
        let a = engine().classify_ambition(50.0, "Chemicals", "by 2030", false, None);
        assert!(matches!(a, AmbitionAssessment::InvalidScope { .. }));
    }

    #[test]
    fn test_scope_exclusion_shrinks_pool() {
        // Pool rows cover 1+2+3 only; a 1+2 request must not match any
        let mut peers = synthetic_pool("Chemicals", &[30.0, 40.0, 50.0, 60.0]);
        for p in &mut peers {
            p.scope = "1+2+3".to_string();
        }
        let a = engine().classify_ambition(50.0, "Chemicals", "1+2", false, Some(&peers));
        match a {
            AmbitionAssessment::InsufficientPeers { peer_count, .. } => assert_eq!(peer_count, 0),
            other => panic!("expected InsufficientPeers, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario and scale
    // -----------------------------------------------------------------------

    #[test]
    fn test_electrical_machinery_scenario() {
        let e = engine();
        let a = e.classify_ambition(90.0, "Electrical Equipment and Machinery", "1+2", true, None);
        match &a {
            AmbitionAssessment::Classified {
                classification,
                statistics,
                ..
            } => {
                assert_eq!(statistics.peer_count, 40);
                assert_eq!(statistics.confidence_level, ConfidenceLevel::High);
                assert!(90.0 > statistics.percentiles.p75);
                assert!(
                    *classification == AmbitionClass::AboveMarket
                        || *classification == AmbitionClass::ScienceAligned
                );
            }
            other => panic!("expected Classified, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_pool_used_whole() {
        let values: Vec<f64> = (0..150).map(|i| 20.0 + (i as f64) * 0.4).collect();
        let peers = synthetic_pool("Chemicals", &values);
        let a = engine().classify_ambition(85.0, "Chemicals", "1+2", false, Some(&peers));
        match a {
            AmbitionAssessment::Classified { statistics, .. } => {
                // Never trimmed, the whole pool counts
                assert_eq!(statistics.peer_count, 150);
            }
            other => panic!("expected Classified, got {:?}", other),
        }
    }

    #[test]
    fn test_peer_data_override_ignores_dataset() {
        let peers = synthetic_pool("Basket Weaving", &[10.0, 20.0, 30.0]);
        let a = engine().classify_ambition(25.0, "Basket Weaving", "1+2", false, Some(&peers));
        assert!(a.is_classified());
    }
}
