//! Benchmark Engine Integration Tests
//!
//! Classification exercised the way the Benchmarking phase drives it:
//! extraction-shaped sector names, deployment datasets loaded from disk, and
//! the serialized assessment shape that lands in the fact store and the
//! report. The engine must stay a pure function of its inputs.

use covenant::{AmbitionAssessment, AmbitionClass, BenchmarkEngine, ReferenceDataset};
use covenant_benchmark::{ConfidenceLevel, MatchStrategy};

fn embedded_engine() -> BenchmarkEngine {
    BenchmarkEngine::new(ReferenceDataset::embedded().unwrap())
}

fn peers_json(sector: &str, scope: &str, values: &[f64]) -> String {
    let rows: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                r#"{{"company": "Peer {}", "sector": "{}", "scope": "{}",
                     "target_value": {}, "target_year": 2030}}"#,
                i, sector, scope, v
            )
        })
        .collect();
    format!("[{}]", rows.join(","))
}

// ============================================================================
// Deployment dataset loading
// ============================================================================

#[test]
fn test_dataset_file_drives_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("peers.json");
    std::fs::write(
        &path,
        peers_json("Construction Materials", "1+2", &[30.0, 35.0, 40.0, 45.0, 55.0, 60.0]),
    )
    .unwrap();

    let engine = BenchmarkEngine::new(ReferenceDataset::from_path(&path).unwrap());
    // "cement" resolves through the alias table, not a name hit
    let assessment = engine.classify_ambition(50.0, "cement", "1+2", false, None);

    match assessment {
        AmbitionAssessment::Classified {
            classification,
            statistics,
            ..
        } => {
            assert_eq!(classification, AmbitionClass::MarketStandard);
            assert_eq!(statistics.matched_sector, "Construction Materials");
            assert_eq!(statistics.match_quality, MatchStrategy::Alias);
            assert_eq!(statistics.peer_count, 6);
            assert_eq!(statistics.confidence_level, ConfidenceLevel::Low);
        }
        other => panic!("expected Classified, got {:?}", other),
    }
}

#[test]
fn test_scope_comparability_rule_end_to_end() {
    let dataset =
        ReferenceDataset::from_json_str(&peers_json("Chemicals", "1+2+3", &[30.0, 40.0, 50.0, 60.0]))
            .unwrap();
    let engine = BenchmarkEngine::new(dataset);

    // A 1+2 request is not comparable to a pool of 1+2+3 commitments
    let narrow = engine.classify_ambition(45.0, "Chemicals", "1+2", false, None);
    match narrow {
        AmbitionAssessment::InsufficientPeers { peer_count, required, .. } => {
            assert_eq!(peer_count, 0);
            assert_eq!(required, 3);
        }
        other => panic!("expected InsufficientPeers, got {:?}", other),
    }

    // The full-coverage request qualifies the whole pool
    let full = engine.classify_ambition(45.0, "Chemicals", "1+2+3", false, None);
    assert!(full.is_classified());
}

// ============================================================================
// Embedded scenario
// ============================================================================

#[test]
fn test_electrical_machinery_flagship_scenario() {
    let assessment = embedded_engine().classify_ambition(
        90.0,
        "Electrical Equipment and Machinery",
        "1+2",
        true,
        None,
    );

    match &assessment {
        AmbitionAssessment::Classified {
            classification,
            statistics,
            scope,
            ..
        } => {
            assert_eq!(*classification, AmbitionClass::ScienceAligned);
            assert_eq!(scope, "1+2");
            assert_eq!(statistics.peer_count, 40);
            assert_eq!(statistics.confidence_level, ConfidenceLevel::High);
            let p = &statistics.percentiles;
            assert!(p.min <= p.p25 && p.p25 <= p.median && p.median <= p.p75 && p.p75 <= p.max);
        }
        other => panic!("expected Classified, got {:?}", other),
    }
}

#[test]
fn test_classification_monotonic_over_embedded_pool() {
    let engine = embedded_engine();
    let mut previous = AmbitionClass::Weak;
    for target in [5.0, 20.0, 35.0, 50.0, 65.0, 80.0, 95.0] {
        let class = engine
            .classify_ambition(target, "Electrical Equipment and Machinery", "1+2", false, None)
            .classification()
            .unwrap();
        assert!(class >= previous, "classification regressed at target {}", target);
        previous = class;
    }
}

// ============================================================================
// Serialized assessment shape
// ============================================================================

#[test]
fn test_classified_wire_shape() {
    let assessment = embedded_engine().classify_ambition(
        90.0,
        "Electrical Equipment and Machinery",
        "1+2",
        true,
        None,
    );
    let value = serde_json::to_value(&assessment).unwrap();

    assert_eq!(value["status"], "classified");
    assert_eq!(value["classification"], "SCIENCE_ALIGNED");
    assert_eq!(value["statistics"]["match_quality"], "exact");
    assert_eq!(value["statistics"]["confidence_level"], "HIGH");
    assert!(value["statistics"]["percentiles"]["median"].is_number());

    // Report assembly deserializes the stored fact back into the same shape
    let round: AmbitionAssessment = serde_json::from_value(value).unwrap();
    assert!(round.is_classified());
}

#[test]
fn test_degraded_wire_shapes() {
    let engine = embedded_engine();

    let no_match = serde_json::to_value(
        engine.classify_ambition(50.0, "Asteroid Mining", "1+2", false, None),
    )
    .unwrap();
    assert_eq!(no_match["status"], "no_sector_match");
    assert_eq!(no_match["requested"], "Asteroid Mining");
    assert!(!no_match["available_sectors"].as_array().unwrap().is_empty());

    let bad_scope = serde_json::to_value(
        engine.classify_ambition(50.0, "Chemicals", "Not evidenced", false, None),
    )
    .unwrap();
    assert_eq!(bad_scope["status"], "invalid_scope");
    assert_eq!(bad_scope["scope"], "Not evidenced");
}

#[test]
fn test_classification_is_deterministic() {
    let engine = embedded_engine();
    let first = serde_json::to_value(
        engine.classify_ambition(72.5, "Chemicals", "1+2", false, None),
    )
    .unwrap();
    let second = serde_json::to_value(
        engine.classify_ambition(72.5, "Chemicals", "1+2", false, None),
    )
    .unwrap();
    assert_eq!(first, second);
}
