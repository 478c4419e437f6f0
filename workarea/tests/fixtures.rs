//! Tests d'intégration sur les instantanés de `tests/fixtures`
//!
//! Chaque instantané `*.json` porte un bloc `expected` lu ici.

use std::path::{Path, PathBuf};

use coverage::{analyze, Analysis, ScoringConfig};
use serde_json::Value;
use workarea::cli;
use workarea::config::{Config, PRESETS};
use workarea::ingest::{feature_service, load_areas, Snapshot};
use workarea::report::{AnalysisReport, AnalysisStatus};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn snapshot_fixtures() -> Vec<PathBuf> {
    let pattern = fixtures_dir().join("*.json");
    let pattern = pattern.to_str().unwrap();

    glob::glob(pattern)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|path| path.file_name().map_or(false, |name| name != "areas.json"))
        .collect()
}

/// Répertoire temporaire propre au test et au processus
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("workarea-{}-{}", test, std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    dir
}

fn expected(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).unwrap();
    let value: Value = serde_json::from_str(&content).unwrap();
    value["expected"].clone()
}

#[test]
fn test_snapshot_fixtures() {
    let fixtures = snapshot_fixtures();
    assert!(fixtures.len() >= 4, "Should find the snapshot fixtures");

    let config = Config::default();
    let taxonomy = config.build_taxonomy().unwrap();

    for path in &fixtures {
        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        let snapshot = Snapshot::load(path).unwrap();
        let expected = expected(path);

        let analysis = analyze(&snapshot.polygon, &snapshot.records, &taxonomy, &config.scoring);
        println!("{}: active={}", name, analysis.is_active());

        assert_eq!(
            analysis.is_active(),
            expected["active"].as_bool().unwrap(),
            "{}: unexpected activity",
            name
        );

        let Some(active) = analysis.active() else {
            continue;
        };

        assert_eq!(
            active.inside_record_ids.len() as u64,
            expected["records_inside"].as_u64().unwrap(),
            "{}: unexpected records inside",
            name
        );
        assert_eq!(
            active.completeness.completeness_pct as u64,
            expected["completeness_pct"].as_u64().unwrap(),
            "{}: unexpected completeness",
            name
        );
    }
}

#[test]
fn test_mixed_fixture_details() {
    let snapshot = Snapshot::load(&fixtures_dir().join("mixed.json")).unwrap();
    let taxonomy = Config::default().build_taxonomy().unwrap();
    let analysis = analyze(
        &snapshot.polygon,
        &snapshot.records,
        &taxonomy,
        &ScoringConfig::default(),
    );

    let Analysis::Active(active) = analysis else {
        panic!("mixed fixture should be active");
    };

    assert_eq!(
        active.inside_record_ids,
        vec!["water-point", "gas-line", "survey-polygon"]
    );
    assert_eq!(active.completeness.records_by_type.get("as-built"), Some(&2));
    assert_eq!(
        active.completeness.records_by_type.get("pothole report"),
        Some(&1)
    );
    assert!(active
        .completeness
        .gap_lines()
        .iter()
        .any(|gap| gap.starts_with("Missing utility categories: Electric")));
}

#[test]
fn test_presets_score_fixtures() {
    let snapshot = Snapshot::load(&fixtures_dir().join("scenario_a.json")).unwrap();

    for preset in PRESETS {
        let config = Config::from_preset(preset).unwrap();
        let taxonomy = config.build_taxonomy().unwrap();
        let analysis = analyze(&snapshot.polygon, &snapshot.records, &taxonomy, &config.scoring);

        let report = AnalysisReport::new(preset, &snapshot.polygon, &snapshot.records, &analysis)
            .unwrap();
        assert_eq!(report.status, AnalysisStatus::Partial, "preset {}", preset);
        assert_eq!(report.records_inside, 1);
        assert!(report.completeness_pct.is_some());
    }
}

#[test]
fn test_geojson_features_extend_snapshot() {
    let mut snapshot = Snapshot::load(&fixtures_dir().join("empty_area.json")).unwrap();
    let raw = feature_service::load_raw(&fixtures_dir().join("utility_records.geojson")).unwrap();
    assert_eq!(raw.len(), 4);

    // La MultiPoint est ignorée
    let added = snapshot.extend_raw(raw);
    assert_eq!(added, 3);

    let taxonomy = Config::default().build_taxonomy().unwrap();
    let analysis = analyze(
        &snapshot.polygon,
        &snapshot.records,
        &taxonomy,
        &ScoringConfig::default(),
    );
    let active = analysis.active().unwrap();

    assert_eq!(active.inside_record_ids, vec!["gas-1", "power-1"]);
    let present: Vec<String> = active
        .completeness
        .categories_present
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(present, vec!["Gas".to_string(), "Electric".to_string()]);
}

#[test]
fn test_load_records_skips_unsupported() {
    let records =
        feature_service::load_records(&fixtures_dir().join("utility_records.geojson")).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.files.len() == 1));
}

#[test]
fn test_batch_command_writes_reports() {
    let areas = load_areas(&fixtures_dir().join("areas.json")).unwrap();
    assert_eq!(areas.len(), 3);

    let output = scratch_dir("batch-reports");

    let features = fixtures_dir().join("utility_records.geojson");
    cli::cmd_batch(
        &fixtures_dir().join("areas.json"),
        &fixtures_dir().join("mixed.json"),
        Some(features.as_path()),
        Some("utility"),
        Some(output.as_path()),
    )
    .unwrap();

    for area in &areas {
        let path = output.join(format!("{}.json", area.name));
        assert!(path.exists(), "missing report for {}", area.name);
    }

    let downtown: Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("downtown.json")).unwrap())
            .unwrap();
    assert_eq!(downtown["status"], "Partial");

    let unfinished: Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("unfinished.json")).unwrap())
            .unwrap();
    assert_eq!(unfinished["status"], "Inactive");
    assert!(unfinished["completeness_pct"].is_null());

    std::fs::remove_dir_all(&output).ok();
}

#[test]
fn test_analyze_command_missing_snapshot() {
    let result = cli::cmd_analyze(
        &fixtures_dir().join("does-not-exist.json"),
        None,
        None,
        None,
        "missing",
    );
    assert!(result.is_err());
}

#[test]
fn test_batch_command_keeps_colliding_area_names() {
    let dir = scratch_dir("batch-collisions");
    std::fs::create_dir_all(&dir).unwrap();

    let areas_path = dir.join("areas.json");
    std::fs::write(
        &areas_path,
        r#"[
            {"name": "zone a", "polygon": [{"lat": 0, "lng": 0}, {"lat": 0, "lng": 10}, {"lat": 10, "lng": 10}, {"lat": 10, "lng": 0}]},
            {"name": "zone/a", "polygon": [{"lat": 20, "lng": 0}, {"lat": 20, "lng": 10}, {"lat": 30, "lng": 10}, {"lat": 30, "lng": 0}]}
        ]"#,
    )
    .unwrap();

    let output = dir.join("reports");
    cli::cmd_batch(
        &areas_path,
        &fixtures_dir().join("mixed.json"),
        None,
        Some("utility"),
        Some(output.as_path()),
    )
    .unwrap();

    let first: Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("zone_a.json")).unwrap())
            .unwrap();
    let second: Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("zone_a-2.json")).unwrap())
            .unwrap();
    assert_eq!(first["area"], "zone a");
    assert_eq!(second["area"], "zone/a");
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_taxonomy_command_leaf_lookup() {
    assert!(cli::cmd_taxonomy(Some("utility"), Some("municipality/water/as-built")).is_ok());
    assert!(cli::cmd_taxonomy(Some("utility"), Some("municipality/water/unknown")).is_err());
    assert!(cli::cmd_taxonomy(Some("minimal"), None).is_ok());
}
