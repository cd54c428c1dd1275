//! End-to-end runs of the pipeline on bridge files.
//!
//! Each test goes through the same path the command line takes: a bridge
//! document is loaded from disk, calculated, and the result is written back.

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use deck_core::geometry::SectionPlane;
use deck_core::load_zones::LoadZoneType;
use deck_core::reinforcement::ZoneId;
use deck_core::segments::BridgeSegment;
use deck_core::view::Layer;
use deck_core::{calculate, load_bridge, save_bridge, Bridge, DeckError, EngineConfig};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("deckform_pipeline_{}_{}.json", name, std::process::id()))
}

/// Three rows, two spans, zone names as existing parameter files spell them.
const CANAL_BRIDGE: &str = r#"{
  "meta": {
    "version": "0.1.0",
    "id": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
    "name": "Canal crossing",
    "build_year": 1968,
    "created": "2024-03-01T08:00:00Z",
    "modified": "2024-03-01T08:00:00Z"
  },
  "segments": [
    { "bz1": 2.0, "bz2": 8.0, "bz3": 2.0, "dz": 0.6, "dz_2": 0.8, "is_first_segment": true },
    { "bz1": 2.0, "bz2": 8.0, "bz3": 2.0, "dz": 0.6, "dz_2": 0.8, "l": 12.0 },
    { "bz1": 2.0, "bz2": 8.0, "bz3": 2.0, "dz": 0.6, "dz_2": 0.8, "l": 15.0 }
  ],
  "load_zones": [
    { "zone_type": "Voetgangers", "widths": [2.0, 2.0, 2.0] },
    { "zone_type": "Auto", "widths": [7.5, 7.5, null] },
    { "zone_type": "Berm", "widths": [2.5, 2.5, 2.5] }
  ],
  "view": { "cross_section_x": 12.0 }
}"#;

fn canal_bridge() -> Bridge {
    let path = temp_path("canal_source");
    fs::write(&path, CANAL_BRIDGE).unwrap();
    let bridge = load_bridge(&path).unwrap();
    let _ = fs::remove_file(&path);
    bridge
}

#[test]
fn test_bridge_file_runs_end_to_end() {
    let bridge = canal_bridge();
    assert_eq!(bridge.segments.len(), 3);
    assert_eq!(bridge.load_zones[1].zone_type, LoadZoneType::Vehicle);

    let result = calculate(&bridge, &EngineConfig::default()).unwrap();

    assert_eq!(result.cross_sections.len(), 3);
    assert_eq!(result.geometry.blocks.len(), 6);
    assert!(result.geometry.solid.is_closed());

    // (2 * 2.0 * 0.6 + 8.0 * 0.8) m² over 27 m
    assert_relative_eq!(result.geometry.slab_volume(), 8.8 * 27.0, epsilon = 1e-9);
    assert_relative_eq!(result.geometry.solid.volume(), 8.8 * 27.0, epsilon = 1e-9);

    // No reinforcement zones in the file: every row still gets its three
    assert_eq!(result.reinforcement.zones.len(), 9);
    assert!(result.reinforcement.zones.iter().all(|z| z.bends_compliant()));
    assert!(result.passes(), "unexpected findings: {:?}", result.warnings());

    assert_eq!(result.views.cross.title, "Cross-section D2");
    assert!(result.views.cross.warnings.is_empty());
}

#[test]
fn test_missing_width_counts_as_zero() {
    let result = calculate(&canal_bridge(), &EngineConfig::default()).unwrap();

    let d3 = &result.load_zones.sections[2];
    assert_eq!(d3.name, "D3");
    assert_relative_eq!(d3.explicit_sum, 2.0);
    assert!(!d3.overflow);

    // The verge is last: it starts right after the pedestrians at D3 and
    // runs to the far edge
    let verge = &result.load_zones.zones[2];
    assert!(verge.is_last_zone);
    assert_relative_eq!(verge.bands[2].start, 2.0);
    assert_relative_eq!(verge.bands[2].end, 12.0);
}

#[test]
fn test_saved_bridge_gives_same_result() {
    let mut bridge = canal_bridge();
    bridge.set_segments(bridge.segments.rows().to_vec());
    let path = temp_path("canal_saved");

    save_bridge(&bridge, &path).unwrap();
    let reloaded = load_bridge(&path).unwrap();
    let _ = fs::remove_file(&path);

    let config = EngineConfig::default();
    let first = calculate(&bridge, &config).unwrap();
    let second = calculate(&reloaded, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.reinforcement.zones.len(), 9);
}

#[test]
fn test_long_bridge_is_truncated_but_complete() {
    let mut rows = vec![BridgeSegment::first(1.5, 6.0, 1.5, 0.5, 0.7)];
    rows.extend((1..17).map(|_| BridgeSegment::next(1.5, 6.0, 1.5, 0.5, 0.7, 10.0)));
    let bridge = Bridge::with_segments("Viaduct", rows);

    let result = calculate(&bridge, &EngineConfig::default()).unwrap();

    assert_eq!(result.cross_sections.len(), 15);
    assert_eq!(result.cross_sections.omitted_count, 2);
    assert!(!result.passes());
    assert!(result.warnings()[0].starts_with("Only the first 15 cross-sections"));

    // Geometry still covers the whole deck
    assert_eq!(result.geometry.blocks.len(), 16 * 3);
    let bounds = result.geometry.bounds().unwrap();
    assert_relative_eq!(bounds.max.x - bounds.min.x, 160.0, epsilon = 1e-9);

    // Reinforcement zones exist for every row, beyond the last cross-section too
    assert_eq!(result.reinforcement.zones.len(), 17 * 3);
    assert!(result.reinforcement.zone(&ZoneId::parse("2-17").unwrap()).is_some());
}

#[test]
fn test_placement_moves_only_the_solid() {
    let bridge = canal_bridge();
    let mut config = EngineConfig::default();
    config.placement.x = 100.0;
    config.placement.z = 4.0;

    let placed = calculate(&bridge, &config).unwrap();
    let origin = calculate(&bridge, &EngineConfig::default()).unwrap();

    let placed_bounds = placed.geometry.bounds().unwrap();
    let origin_bounds = origin.geometry.bounds().unwrap();
    assert_relative_eq!(placed_bounds.min.x - origin_bounds.min.x, 100.0, epsilon = 1e-9);
    assert_relative_eq!(placed_bounds.max.z - origin_bounds.max.z, 4.0, epsilon = 1e-9);

    let plane = SectionPlane::Cross { x: 12.0 };
    assert_eq!(placed.geometry.section(&plane), origin.geometry.section(&plane));
    assert_eq!(placed.views, origin.views);
}

#[test]
fn test_overflowing_zones_are_drawn_and_reported() {
    let mut bridge = canal_bridge();
    bridge.load_zones[1].widths = vec![Some(11.0), Some(7.5), Some(7.5)];

    let result = calculate(&bridge, &EngineConfig::default()).unwrap();

    assert_eq!(result.load_zones.flagged_sections(), vec!["D1"]);
    // The vehicles run past the edge, the verge starts beyond it
    assert_eq!(result.load_zones.offending_zones(), vec![1, 2]);
    assert!(result
        .warnings()
        .iter()
        .any(|w| w == "At D1: total zone width (13.00m) exceeds deck width (12.00m) by 1.00m."));
    assert!(!result.views.plan.highlighted().is_empty());
    assert!(result
        .views
        .plan
        .polylines_on(Layer::LoadZone)
        .next()
        .is_some());
}

#[test]
fn test_fatal_errors_are_structured() {
    let mut bridge = canal_bridge();
    bridge.segments = vec![BridgeSegment::first(2.0, -8.0, 2.0, 0.6, 0.8)].into();

    let err = calculate(&bridge, &EngineConfig::default()).unwrap_err();
    match &err {
        DeckError::InvalidInput { field, .. } => assert_eq!(field, "segments[0].bz2"),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert_eq!(err.error_code(), "INVALID_INPUT");

    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"type\":\"InvalidInput\""));
}
