//! # Pipeline
//!
//! Runs every component on one bridge snapshot:
//!
//! ```text
//! SegmentTable → CrossSectionIndex → { GeometryBuilder, LoadZoneValidator,
//!                                      ReinforcementZoneMapper } → ViewProjector
//! ```
//!
//! Nothing is cached between calls. The reinforcement zones are regenerated
//! for the current rows before mapping, so a bridge handed over with a
//! missing or outdated zone set still yields exactly three zones per row.
//! The result carries the bridge's parameter fingerprint so callers can
//! memoize on it.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::bridge::Bridge;
//! use deck_core::config::EngineConfig;
//! use deck_core::engine::calculate;
//! use deck_core::segments::BridgeSegment;
//!
//! let bridge = Bridge::with_segments("Example", vec![
//!     BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
//!     BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
//! ]);
//!
//! let result = calculate(&bridge, &EngineConfig::default()).unwrap();
//! assert_eq!(result.cross_sections.len(), 2);
//! assert!(result.passes());
//! ```

use serde::{Deserialize, Serialize};

use crate::bridge::Bridge;
use crate::config::EngineConfig;
use crate::cross_sections::CrossSectionIndex;
use crate::errors::DeckResult;
use crate::geometry::{DeckGeometry, GeometryBuilder};
use crate::load_zones::{LoadZoneReport, LoadZoneValidator};
use crate::reinforcement::{reconcile, BendRadiusTable, ReinforcementLayout, ReinforcementZoneMapper};
use crate::view::{ProjectionInput, ViewProjector, ViewSet};

/// Everything derived from one bridge snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResult {
    /// Fingerprint of the parameters this result was computed from
    pub fingerprint: String,

    pub cross_sections: CrossSectionIndex,
    pub geometry: DeckGeometry,
    pub load_zones: LoadZoneReport,
    pub reinforcement: ReinforcementLayout,
    pub views: ViewSet,
}

impl BridgeResult {
    /// True when there are no advisory findings at all
    pub fn passes(&self) -> bool {
        self.load_zones.passes() && self.reinforcement.passes() && !self.cross_sections.is_truncated()
    }

    /// All advisory findings as messages
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self.cross_sections.truncation_message().into_iter().collect();
        warnings.extend(self.load_zones.messages.iter().cloned());
        for check in self.load_zones.zones.iter().filter(|z| z.exceeds_limits()) {
            let names: Vec<String> = check
                .offending_sections
                .iter()
                .filter_map(|&i| self.cross_sections.sections().get(i).map(|s| s.name.clone()))
                .collect();
            warnings.push(format!(
                "Load zone {} ({}) extends beyond the deck edge at {}.",
                check.zone_index + 1,
                check.zone_type.display_name(),
                names.join(", ")
            ));
        }
        warnings.extend(self.reinforcement.warnings.iter().cloned());
        warnings
    }
}

/// Run the full pipeline with the built-in bend radius table.
pub fn calculate(bridge: &Bridge, config: &EngineConfig) -> DeckResult<BridgeResult> {
    calculate_with_table(bridge, config, BendRadiusTable::builtin())
}

/// Run the full pipeline with a caller-supplied bend radius table.
///
/// # Errors
///
/// Any fatal input error of the bridge or the configuration. Advisory
/// findings never fail the calculation.
pub fn calculate_with_table(
    bridge: &Bridge,
    config: &EngineConfig,
    bend_table: &BendRadiusTable,
) -> DeckResult<BridgeResult> {
    config.validate()?;
    bridge.validate()?;

    let table = &bridge.segments;
    let cross_sections = CrossSectionIndex::build(table)?;
    tracing::info!(
        rows = table.len(),
        cross_sections = cross_sections.len(),
        omitted = cross_sections.omitted_count,
        "Indexed cross-sections"
    );

    let load_zones = LoadZoneValidator::new(config.width_tolerance_m).validate(&bridge.load_zones, &cross_sections)?;

    // Parameter files may carry a stale or partial zone set
    let zones = reconcile(&bridge.reinforcement_zones, table.len());
    let settings = &bridge.settings;
    let reinforcement =
        ReinforcementZoneMapper::new(settings.cover_top_mm, settings.cover_bottom_mm, settings.bar_placement)
            .with_table(bend_table)
            .with_clear_spacing(config.bar_clear_spacing_mm)
            .map(&zones, table)?;

    let geometry = GeometryBuilder::from_config(config).build(table, &bridge.view, Some(&reinforcement))?;

    let views = ViewProjector::from_config(config).project(&ProjectionInput {
        table,
        index: &cross_sections,
        geometry: &geometry,
        load_zones: &load_zones,
        reinforcement: &reinforcement,
        view: &bridge.view,
    });

    let result = BridgeResult {
        fingerprint: bridge.fingerprint()?,
        cross_sections,
        geometry,
        load_zones,
        reinforcement,
        views,
    };
    tracing::info!(
        fingerprint = %result.fingerprint,
        faces = result.geometry.solid.face_count(),
        findings = result.warnings().len(),
        "Calculated bridge"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DeckError;
    use crate::load_zones::{LoadZone, LoadZoneType};
    use crate::reinforcement::{BarRole, BarSet, ZoneId};
    use crate::segments::{BridgeSegment, ZoneLocation};

    fn example_bridge() -> Bridge {
        let mut bridge = Bridge::with_segments(
            "Example",
            vec![
                BridgeSegment::first(5.0, 20.0, 5.0, 0.8, 1.0),
                BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 10.0),
            ],
        );
        bridge.load_zones = vec![
            LoadZone::uniform(LoadZoneType::Pedestrian, 1.5, 2),
            LoadZone::uniform(LoadZoneType::Cyclist, 3.0, 2),
            LoadZone::uniform(LoadZoneType::Verge, 0.5, 2),
            LoadZone::uniform(LoadZoneType::Vehicle, 10.5, 2),
        ];
        bridge
    }

    #[test]
    fn test_clean_bridge_passes() {
        let result = calculate(&example_bridge(), &EngineConfig::default()).unwrap();
        assert!(result.passes());
        assert!(result.warnings().is_empty());
        assert_eq!(result.reinforcement.zones.len(), 6);
        assert_eq!(result.geometry.blocks.len(), 3);
    }

    #[test]
    fn test_findings_do_not_abort() {
        let mut bridge = example_bridge();
        bridge.load_zones[0] = LoadZone::uniform(LoadZoneType::Pedestrian, 28.0, 2);
        let id = ZoneId::new(ZoneLocation::Zone1, 1);
        bridge.reinforcement_zone_mut(&id).unwrap().longitudinal_top = BarSet::new(40.0, 200.0).with_bend_radius(80.0);

        let result = calculate(&bridge, &EngineConfig::default()).unwrap();
        assert!(!result.passes());
        let warnings = result.warnings();
        assert!(warnings.iter().any(|w| w.starts_with("At D1:")));
        assert!(warnings.iter().any(|w| w.contains("Load zone 2 (Cyclists)")));
        assert!(warnings.iter().any(|w| w.starts_with("Zone 1-1:")));
        assert!(!result.geometry.solid.is_empty());
    }

    #[test]
    fn test_fatal_input_aborts() {
        let mut bridge = example_bridge();
        bridge.segments = vec![BridgeSegment::first(5.0, 20.0, 5.0, 0.8, 1.0)].into();
        bridge.reinforcement_zones.truncate(3);
        assert!(calculate(&bridge, &EngineConfig::default()).is_err());

        bridge.segments = Default::default();
        assert_eq!(calculate(&bridge, &EngineConfig::default()), Err(DeckError::EmptyBridge));
    }

    #[test]
    fn test_fingerprint_matches_bridge() {
        let bridge = example_bridge();
        let result = calculate(&bridge, &EngineConfig::default()).unwrap();
        assert_eq!(result.fingerprint, bridge.fingerprint().unwrap());
    }

    #[test]
    fn test_zone_set_follows_rows() {
        let mut bridge = example_bridge();
        bridge.segments = vec![
            BridgeSegment::first(5.0, 20.0, 5.0, 0.8, 1.0),
            BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 10.0),
            BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 12.0),
        ]
        .into();
        // Zones of a fourth row that no longer exists, one customized zone kept
        bridge.reinforcement_zones = reconcile(&[], 4);
        let kept = ZoneId::new(ZoneLocation::Zone2, 2);
        bridge.reinforcement_zones[kept.flat_index()].transverse = BarSet::new(16.0, 100.0);

        let result = calculate(&bridge, &EngineConfig::default()).unwrap();
        let ids: Vec<ZoneId> = result.reinforcement.zones.iter().map(|z| z.id).collect();
        assert_eq!(ids, ZoneId::all_for(3));
        let layer = result.reinforcement.zone(&kept).unwrap().layer(BarRole::TransverseTop).unwrap();
        assert_eq!(layer.diameter_mm, 16.0);

        bridge.reinforcement_zones.clear();
        let result = calculate(&bridge, &EngineConfig::default()).unwrap();
        assert_eq!(result.reinforcement.zones.len(), 9);
    }

    #[test]
    fn test_custom_bend_table() {
        let table = BendRadiusTable::from_entries([(16, 32.0)]);
        let result = calculate_with_table(&example_bridge(), &EngineConfig::default(), &table).unwrap();
        // default 12 mm bars are not in this table
        assert!(!result.reinforcement.passes());
    }
}
