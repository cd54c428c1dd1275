//! # Bridge Data Structures
//!
//! The `Bridge` struct is the root container for one slab bridge: the
//! segment table, the load zones, the reinforcement zones and the scalar
//! settings. Bridges serialize to human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Bridge
//! ├── meta: BridgeMetadata (version, id, name, timestamps)
//! ├── segments: SegmentTable (rows D1..Dn)
//! ├── load_zones: Vec<LoadZone> (stacked from the zone 1 edge)
//! ├── reinforcement_zones: Vec<ReinforcementZone> (3 per row, keyed "L-S")
//! ├── settings: BridgeSettings (cover, materials, bar placement)
//! └── view: ViewSettings (section plane positions)
//! ```
//!
//! Segment mutations always regenerate the reinforcement zones by key, so
//! the zone set matches the rows at every point.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::bridge::Bridge;
//! use deck_core::segments::BridgeSegment;
//!
//! let mut bridge = Bridge::new("Overpass A12");
//! bridge.add_segment(BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0));
//! bridge.add_segment(BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0));
//!
//! let ids: Vec<&str> = bridge.reinforcement_zones.iter().map(|z| z.zone_id.as_str()).collect();
//! assert_eq!(ids, vec!["1-1", "2-1", "3-1", "1-2", "2-2", "3-2"]);
//! ```


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DeckError, DeckResult};
use crate::geometry::ViewSettings;
use crate::load_zones::LoadZone;
use crate::reinforcement::{reconcile, BarPlacement, ReinforcementZone, ZoneId, DEFAULT_COVER_MM};
use crate::segments::{BridgeSegment, SegmentTable};

/// Current schema version for bridge files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root bridge container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    /// Bridge metadata (version, id, name)
    pub meta: BridgeMetadata,

    /// Ordered rows, one per cross-section
    #[serde(default)]
    pub segments: SegmentTable,

    /// Load zones in stacking order
    #[serde(default)]
    pub load_zones: Vec<LoadZone>,

    /// Reinforcement per zone and row
    #[serde(default)]
    pub reinforcement_zones: Vec<ReinforcementZone>,

    #[serde(default)]
    pub settings: BridgeSettings,

    #[serde(default)]
    pub view: ViewSettings,
}

impl Bridge {
    /// Create a new bridge without rows.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Bridge {
            meta: BridgeMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                build_year: None,
                created: now,
                modified: now,
            },
            segments: SegmentTable::default(),
            load_zones: Vec::new(),
            reinforcement_zones: Vec::new(),
            settings: BridgeSettings::default(),
            view: ViewSettings::default(),
        }
    }

    /// Create a bridge from rows, with default reinforcement for every zone.
    pub fn with_segments(name: impl Into<String>, rows: Vec<BridgeSegment>) -> Self {
        let mut bridge = Bridge::new(name);
        bridge.set_segments(rows);
        bridge
    }

    /// Append a row.
    pub fn add_segment(&mut self, row: BridgeSegment) {
        self.segments.rows_mut().push(row);
        self.segments_changed();
    }

    /// Insert a row before `index`.
    ///
    /// Zones keep their data by identifier, so zone `L-S` still carries the
    /// values it had, now describing whatever row is at position S.
    pub fn insert_segment(&mut self, index: usize, row: BridgeSegment) -> DeckResult<()> {
        if index > self.segments.len() {
            return Err(DeckError::invalid_input(
                "segments",
                index.to_string(),
                format!("Insert position is past the end of the table ({} rows)", self.segments.len()),
            ));
        }
        self.segments.rows_mut().insert(index, row);
        self.segments_changed();
        Ok(())
    }

    /// Remove the row at `index`, dropping the zones that no longer exist.
    pub fn remove_segment(&mut self, index: usize) -> DeckResult<BridgeSegment> {
        if index >= self.segments.len() {
            return Err(DeckError::invalid_input(
                "segments",
                index.to_string(),
                format!("No row at this position ({} rows)", self.segments.len()),
            ));
        }
        let row = self.segments.rows_mut().remove(index);
        self.segments_changed();
        Ok(row)
    }

    /// Replace all rows.
    pub fn set_segments(&mut self, rows: Vec<BridgeSegment>) {
        *self.segments.rows_mut() = rows;
        self.segments_changed();
    }

    fn segments_changed(&mut self) {
        self.segments.normalize_first_flags();
        self.reinforcement_zones = reconcile(&self.reinforcement_zones, self.segments.len());
        self.touch();
    }

    /// Reinforcement of one zone
    pub fn reinforcement_zone(&self, id: &ZoneId) -> Option<&ReinforcementZone> {
        let key = id.to_string();
        self.reinforcement_zones.iter().find(|z| z.zone_id == key)
    }

    /// Mutable reinforcement of one zone; marks the bridge as modified.
    pub fn reinforcement_zone_mut(&mut self, id: &ZoneId) -> Option<&mut ReinforcementZone> {
        let key = id.to_string();
        let zone = self.reinforcement_zones.iter_mut().find(|z| z.zone_id == key)?;
        self.meta.modified = Utc::now();
        Some(zone)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Validate every parameter that would abort computation.
    pub fn validate(&self) -> DeckResult<()> {
        self.segments.validate()?;
        for (index, zone) in self.load_zones.iter().enumerate() {
            zone.validate(index)?;
        }
        for zone in &self.reinforcement_zones {
            zone.id()?;
            zone.validate()?;
        }
        self.settings.validate()
    }

    /// Stable hash of everything that affects derived results.
    ///
    /// The same parameters give the same fingerprint on every build, so it
    /// can key a persisted cache. Metadata is excluded, so renaming or re-saving a bridge does not
    /// change its fingerprint.
    pub fn fingerprint(&self) -> DeckResult<String> {
        #[derive(Serialize)]
        struct Parameters<'a> {
            segments: &'a SegmentTable,
            load_zones: &'a [LoadZone],
            reinforcement_zones: &'a [ReinforcementZone],
            settings: &'a BridgeSettings,
            view: &'a ViewSettings,
        }

        let bytes = serde_json::to_vec(&Parameters {
            segments: &self.segments,
            load_zones: &self.load_zones,
            reinforcement_zones: &self.reinforcement_zones,
            settings: &self.settings,
            view: &self.view,
        })
        .map_err(|e| DeckError::serialization(e.to_string()))?;

        Ok(format!("{:016x}", fnv1a(&bytes)))
    }
}

/// 64-bit FNV-1a. The algorithm is fixed so fingerprints stay comparable
/// across builds and toolchains.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET_BASIS, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

impl Default for Bridge {
    fn default() -> Self {
        Bridge::new("")
    }
}

/// Bridge metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    pub id: Uuid,

    /// Bridge name or structure number
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_year: Option<u16>,

    /// When the bridge was created
    pub created: DateTime<Utc>,

    /// When the bridge was last modified
    pub modified: DateTime<Utc>,
}

/// Scalar settings shared by every zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Concrete cover at the top face (mm)
    pub cover_top_mm: f64,

    /// Concrete cover at the bottom face (mm)
    pub cover_bottom_mm: f64,

    /// Stacking of longitudinal and transverse bars, unless a zone overrides it
    pub bar_placement: BarPlacement,

    /// Reinforcing steel grade (e.g., "B500B")
    pub steel_grade: String,

    /// Concrete strength class (e.g., "C30/37")
    pub concrete_class: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        BridgeSettings {
            cover_top_mm: DEFAULT_COVER_MM,
            cover_bottom_mm: DEFAULT_COVER_MM,
            bar_placement: BarPlacement::default(),
            steel_grade: "B500B".to_string(),
            concrete_class: "C30/37".to_string(),
        }
    }
}

impl BridgeSettings {
    pub fn validate(&self) -> DeckResult<()> {
        for (field, value) in [
            ("settings.cover_top_mm", self.cover_top_mm),
            ("settings.cover_bottom_mm", self.cover_bottom_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DeckError::invalid_input(field, value.to_string(), "Cover must not be negative"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_zones::LoadZoneType;
    use crate::reinforcement::BarSet;
    use crate::segments::ZoneLocation;

    fn two_row_bridge() -> Bridge {
        Bridge::with_segments(
            "Test",
            vec![
                BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
                BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
            ],
        )
    }

    #[test]
    fn test_bridge_creation() {
        let bridge = Bridge::new("Overpass");
        assert_eq!(bridge.meta.name, "Overpass");
        assert_eq!(bridge.meta.version, SCHEMA_VERSION);
        assert!(bridge.segments.is_empty());
        assert_eq!(bridge.settings.steel_grade, "B500B");
        assert_eq!(bridge.settings.concrete_class, "C30/37");
    }

    #[test]
    fn test_three_zones_per_row() {
        let mut bridge = two_row_bridge();
        assert_eq!(bridge.reinforcement_zones.len(), 6);
        for n in 3..8 {
            bridge.add_segment(BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 5.0));
            assert_eq!(bridge.reinforcement_zones.len(), 3 * n);
            for zone in &bridge.reinforcement_zones {
                let id = zone.id().unwrap();
                assert!(id.segment >= 1 && id.segment <= n);
            }
        }
    }

    #[test]
    fn test_adding_segment_preserves_zone_data() {
        let mut bridge = two_row_bridge();
        let id = ZoneId::new(ZoneLocation::Zone2, 2);
        bridge.reinforcement_zone_mut(&id).unwrap().transverse = BarSet::new(16.0, 100.0);

        bridge.add_segment(BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0));
        assert_eq!(bridge.reinforcement_zones.len(), 9);
        assert_eq!(bridge.reinforcement_zone(&id).unwrap().transverse, BarSet::new(16.0, 100.0));
    }

    #[test]
    fn test_removing_segment_drops_zones() {
        let mut bridge = two_row_bridge();
        bridge.add_segment(BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0));
        let removed = bridge.remove_segment(2).unwrap();
        assert!((removed.l - 10.0).abs() < 1e-12);
        assert_eq!(bridge.reinforcement_zones.len(), 6);
        assert!(bridge.reinforcement_zone(&ZoneId::new(ZoneLocation::Zone1, 3)).is_none());
        assert!(bridge.remove_segment(5).is_err());
    }

    #[test]
    fn test_insert_normalizes_first_flag() {
        let mut bridge = two_row_bridge();
        bridge
            .insert_segment(0, BridgeSegment::next(3.0, 10.0, 3.0, 0.8, 1.0, 7.0))
            .unwrap();
        assert!(bridge.segments.validate().is_ok());
        assert!(bridge.segments.rows()[0].is_first_segment);
        assert_eq!(bridge.segments.rows()[0].l, 0.0);
        assert!(!bridge.segments.rows()[1].is_first_segment);
        assert!(bridge.insert_segment(10, BridgeSegment::first(1.0, 1.0, 1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_parameters_only() {
        let mut bridge = two_row_bridge();
        let original = bridge.fingerprint().unwrap();

        bridge.meta.name = "Renamed".to_string();
        bridge.touch();
        assert_eq!(bridge.fingerprint().unwrap(), original);

        bridge.load_zones.push(LoadZone::uniform(LoadZoneType::Vehicle, 3.5, 2));
        assert_ne!(bridge.fingerprint().unwrap(), original);
    }

    #[test]
    fn test_fingerprint_hash_is_fixed() {
        // Published FNV-1a 64 test vectors
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a(b"foobar"), 0x8594_4171_f739_67e8);

        let fingerprint = two_row_bridge().fingerprint().unwrap();
        assert_eq!(fingerprint.len(), 16);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_validate_rejects_negative_cover() {
        let mut bridge = two_row_bridge();
        assert!(bridge.validate().is_ok());
        bridge.settings.cover_top_mm = -5.0;
        assert!(bridge.validate().is_err());
    }

    #[test]
    fn test_bridge_serialization() {
        let mut bridge = two_row_bridge();
        bridge.meta.build_year = Some(1974);
        let json = serde_json::to_string_pretty(&bridge).unwrap();

        assert!(json.contains("\"2-1\""));
        assert!(json.contains("C30/37"));

        let roundtrip: Bridge = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, bridge);
    }
}
