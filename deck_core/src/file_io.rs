//! # File I/O Module
//!
//! Reading and writing the files the command line works with:
//! - **Bridge files**: JSON, checked for schema compatibility on load
//! - **Engine config**: TOML, validated on load
//! - **Bend radius tables**: `diameter;radius` CSV
//! - **Results**: any serializable value as pretty JSON
//!
//! Every write is atomic: the data goes to a `.tmp` sibling that is synced
//! and then renamed over the target, so an interrupted write never leaves a
//! truncated file behind.
//!
//! ## Example
//!
//! ```rust,no_run
//! use deck_core::bridge::Bridge;
//! use deck_core::file_io::{load_bridge, save_bridge};
//! use std::path::Path;
//!
//! let bridge = Bridge::new("Overpass A12");
//! save_bridge(&bridge, Path::new("a12.json"))?;
//!
//! let loaded = load_bridge(Path::new("a12.json"))?;
//! assert_eq!(loaded.meta.name, "Overpass A12");
//! # Ok::<(), deck_core::errors::DeckError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::bridge::{Bridge, SCHEMA_VERSION};
use crate::config::EngineConfig;
use crate::errors::{DeckError, DeckResult};
use crate::reinforcement::BendRadiusTable;

fn read_to_string(path: &Path) -> DeckResult<String> {
    fs::read_to_string(path).map_err(|e| DeckError::file_error("read", path.display().to_string(), e.to_string()))
}

/// Write bytes to `path` atomically.
///
/// 1. Write to `<path>.tmp`
/// 2. Sync to disk (fsync)
/// 3. Rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> DeckResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut tmp_file = File::create(tmp_path).map_err(|e| {
        DeckError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(bytes).map_err(|e| {
        DeckError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        DeckError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        DeckError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

/// Serialize any value to pretty JSON and write it atomically.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> DeckResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DeckError::serialization(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Save a bridge with atomic write semantics.
///
/// # Example
///
/// ```rust,no_run
/// use deck_core::bridge::Bridge;
/// use deck_core::file_io::save_bridge;
/// use std::path::Path;
///
/// save_bridge(&Bridge::new("Overpass"), Path::new("overpass.json"))?;
/// # Ok::<(), deck_core::errors::DeckError>(())
/// ```
pub fn save_bridge(bridge: &Bridge, path: &Path) -> DeckResult<()> {
    write_json(bridge, path)
}

/// Load a bridge from a JSON file.
///
/// # Returns
///
/// * `Ok(Bridge)` - Successfully loaded bridge
/// * `Err(DeckError::VersionMismatch)` - File version is incompatible
/// * `Err(DeckError::SerializationError)` - Invalid JSON
/// * `Err(DeckError::FileError)` - I/O error
pub fn load_bridge(path: &Path) -> DeckResult<Bridge> {
    let contents = read_to_string(path)?;
    let bridge: Bridge = serde_json::from_str(&contents)
        .map_err(|e| DeckError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?;

    validate_version(&bridge.meta.version)?;

    tracing::info!(
        path = %path.display(),
        name = %bridge.meta.name,
        rows = bridge.segments.len(),
        "Loaded bridge"
    );
    Ok(bridge)
}

/// Load and validate an engine configuration from TOML.
pub fn load_config(path: &Path) -> DeckResult<EngineConfig> {
    let contents = read_to_string(path)?;
    EngineConfig::from_toml_str(&contents).map_err(|e| match e {
        DeckError::ConfigError { reason } => DeckError::config_error(format!("{}: {}", path.display(), reason)),
        other => other,
    })
}

/// Load a bend radius table from `diameter;radius` CSV.
pub fn load_bend_table(path: &Path) -> DeckResult<BendRadiusTable> {
    let contents = read_to_string(path)?;
    let table = BendRadiusTable::from_csv_str(&contents)?;
    tracing::debug!(path = %path.display(), entries = table.len(), "Loaded bend radius table");
    Ok(table)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> DeckResult<()> {
    let mismatch = || DeckError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |version: &str| -> Option<Vec<u32>> { version.split('.').map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;
    let current_parts = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor may contain breaking changes
    if current_parts[0] == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::BridgeSegment;
    use std::env::temp_dir;
    use std::path::PathBuf;

    fn temp_path(name: &str, extension: &str) -> PathBuf {
        temp_dir().join(format!("deckform_test_{}_{}.{}", name, std::process::id(), extension))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip", "json");

        let bridge = Bridge::with_segments(
            "Roundtrip",
            vec![
                BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
                BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
            ],
        );
        save_bridge(&bridge, &path).unwrap();

        let loaded = load_bridge(&path).unwrap();
        assert_eq!(loaded, bridge);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_path("atomic", "json");
        let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));

        save_bridge(&Bridge::new("Atomic"), &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_bridge(Path::new("/nonexistent/deckform/bridge.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let path = temp_path("newer", "json");
        let mut bridge = Bridge::new("Future");
        bridge.meta.version = "0.9.0".to_string();
        write_json(&bridge, &path).unwrap();

        let err = load_bridge(&path).unwrap_err();
        assert!(matches!(err, DeckError::VersionMismatch { .. }));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_config_and_bend_table() {
        let config_path = temp_path("config", "toml");
        fs::write(&config_path, "rebar_sections = 24\n").unwrap();
        assert_eq!(load_config(&config_path).unwrap().rebar_sections, 24);

        fs::write(&config_path, "rebar_sections = 1\n").unwrap();
        match load_config(&config_path) {
            Err(DeckError::ConfigError { reason }) => assert!(reason.contains("rebar_sections")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }

        let table_path = temp_path("bends", "csv");
        fs::write(&table_path, "diameter;radius\n12;24\n40;140\n").unwrap();
        let table = load_bend_table(&table_path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.min_radius_mm(40.0), Some(140.0));

        let _ = fs::remove_file(&config_path);
        let _ = fs::remove_file(&table_path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("").is_err());
        assert!(validate_version("abc").is_err());
    }
}
