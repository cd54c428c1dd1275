//! # deck_core - Slab Bridge Geometry and Validation Engine
//!
//! `deck_core` turns a parametric description of a slab bridge deck into a
//! closed 3D solid, section silhouettes, validated load-zone layouts,
//! per-zone reinforcement layouts, and annotated 2D drawings. All inputs and
//! outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every run recomputes from the bridge snapshot it is given
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: fatal input errors are structured, findings are data
//!
//! ## Quick Start
//!
//! ```rust
//! use deck_core::{calculate, Bridge, EngineConfig};
//! use deck_core::segments::BridgeSegment;
//!
//! let bridge = Bridge::with_segments("Overpass", vec![
//!     BridgeSegment::first(2.0, 8.0, 2.0, 0.6, 0.8),
//!     BridgeSegment::next(2.0, 8.0, 2.0, 0.6, 0.8, 12.5),
//! ]);
//!
//! let result = calculate(&bridge, &EngineConfig::default()).unwrap();
//! assert!(result.geometry.solid.is_closed());
//! ```
//!
//! ## Modules
//!
//! - [`segments`] - Segment table rows and derived positions
//! - [`cross_sections`] - Named cross-sections D1..D15
//! - [`geometry`] - Zone blocks, the deck solid, and plane cuts
//! - [`load_zones`] - Load-zone stacking and width checks
//! - [`reinforcement`] - Zone identifiers, bar layouts, bend radius checks
//! - [`view`] - Plan, longitudinal and cross-section drawings
//! - [`engine`] - The full pipeline
//! - [`bridge`] - Bridge container, metadata, and settings
//! - [`config`] - Engine configuration
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves

pub mod bridge;
pub mod config;
pub mod cross_sections;
pub mod engine;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod load_zones;
pub mod reinforcement;
pub mod segments;
pub mod units;
pub mod view;

// Re-export commonly used types at crate root for convenience
pub use bridge::{Bridge, BridgeMetadata, BridgeSettings};
pub use config::EngineConfig;
pub use engine::{calculate, calculate_with_table, BridgeResult};
pub use errors::{DeckError, DeckResult};
pub use file_io::{load_bridge, load_config, save_bridge};
