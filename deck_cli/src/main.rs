//! # Deckform CLI Application
//!
//! Runs the full bridge pipeline on a parameter file and prints a report of
//! the derived geometry and every finding, followed by a JSON summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use deck_core::cross_sections::CrossSectionIndex;
use deck_core::file_io::{load_bend_table, load_bridge, load_config, write_json};
use deck_core::reinforcement::BendRadiusTable;
use deck_core::units::{Meters, Millimeters};
use deck_core::view::Drawing;
use deck_core::{calculate_with_table, Bridge, BridgeResult, DeckError, DeckResult, EngineConfig};

/// Slab bridge geometry and validation
#[derive(Parser, Debug)]
#[command(name = "deck_cli")]
#[command(about = "Build the deck solid, check load zones and reinforcement, and project drawings")]
struct Args {
    /// Bridge parameter file (JSON)
    input: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Bend radius table (`diameter;radius` CSV) replacing the built-in one
    #[arg(long)]
    bend_table: Option<PathBuf>,

    /// Write the full result as JSON to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Cross-section to draw: a name like D3 or a position x in meters
    #[arg(long)]
    cross_section: Option<String>,

    /// Lateral offset of the longitudinal section (m)
    #[arg(long, allow_hyphen_values = true)]
    longitudinal_y: Option<f64>,

    /// Level of an additional horizontal section (m)
    #[arg(long, allow_hyphen_values = true)]
    horizontal_z: Option<f64>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON summary printed after the report
#[derive(Serialize)]
struct Summary<'a> {
    name: &'a str,
    fingerprint: &'a str,
    passes: bool,
    cross_sections: usize,
    spans: usize,
    slab_volume_m3: f64,
    bar_count: usize,
    findings: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> DeckResult<()> {
    let mut bridge = load_bridge(&args.input)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let bend_table = match &args.bend_table {
        Some(path) => load_bend_table(path)?,
        None => BendRadiusTable::builtin().clone(),
    };

    apply_view_overrides(args, &mut bridge)?;

    let result = calculate_with_table(&bridge, &config, &bend_table)?;
    print_report(&bridge, &result);

    let findings = result.warnings();
    let summary = Summary {
        name: &bridge.meta.name,
        fingerprint: &result.fingerprint,
        passes: result.passes(),
        cross_sections: result.cross_sections.len(),
        spans: bridge.segments.span_count(),
        slab_volume_m3: result.geometry.slab_volume(),
        bar_count: result.geometry.bar_count,
        findings,
    };
    println!();
    println!("JSON Output:");
    let json = serde_json::to_string_pretty(&summary).map_err(|e| DeckError::serialization(e.to_string()))?;
    println!("{}", json);

    if let Some(path) = &args.output {
        write_json(&result, path)?;
        tracing::info!(path = %path.display(), "Wrote result");
    }
    Ok(())
}

/// Command-line section positions take precedence over the ones stored in the file.
fn apply_view_overrides(args: &Args, bridge: &mut Bridge) -> DeckResult<()> {
    if let Some(selector) = &args.cross_section {
        bridge.view.cross_section_x = resolve_cross_section(selector, bridge)?;
    }
    if let Some(y) = args.longitudinal_y {
        bridge.view.longitudinal_section_y = y;
    }
    if let Some(z) = args.horizontal_z {
        bridge.view.horizontal_section_z = Some(z);
    }
    Ok(())
}

fn resolve_cross_section(selector: &str, bridge: &Bridge) -> DeckResult<f64> {
    if let Ok(x) = selector.parse::<f64>() {
        return Ok(x);
    }
    let index = CrossSectionIndex::build(&bridge.segments)?;
    index.by_name(selector).map(|section| section.position).ok_or_else(|| {
        DeckError::invalid_input(
            "cross_section",
            selector,
            format!("Expected a position or one of D1..D{}", index.len()),
        )
    })
}

fn print_report(bridge: &Bridge, result: &BridgeResult) {
    let settings = &bridge.settings;

    println!("═══════════════════════════════════════");
    println!("  {}", bridge.meta.name);
    println!("═══════════════════════════════════════");
    println!();
    println!("Deck:");
    println!("  Length:          {}", Meters(bridge.segments.total_length()));
    println!("  Spans:           {}", bridge.segments.span_count());
    println!("  Slab volume:     {:.3} m³", result.geometry.slab_volume());
    println!("  Cover top/bot:   {} / {}", Millimeters(settings.cover_top_mm), Millimeters(settings.cover_bottom_mm));
    println!("  Mesh:            {} vertices, {} faces", result.geometry.solid.vertex_count(), result.geometry.solid.face_count());
    if result.geometry.bar_count > 0 {
        println!("  Bar solids:      {}", result.geometry.bar_count);
    }
    println!();

    println!("Cross-sections:");
    for check in &result.load_zones.sections {
        println!(
            "  {:<4} width {:>8}  zones {:>8}  {}",
            check.name,
            Meters(check.deck_width).to_string(),
            Meters(check.explicit_sum).to_string(),
            status_icon(!check.overflow)
        );
    }
    if let Some(message) = result.cross_sections.truncation_message() {
        println!("  {}", message);
    }
    println!();

    println!("Load zones:");
    for check in &result.load_zones.zones {
        println!(
            "  {:>2}. {:<12} {}",
            check.zone_index + 1,
            check.zone_type.display_name(),
            status_icon(!check.exceeds_limits())
        );
    }
    println!();

    println!("Reinforcement:");
    let flagged = result.reinforcement.non_compliant();
    println!(
        "  {} zones mapped, {} bend checks failed {}",
        result.reinforcement.zones.len(),
        flagged.len(),
        status_icon(flagged.is_empty())
    );
    println!();

    println!("Drawings:");
    for drawing in result.views.all() {
        print_drawing(drawing);
    }

    let findings = result.warnings();
    println!();
    println!("═══════════════════════════════════════");
    println!(
        "  RESULT: {} ({} finding{})",
        if result.passes() { "PASS" } else { "FAIL" },
        findings.len(),
        if findings.len() == 1 { "" } else { "s" }
    );
    println!("═══════════════════════════════════════");
    for finding in &findings {
        println!("  - {}", finding);
    }
}

fn print_drawing(drawing: &Drawing) {
    println!(
        "  {:<40} {} lines, {} labels, {} markers",
        drawing.title,
        drawing.polylines.len(),
        drawing.labels.len(),
        drawing.markers.len()
    );
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}
