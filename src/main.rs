//! Camp Placement - Command line validator
//!
//! Loads placed camps and reference layers from GeoJSON, runs a full
//! validation pass and prints the violations, worst first.

use camp_placement::core::error::Result;
use camp_placement::geometry::ingest::{load_entities, load_regions};
use camp_placement::regions::{Layer, ReferenceLayers};
use camp_placement::rules::{load_registry, RuleRegistry};
use camp_placement::validation::EntityReport;
use camp_placement::{PlacementConfig, PlacementSession, Severity};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Validate camp placements against venue rules
#[derive(Parser, Debug)]
#[command(name = "camp-placement")]
#[command(about = "Validate placed camps against fire safety, border and zone rules")]
struct Args {
    /// GeoJSON file with the placed camps (Feature or FeatureCollection)
    #[arg(long)]
    entities: PathBuf,

    /// Reference layer as name=path, e.g. property-border=border.geojson (repeatable)
    #[arg(long = "layer", value_parser = parse_layer_arg)]
    layers: Vec<(Layer, PathBuf)>,

    /// TOML file overriding configuration constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// TOML file with extra rules, layered over the standard set
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Only show camps whose worst violation is at least this severe
    #[arg(long, value_enum, default_value_t = MinSeverity::Low)]
    min_severity: MinSeverity,
}

/// Report threshold accepted by `--min-severity`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum MinSeverity {
    #[default]
    Low,
    Medium,
    High,
}

impl From<MinSeverity> for Severity {
    fn from(min: MinSeverity) -> Self {
        match min {
            MinSeverity::Low => Severity::Low,
            MinSeverity::Medium => Severity::Medium,
            MinSeverity::High => Severity::High,
        }
    }
}

fn parse_layer_arg(raw: &str) -> std::result::Result<(Layer, PathBuf), String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=path, got '{}'", raw))?;
    let layer = name.parse::<Layer>().map_err(|e| e.to_string())?;
    Ok((layer, PathBuf::from(path)))
}

/// JSON output structure
#[derive(Serialize)]
struct Output<'a> {
    entities: usize,
    flagged: usize,
    reports: Vec<NamedReport<'a>>,
}

#[derive(Serialize)]
struct NamedReport<'a> {
    name: String,
    worst: Severity,
    #[serde(flatten)]
    report: &'a EntityReport,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("camp_placement=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PlacementConfig::load(path)?,
        None => PlacementConfig::default(),
    };

    let mut layers = ReferenceLayers::new();
    for (layer, path) in &args.layers {
        let features = load_regions(path)?;
        tracing::info!(
            "Loaded {} features for {} from {}",
            features.len(),
            layer,
            path.display()
        );
        layers.insert(*layer, features);
    }

    let registry = match &args.rules {
        Some(path) => load_registry(path)?,
        None => RuleRegistry::standard(),
    };
    tracing::info!("Validating with {} rules", registry.len());

    let mut session = PlacementSession::new(config, layers, registry)?;
    let entities = load_entities(&args.entities)?;
    tracing::info!("Loaded {} camps from {}", entities.len(), args.entities.display());
    session.load(entities);

    let evaluated = session.drain().await;
    tracing::info!("Validated {} camps", evaluated);

    let threshold = Severity::from(args.min_severity);
    let ranked: Vec<&EntityReport> = session
        .ranked_reports()
        .into_iter()
        .filter(|report| report.worst_severity() >= threshold)
        .collect();

    let name_of = |report: &EntityReport| {
        session
            .entity(report.entity_id)
            .map(|entity| entity.display_name())
            .unwrap_or_else(|| report.entity_id.to_string())
    };

    if args.json {
        let output = Output {
            entities: session.entities().len(),
            flagged: ranked.len(),
            reports: ranked
                .iter()
                .map(|&report| NamedReport {
                    name: name_of(report),
                    worst: report.worst_severity(),
                    report,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("=== CAMP PLACEMENT ===");
    println!(
        "{} camps, {} with violations at {} or above",
        session.entities().len(),
        ranked.len(),
        threshold
    );
    for report in &ranked {
        println!();
        println!("[{}] {}", report.worst_severity(), name_of(report));
        for violation in &report.violations {
            println!(
                "  {:<6} {:<24} {}",
                violation.severity, violation.short_message, violation.message
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_severity_defaults_to_low() {
        let args = Args::try_parse_from(["camp-placement", "--entities", "camps.geojson"]).unwrap();
        assert_eq!(args.min_severity, MinSeverity::Low);
        assert_eq!(Severity::from(args.min_severity), Severity::Low);
    }

    #[test]
    fn test_min_severity_parses_known_levels() {
        let args = Args::try_parse_from([
            "camp-placement",
            "--entities",
            "camps.geojson",
            "--min-severity",
            "high",
        ])
        .unwrap();
        assert_eq!(Severity::from(args.min_severity), Severity::High);
    }

    #[test]
    fn test_unknown_min_severity_rejected() {
        for raw in ["hgih", "none", ""] {
            let parsed = Args::try_parse_from([
                "camp-placement",
                "--entities",
                "camps.geojson",
                "--min-severity",
                raw,
            ]);
            assert!(parsed.is_err(), "accepted '{}'", raw);
        }
    }

    #[test]
    fn test_layer_argument_needs_name_and_path() {
        let (layer, path) = parse_layer_arg("property-border=border.geojson").unwrap();
        assert_eq!(layer, Layer::PropertyBorder);
        assert_eq!(path, PathBuf::from("border.geojson"));
        assert!(parse_layer_arg("border.geojson").is_err());
    }
}
