use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use drc_contain::config::{FileConfig, Overrides, Settings};
use drc_contain::domain::{HazardPolygon, RenderedShape};
use drc_contain::geometry::{Bounds, validate_polygon};
use drc_contain::{ContainmentSimplifier, SimplifyOutcome};
use geo::{Area, MultiPolygon};

/// Shrink a hazard polygon by epsilon and simplify it for publication
///
/// The published polygon never extends outside the true hazard polygon.
///
/// Examples:
///   # Containment figure polygon at the default tolerance
///   drc-contain
///
///   # Tighter tolerance, rings as JSON for plotting
///   drc-contain --eps 0.05 --json > containment.json
///
///   # Hazard polygon from a config file, halving epsilon up to 3 times
///   drc-contain --config closure.toml --retries 3
#[derive(Parser, Debug)]
#[command(name = "drc-contain")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches drc-contain.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tolerance epsilon, in the units of the polygon coordinates
    #[arg(short = 'e', long)]
    eps: Option<f64>,

    /// Longest mitre allowed at reflex corners, as a multiple of epsilon
    #[arg(short = 'm', long)]
    mitre_limit: Option<f64>,

    /// Retry a degenerate result this many times, halving epsilon each time
    #[arg(short = 'r', long)]
    retries: Option<u32>,

    /// Print the true, shrunk and published rings as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// What the rendering side receives
#[derive(Debug, Serialize)]
struct Report {
    epsilon: f64,
    mitre_limit: f64,
    attempts: u32,
    /// Suggested plot extent around the true polygon
    view: Option<Bounds>,
    shapes: Vec<RenderedShape>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if !config_path.exists() {
            bail!("Config file not found: {:?}", config_path);
        }
        Some(FileConfig::from_path(config_path)?)
    } else {
        FileConfig::load()
    };

    let overrides = Overrides {
        epsilon: args.eps,
        mitre_limit: args.mitre_limit,
        retries: args.retries,
        verbose: args.verbose,
    };
    let settings = Settings::resolve(&overrides, file_config);

    let human = !args.json;
    if human {
        println!("drc-contain - Containment-Guaranteeing Polygon Simplifier");
        println!("=========================================================");
        println!();
    }

    if human && settings.verbose {
        println!("Configuration:");
        println!(
            "  Hazard: {}",
            if settings.demo { "demo polygon" } else { "from config" }
        );
        println!("  Epsilon: {}", settings.epsilon);
        println!("  Mitre limit: {}", settings.mitre_limit);
        println!("  Retries: {}", settings.retries);
        println!();
    }

    let truth = settings.hazard.to_geo();

    // Only for the report; every simplify attempt validates again before
    // touching the geometry.
    let spinner = create_spinner("Validating hazard polygon...");
    let start = Instant::now();
    let report = validate_polygon(&truth);
    let summary = report.summary();
    report
        .into_result()
        .context("Hazard polygon failed validation")?;
    spinner.finish_with_message(format!(
        "{} [{:.1}ms]",
        summary,
        start.elapsed().as_secs_f64() * 1000.0
    ));

    let spinner = create_spinner("Shrinking and simplifying...");
    let start = Instant::now();
    let (outcome, attempts) = simplify_with_retries(
        &settings.hazard,
        settings.epsilon,
        settings.mitre_limit,
        settings.retries,
    )?;

    let published = match outcome {
        SimplifyOutcome::Simplified(published) => published,
        SimplifyOutcome::Degenerate(degenerate) => {
            spinner.finish_and_clear();
            bail!(
                "No safe simplified polygon at epsilon {} after {} attempt(s): {}. \
                 Reduce --eps or allow --retries; refusing to publish",
                degenerate.epsilon,
                attempts,
                degenerate.reason
            );
        }
    };
    spinner.finish_with_message(format!(
        "Published {} vertices at epsilon {} ({} attempt(s)) [{:.1}ms]",
        published.vertex_count(),
        published.epsilon(),
        attempts,
        start.elapsed().as_secs_f64() * 1000.0
    ));

    let truth_shape = MultiPolygon(vec![truth]);
    if args.json {
        let report = Report {
            epsilon: published.epsilon(),
            mitre_limit: settings.mitre_limit,
            attempts,
            view: Bounds::from_shape(&truth_shape).map(|b| b.padded(0.1, 0.0)),
            shapes: vec![
                RenderedShape::new("true", &truth_shape),
                RenderedShape::new("shrunk", published.intermediate()),
                RenderedShape::new("published", published.shape()),
            ],
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", json);
        return Ok(());
    }

    println!();
    println!("                 vertices        area");
    print_row("True polygon", settings.hazard.vertex_count(), truth_shape.unsigned_area());
    print_row(
        "Shrunk (P - eps)",
        published.intermediate_vertex_count(),
        published.intermediate().unsigned_area(),
    );
    print_row("Published", published.vertex_count(), published.area());
    if let Some(bounds) = published.bounds() {
        println!();
        println!(
            "Published extent: x {:.3}..{:.3}, y {:.3}..{:.3}",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        );
    }
    println!();
    println!(
        "Done! Total time: {:.1}ms",
        total_start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Run the simplifier, halving epsilon after each degenerate result.
///
/// Returns the last outcome and the number of attempts made.
fn simplify_with_retries(
    hazard: &HazardPolygon,
    epsilon: f64,
    mitre_limit: f64,
    retries: u32,
) -> Result<(SimplifyOutcome, u32)> {
    let mut epsilon = epsilon;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let simplifier = ContainmentSimplifier::with_mitre_limit(epsilon, mitre_limit)
            .context("Invalid simplifier parameters")?;
        let outcome = simplifier
            .simplify_hazard(hazard)
            .context("Failed to simplify hazard polygon")?;

        match outcome.degenerate() {
            Some(degenerate) if attempts <= retries => {
                tracing::warn!(
                    epsilon,
                    reason = %degenerate.reason,
                    "degenerate result, halving epsilon"
                );
                epsilon /= 2.0;
            }
            _ => return Ok((outcome, attempts)),
        }
    }
}

fn print_row(label: &str, vertices: usize, area: f64) {
    println!("  {:<16} {:>6} {:>12.4}", label, vertices, area);
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
