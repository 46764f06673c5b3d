//! riskguard CLI
//!
//! `riskguard simulate` drives the breach engine with seeded synthetic
//! measurements, runs escalation sweeps, and prints the resulting board
//! report as JSON.

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{value_parser, Arg, ArgMatches, Command};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riskguard_catalog::{
    CategoryKind, MeasurementFrequency, MetricKey, RiskCategory, ThresholdCatalog,
    ThresholdDefinition,
};
use riskguard_engine::{EngineConfig, Evaluation, Measurement, RiskEngine};
use riskguard_report::{PostureReportBuilder, ReportType, ScoreWeights};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Configuration file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    engine: EngineConfig,
    weights: ScoreWeights,
}

fn cli() -> Command {
    Command::new("riskguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Risk appetite breach and escalation engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Drive the engine with synthetic measurements")
                .arg(
                    Arg::new("metrics")
                        .long("metrics")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Number of configured metrics"),
                )
                .arg(
                    Arg::new("measurements")
                        .long("measurements")
                        .default_value("200")
                        .value_parser(value_parser!(usize))
                        .help("Number of measurements to ingest"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("sweeps")
                        .long("sweeps")
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Escalation sweeps to run after ingestion"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("simulate", sub)) => simulate(sub, config).await,
        _ => unreachable!("subcommand required"),
    }
}

fn load_config(matches: &ArgMatches) -> Result<CliConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(CliConfig::default()),
    }
}

async fn simulate(matches: &ArgMatches, config: CliConfig) -> Result<()> {
    let metrics = *matches.get_one::<usize>("metrics").unwrap_or(&8);
    let measurements = *matches.get_one::<usize>("measurements").unwrap_or(&200);
    let seed = *matches.get_one::<u64>("seed").unwrap_or(&42);
    let sweeps = *matches.get_one::<usize>("sweeps").unwrap_or(&1);

    let mut rng = StdRng::seed_from_u64(seed);
    let catalog = Arc::new(ThresholdCatalog::new());
    let keys = seed_catalog(&catalog, metrics)?;

    // Zero SLA so every unactioned critical breach escalates on sweep.
    let engine_config = config.engine.with_sla_budget(Duration::from_secs(0));
    let engine = RiskEngine::new(engine_config, Arc::clone(&catalog));

    let started = Utc::now();
    let mut breached = 0usize;
    let mut within = 0usize;
    for _ in 0..measurements {
        let key = &keys[rng.gen_range(0..keys.len())];
        // Values centered on the appetite of 100, wandering past both bands.
        let value = 100.0 + rng.gen_range(-40.0..40.0);
        match engine.evaluate(&Measurement::new(key.clone(), value))? {
            Evaluation::Breached { disposition, .. } => {
                breached += 1;
                // An operator resolves roughly a third of breaches.
                if rng.gen_bool(0.33) {
                    let _ = engine.resolve(disposition.breach_id(), "resolved in simulation");
                }
            }
            Evaluation::WithinAppetite { .. } => within += 1,
            Evaluation::SkippedMissingThreshold => {}
        }
    }

    let scheduler = engine.scheduler();
    for _ in 0..sweeps {
        let report = scheduler.sweep_once(Utc::now()).await;
        info!(
            examined = report.examined,
            escalated = report.escalated,
            failed = report.failed,
            "sweep complete"
        );
    }

    info!(
        measurements,
        breached,
        within,
        open = engine.ledger().open_count(),
        gaps = engine.configuration_gaps(),
        "simulation complete"
    );

    let report = PostureReportBuilder::with_weights(config.weights).build(
        engine.ledger(),
        started - ChronoDuration::minutes(1),
        Utc::now(),
        ReportType::Weekly,
    )?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn seed_catalog(catalog: &ThresholdCatalog, metrics: usize) -> Result<Vec<MetricKey>> {
    let kinds = [
        CategoryKind::Operational,
        CategoryKind::Financial,
        CategoryKind::Compliance,
        CategoryKind::Strategic,
    ];
    let categories: Vec<RiskCategory> = kinds
        .iter()
        .map(|kind| RiskCategory::new(format!("{kind} risk"), *kind))
        .collect();
    for category in &categories {
        catalog.register_category(category.clone());
    }

    let mut keys = Vec::with_capacity(metrics);
    for i in 0..metrics {
        let category = &categories[i % categories.len()];
        let key = MetricKey::new(category.id, format!("metric-{i}"));
        catalog.upsert(
            key.clone(),
            ThresholdDefinition::new(100.0, MeasurementFrequency::RealTime, "simulator")
                .with_bands(10.0, 20.0),
        )?;
        keys.push(key);
    }
    Ok(keys)
}
