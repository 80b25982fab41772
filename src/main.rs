//! ═══════════════════════════════════════════════════════════════════════════════
//! MYTHOS — Command Line Entry Point
//! ═══════════════════════════════════════════════════════════════════════════════
//! Single binary, subcommand dispatch. Every command reads one snapshot file
//! and an optional config; results go to stdout or a JSON file.
//! ═══════════════════════════════════════════════════════════════════════════════

#![allow(clippy::too_many_arguments)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mythos::ablation::{
    axis_ablation, compare_to_baseline, coordinate_sensitivity_with, dimensionality_search_with,
    optimal_weights_from, SearchOptions, SearchProgress,
};
use mythos::calibration::{calibrate_corpus, cross_validate, holdout_all_traditions};
use mythos::config::AnalysisConfig;
use mythos::engine::{correlate, per_axis_correlation, Corpus, DistanceMetric};
use mythos::pipeline::{run_analysis, RoutineSeeds};
use mythos::significance::{
    bootstrap_ci_with, effect_size_with, mantel_test_with, permutation_test_with,
    tradition_significance,
};
use mythos::snapshot::Snapshot;
use mythos::synthetic::planted_snapshot;

#[derive(Parser)]
#[command(name = "mythos")]
#[command(about = "Archetype coordinate falsification engine", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every routine and print the falsification verdict
    Analyze {
        /// Snapshot JSON (bindings + co-occurrence)
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis config JSON (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cosine instead of Euclidean pair distances
        #[arg(long)]
        cosine: bool,
    },

    /// Distance / co-occurrence correlation, overall and per axis
    Correlate {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Permutation, Mantel, bootstrap, effect size and per-tradition tests
    Significance {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Calibrate archetype coordinates, then cross-validate and hold out traditions
    Calibrate {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the calibration result here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Axis ablation, coordinate sensitivity, baseline and optimal weights
    Ablation {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Exhaustive search over axis subsets
    Search {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        min_dims: Option<usize>,

        #[arg(long)]
        max_dims: Option<usize>,

        /// Subsets to list
        #[arg(long)]
        top: Option<usize>,
    },

    /// Generate a planted corpus snapshot with a known negative correlation
    Demo {
        /// Number of entities
        #[arg(short, long, default_value = "30")]
        entities: usize,

        /// Random seed for reproducibility
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write the snapshot here instead of analyzing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default config (or validate a given one)
    Config {
        #[arg(short, long)]
        check: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::from_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_corpus(path: &Path, metric: DistanceMetric) -> Result<Corpus> {
    let snapshot = Snapshot::from_file(path)
        .with_context(|| format!("loading snapshot {}", path.display()))?;
    snapshot
        .build_corpus(metric)
        .into_result()
        .with_context(|| format!("building corpus from {}", path.display()))
}

/// Pretty JSON to a file, or to stdout when no path is given
fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(p) => {
            std::fs::write(p, json).with_context(|| format!("writing {}", p.display()))?;
            info!(path = %p.display(), "wrote report");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn banner(title: &str) {
    println!("\x1b[36m═══════════════════════════════════════════════════════════════\x1b[0m");
    println!("\x1b[36m {}\x1b[0m", title);
    println!("\x1b[36m═══════════════════════════════════════════════════════════════\x1b[0m");
    println!();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            cosine,
        } => {
            let config = load_config(config.as_deref())?;
            let metric = if cosine {
                DistanceMetric::Cosine
            } else {
                DistanceMetric::Euclidean
            };
            let corpus = load_corpus(&input, metric)?;
            let report = run_analysis(&corpus, &config);
            report.render(&mut std::io::stdout().lock())?;
            if let Some(p) = output.as_deref() {
                report
                    .to_file(p)
                    .with_context(|| format!("writing {}", p.display()))?;
                info!(path = %p.display(), "wrote report");
            }
            Ok(())
        }

        Commands::Correlate { input, config } => {
            let config = load_config(config.as_deref())?;
            let corpus = load_corpus(&input, DistanceMetric::Euclidean)?;
            let report = serde_json::json!({
                "correlation": correlate(&corpus),
                "per_axis": per_axis_correlation(&corpus, config.method),
            });
            emit(&report, None)
        }

        Commands::Significance {
            input,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let corpus = load_corpus(&input, DistanceMetric::Euclidean)?;
            let seeds = RoutineSeeds::derive(config.seed);
            let sig = &config.significance;
            banner("SIGNIFICANCE — Null Models");
            let report = serde_json::json!({
                "permutation": permutation_test_with(
                    &corpus, sig.permutation_trials, seeds.permutation, config.method, config.parallel),
                "mantel": mantel_test_with(&corpus, sig.mantel_trials, seeds.mantel, config.parallel),
                "bootstrap": bootstrap_ci_with(
                    &corpus, sig.bootstrap_resamples, sig.confidence, seeds.bootstrap, config.parallel),
                "effect_size": effect_size_with(&corpus, config.method),
                "traditions": tradition_significance(&corpus, &config),
            });
            emit(&report, output.as_deref())
        }

        Commands::Calibrate {
            input,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let corpus = load_corpus(&input, DistanceMetric::Euclidean)?;
            let seeds = RoutineSeeds::derive(config.seed);
            banner("CALIBRATION — Coordinate Descent");
            let calibration = calibrate_corpus(&corpus, &config.calibration);
            if let Some(c) = calibration.success() {
                println!(
                    "Steps: {} ({:?}), loss {:.6} → {:.6}, max shift {:.4}",
                    c.descent.steps,
                    c.descent.stop_reason,
                    c.descent.initial_loss,
                    c.descent.final_loss,
                    c.descent.max_displacement
                );
            }
            let report = serde_json::json!({
                "calibration": calibration,
                "cross_validation": cross_validate(
                    &corpus, config.calibration.cv_folds, seeds.cross_validation, &config.calibration),
                "holdout": holdout_all_traditions(&corpus, &config.calibration),
            });
            emit(&report, output.as_deref())
        }

        Commands::Ablation {
            input,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let corpus = load_corpus(&input, DistanceMetric::Euclidean)?;
            let seeds = RoutineSeeds::derive(config.seed);
            banner("ABLATION — Axis Contribution");
            let ablation = axis_ablation(&corpus, &config);
            let weights = ablation
                .success()
                .map(|a| optimal_weights_from(&corpus, a, &config));
            let report = serde_json::json!({
                "ablation": ablation,
                "sensitivity": coordinate_sensitivity_with(
                    &corpus,
                    config.ablation.noise_sigma,
                    config.ablation.noise_trials,
                    seeds.sensitivity,
                    config.method,
                    &config.criteria,
                    config.parallel,
                ),
                "baseline": compare_to_baseline(&corpus, &config),
                "optimal_weights": weights,
            });
            emit(&report, output.as_deref())
        }

        Commands::Search {
            input,
            config,
            min_dims,
            max_dims,
            top,
        } => {
            let config = load_config(config.as_deref())?;
            let corpus = load_corpus(&input, DistanceMetric::Euclidean)?;
            let options = SearchOptions {
                min_dims: min_dims.unwrap_or(config.search.min_dims),
                max_dims: max_dims.unwrap_or(config.search.max_dims),
                top_n: top.unwrap_or(config.search.top_n),
                method: config.method,
                parallel: config.parallel,
            };
            banner("SEARCH — Axis Subsets");
            let mut report_progress = |p: SearchProgress| {
                eprintln!(
                    "  {} dims: {}/{} subsets",
                    p.dims, p.subsets_done, p.subsets_total
                );
            };
            let callback: &mut dyn FnMut(SearchProgress) = &mut report_progress;
            let search = dimensionality_search_with(&corpus, &options, Some(callback));
            emit(&search, None)
        }

        Commands::Demo {
            entities,
            seed,
            output,
        } => {
            let snapshot = planted_snapshot(entities, seed);
            match output {
                Some(p) => {
                    snapshot
                        .to_file(&p)
                        .with_context(|| format!("writing {}", p.display()))?;
                    info!(path = %p.display(), entities, seed, "wrote planted snapshot");
                }
                None => {
                    let config = AnalysisConfig {
                        seed,
                        ..AnalysisConfig::default()
                    };
                    let corpus = snapshot
                        .build_corpus(DistanceMetric::Euclidean)
                        .into_result()
                        .context("building planted corpus")?;
                    run_analysis(&corpus, &config).render(&mut std::io::stdout().lock())?;
                }
            }
            Ok(())
        }

        Commands::Config { check } => match check {
            Some(p) => {
                let config = load_config(Some(&p))?;
                info!(path = %p.display(), seed = config.seed, "config is valid");
                Ok(())
            }
            None => emit(&AnalysisConfig::default(), None),
        },
    }
}
