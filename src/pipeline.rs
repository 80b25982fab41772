//! ═══════════════════════════════════════════════════════════════════════════════
//! PIPELINE — Full Falsification Run
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Corpus → correlation → null models → calibration → ablation → search →
//! verdict. Every routine's outcome is kept, failures included, so the report
//! shows exactly which inputs each criterion saw.
//!
//! Each resampling routine draws from its own seed derived from the master
//! seed, so adding a routine never shifts another's random stream.
//! ═══════════════════════════════════════════════════════════════════════════════

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::ablation::{
    axis_ablation, axis_ablation_weighted, compare_to_baseline, coordinate_sensitivity_with,
    dimensionality_search_with, optimal_weights_from, AblationReport, BaselineComparison,
    OptimalWeights, SearchOptions, SearchProgress, SearchReport, SensitivityReport,
};
use crate::calibration::{
    calibrate_corpus, cross_validate, holdout_all_traditions, CalibrationResult,
    CrossValidationReport, HoldoutSweep,
};
use crate::config::AnalysisConfig;
use crate::engine::{
    correlate, per_axis_correlation, Corpus, CorpusSummary, CorrelationReport, DistanceMetric,
    PerAxisReport,
};
use crate::error::MythosResult;
use crate::outcome::{try_analysis, Analysis};
use crate::significance::{
    bootstrap_ci_with, effect_size_with, mantel_test_with, permutation_test_with,
    tradition_significance, BootstrapReport, EffectSize, MantelReport, PermutationReport,
    TraditionReport,
};
use crate::snapshot::Snapshot;
use crate::trials::derive_seed;
use crate::verdict::{
    synthesize_verdict, synthesize_with_optimized, OptimizedInputs, VerdictInputs, VerdictReport,
};

/// Weighted-model analyses, present when optimal weights were derived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedModel {
    pub weights: OptimalWeights,
    pub ablation: Analysis<AblationReport>,
    pub baseline: Analysis<BaselineComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub config: AnalysisConfig,
    pub corpus: CorpusSummary,

    pub correlation: Analysis<CorrelationReport>,
    pub per_axis: Analysis<PerAxisReport>,

    pub permutation: Analysis<PermutationReport>,
    pub mantel: Analysis<MantelReport>,
    pub bootstrap: Analysis<BootstrapReport>,
    pub effect_size: Analysis<EffectSize>,
    pub traditions: TraditionReport,

    pub calibration: Analysis<CalibrationResult>,
    pub cross_validation: Analysis<CrossValidationReport>,
    pub holdout: HoldoutSweep,

    pub ablation: Analysis<AblationReport>,
    pub sensitivity: Analysis<SensitivityReport>,
    pub baseline: Analysis<BaselineComparison>,
    pub optimal_weights: Analysis<OptimalWeights>,
    pub optimized: Option<OptimizedModel>,

    pub search: Analysis<SearchReport>,

    pub verdict: VerdictReport,
}

/// Seeds for each resampling routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineSeeds {
    pub permutation: u64,
    pub mantel: u64,
    pub bootstrap: u64,
    pub sensitivity: u64,
    pub cross_validation: u64,
}

impl RoutineSeeds {
    pub fn derive(master: u64) -> Self {
        Self {
            permutation: derive_seed(master, "permutation"),
            mantel: derive_seed(master, "mantel"),
            bootstrap: derive_seed(master, "bootstrap"),
            sensitivity: derive_seed(master, "sensitivity"),
            cross_validation: derive_seed(master, "cross_validation"),
        }
    }
}

/// Run every routine on a built corpus
pub fn run_analysis(corpus: &Corpus, config: &AnalysisConfig) -> FullReport {
    let seeds = RoutineSeeds::derive(config.seed);
    let sig = &config.significance;
    info!(
        pairs = corpus.len(),
        seed = config.seed,
        parallel = config.parallel,
        "starting falsification run"
    );

    // ═══ Correlation & null models ═══
    let correlation = correlate(corpus);
    let per_axis = per_axis_correlation(corpus, config.method);
    let permutation = permutation_test_with(
        corpus,
        sig.permutation_trials,
        seeds.permutation,
        config.method,
        config.parallel,
    );
    let mantel = mantel_test_with(corpus, sig.mantel_trials, seeds.mantel, config.parallel);
    let bootstrap = bootstrap_ci_with(
        corpus,
        sig.bootstrap_resamples,
        sig.confidence,
        seeds.bootstrap,
        config.parallel,
    );
    let effect_size = effect_size_with(corpus, config.method);
    let traditions = tradition_significance(corpus, config);
    debug!(
        permutation = permutation.kind(),
        mantel = mantel.kind(),
        "null models complete"
    );

    // ═══ Calibration ═══
    let calibration = calibrate_corpus(corpus, &config.calibration);
    let cross_validation = cross_validate(
        corpus,
        config.calibration.cv_folds,
        seeds.cross_validation,
        &config.calibration,
    );
    let holdout = holdout_all_traditions(corpus, &config.calibration);

    // ═══ Ablation ═══
    let ablation = axis_ablation(corpus, config);
    let sensitivity = coordinate_sensitivity_with(
        corpus,
        config.ablation.noise_sigma,
        config.ablation.noise_trials,
        seeds.sensitivity,
        config.method,
        &config.criteria,
        config.parallel,
    );
    let baseline = compare_to_baseline(corpus, config);
    let optimal_weights = match ablation.success() {
        Some(report) => optimal_weights_from(corpus, report, config),
        None => Analysis::invalid(format!(
            "axis ablation unavailable: {}",
            ablation.reason().unwrap_or("missing")
        )),
    };
    let optimized = optimal_weights.success().map(|w| OptimizedModel {
        weights: w.clone(),
        ablation: axis_ablation_weighted(corpus, &w.weights, config),
        baseline: match baseline.success() {
            Some(b) => Analysis::Success(BaselineComparison::new(w.r_weighted, b.baseline.clone())),
            None => Analysis::invalid("baseline unavailable"),
        },
    });

    // ═══ Search ═══
    let options = SearchOptions {
        min_dims: config.search.min_dims,
        max_dims: config.search.max_dims,
        top_n: config.search.top_n,
        method: config.method,
        parallel: config.parallel,
    };
    let mut log_progress = |p: SearchProgress| {
        debug!(dims = p.dims, done = p.subsets_done, total = p.subsets_total, "search progress");
    };
    let callback: &mut dyn FnMut(SearchProgress) = &mut log_progress;
    let search = dimensionality_search_with(corpus, &options, Some(callback));

    // ═══ Verdict ═══
    let inputs = VerdictInputs {
        permutation: &permutation,
        mantel: &mantel,
        baseline: &baseline,
        ablation: &ablation,
        sensitivity: &sensitivity,
    };
    let verdict = match &optimized {
        Some(model) => synthesize_with_optimized(
            &inputs,
            &OptimizedInputs {
                weights: &model.weights.weights,
                baseline: &model.baseline,
                ablation: &model.ablation,
            },
            &config.criteria,
        ),
        None => synthesize_verdict(&inputs, &config.criteria),
    };

    FullReport {
        generated_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        config: config.clone(),
        corpus: corpus.summary().clone(),
        correlation,
        per_axis,
        permutation,
        mantel,
        bootstrap,
        effect_size,
        traditions,
        calibration,
        cross_validation,
        holdout,
        ablation,
        sensitivity,
        baseline,
        optimal_weights,
        optimized,
        search,
        verdict,
    }
}

/// Build the corpus from a snapshot and run everything on it
pub fn analyze_snapshot(snapshot: &Snapshot, config: &AnalysisConfig) -> Analysis<FullReport> {
    let corpus = try_analysis!(snapshot.build_corpus(DistanceMetric::default()));
    Analysis::Success(run_analysis(&corpus, config))
}

fn r_or_reason<T>(outcome: &Analysis<T>, r: impl Fn(&T) -> f64) -> String {
    match outcome.success() {
        Some(value) => format!("{:+.4}", r(value)),
        None => format!("n/a ({})", outcome.reason().unwrap_or("missing")),
    }
}

impl FullReport {
    pub fn to_file(&self, path: &Path) -> MythosResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// ASCII summary for a terminal
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "═══════════════════════════════════════════════════════════════════════════════")?;
        writeln!(out, "                 ARCHETYPE COORDINATE FALSIFICATION REPORT")?;
        writeln!(out, "═══════════════════════════════════════════════════════════════════════════════")?;
        writeln!(out)?;

        writeln!(out, "┌─ CORPUS ──────────────────────────────────────────────────────────────────────")?;
        writeln!(out, "│ Entities:            {}", self.corpus.n_entities)?;
        writeln!(out, "│ Archetypes:          {}", self.corpus.n_archetypes)?;
        writeln!(out, "│ Pairs:               {}", self.corpus.n_pairs)?;
        writeln!(out, "│ Non-zero pairs:      {}", self.corpus.n_nonzero_pairs)?;
        writeln!(out, "│ Traditions:          {}", self.corpus.traditions.join(", "))?;
        writeln!(out, "└───────────────────────────────────────────────────────────────────────────────")?;
        writeln!(out)?;

        writeln!(out, "┌─ CORRELATION ─────────────────────────────────────────────────────────────────")?;
        writeln!(out, "│ Spearman r:          {}", r_or_reason(&self.correlation, |c| c.spearman_r))?;
        writeln!(out, "│ Pearson r:           {}", r_or_reason(&self.correlation, |c| c.pearson_r))?;
        writeln!(out, "│ Permutation p:       {}", r_or_reason(&self.permutation, |p| p.p_value))?;
        writeln!(out, "│ Mantel r:            {}", r_or_reason(&self.mantel, |m| m.observed_r))?;
        if let Some(b) = self.bootstrap.success() {
            writeln!(
                out,
                "│ Spearman CI:         [{:+.4}, {:+.4}] at {:.0}%",
                b.spearman.lower,
                b.spearman.upper,
                b.confidence * 100.0
            )?;
        }
        if let Some(e) = self.effect_size.success() {
            writeln!(out, "│ Effect size:         {:?} (r² = {:.4})", e.magnitude, e.r_squared)?;
        }
        writeln!(out, "└───────────────────────────────────────────────────────────────────────────────")?;
        writeln!(out)?;

        writeln!(out, "┌─ CALIBRATION ─────────────────────────────────────────────────────────────────")?;
        writeln!(
            out,
            "│ In-sample change:    {}",
            match self.calibration.success().and_then(|c| c.spearman_change()) {
                Some(d) => format!("{:+.4}", d),
                None => "n/a".to_string(),
            }
        )?;
        writeln!(out, "│ CV mean r:           {}", r_or_reason(&self.cross_validation, |c| c.mean_r))?;
        if let Some(m) = self.holdout.mean_improvement {
            writeln!(out, "│ Holdout improvement: {:+.4}", m)?;
        }
        writeln!(out, "└───────────────────────────────────────────────────────────────────────────────")?;
        writeln!(out)?;

        writeln!(out, "┌─ ABLATION ────────────────────────────────────────────────────────────────────")?;
        if let Some(a) = self.ablation.success() {
            for axis in &a.axes {
                let delta = axis
                    .delta
                    .map(|d| format!("{:+.4}", d))
                    .unwrap_or_else(|| "n/a".to_string());
                writeln!(out, "│ {:<28} Δ {:>8}  {:?}", axis.axis.name(), delta, axis.impact)?;
            }
        } else {
            writeln!(out, "│ n/a ({})", self.ablation.reason().unwrap_or("missing"))?;
        }
        writeln!(out, "│ Robustness:          {}", r_or_reason(&self.sensitivity, |s| s.robustness))?;
        if let Some(s) = self.search.success() {
            if let Some(best) = &s.best {
                let names: Vec<&str> = best.axes.iter().map(|a| a.name()).collect();
                writeln!(out, "│ Best subset:         {:+.4} [{}]", best.r, names.join(", "))?;
            }
        }
        writeln!(out, "└───────────────────────────────────────────────────────────────────────────────")?;
        writeln!(out)?;

        writeln!(out, "┌─ CRITERIA ────────────────────────────────────────────────────────────────────")?;
        for c in &self.verdict.criteria {
            let mark = if c.passed { "PASS" } else { "FAIL" };
            writeln!(out, "│ [{}] {}", mark, c.name)?;
            writeln!(out, "│        {}", c.evidence)?;
        }
        writeln!(out, "└───────────────────────────────────────────────────────────────────────────────")?;
        writeln!(out)?;

        writeln!(out, "═══════════════════════════════════════════════════════════════════════════════")?;
        writeln!(out, "  VERDICT: {}", self.verdict.summary)?;
        writeln!(out, "  {}", self.verdict.verdict.description())?;
        if let Some(opt) = &self.verdict.optimized {
            writeln!(
                out,
                "  Optimized weights: {} ({}/4, change {:+})",
                opt.verdict, opt.n_passed, opt.pass_change
            )?;
        }
        writeln!(out, "═══════════════════════════════════════════════════════════════════════════════")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{planted_corpus, planted_snapshot};
    use crate::verdict::Verdict;

    fn quick_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.significance.permutation_trials = 100;
        config.significance.mantel_trials = 100;
        config.significance.bootstrap_resamples = 100;
        config.ablation.noise_trials = 50;
        config.ablation.baseline_trials = 20;
        config.calibration.max_steps = 30;
        config.calibration.cv_folds = 3;
        config.search.max_dims = 4;
        config
    }

    #[test]
    fn test_routine_seeds_distinct() {
        let s = RoutineSeeds::derive(42);
        let all = [s.permutation, s.mantel, s.bootstrap, s.sensitivity, s.cross_validation];
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j]);
            }
        }
    }

    #[test]
    fn test_planted_corpus_full_run() {
        let corpus = planted_corpus(24, 11);
        let report = run_analysis(&corpus, &quick_config());
        assert!(report.correlation.success().unwrap().spearman_r < -0.5);
        assert!(report.permutation.success().unwrap().p_value < 0.05);
        assert_eq!(report.verdict.criteria.len(), 4);
        assert!(report.verdict.criteria[0].passed);
        assert!(report.verdict.criteria[3].passed);
        assert!(matches!(
            report.verdict.verdict,
            Verdict::Survives | Verdict::MostlySurvives | Verdict::PartiallySurvives
        ));
        assert!(report.optimized.is_some());
        assert!(report.verdict.optimized.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["verdict"]["verdict"].is_string());
        assert_eq!(json["corpus"]["n_pairs"], 276);
    }

    #[test]
    fn test_render_writes_to_buffer() {
        let report = run_analysis(&planted_corpus(12, 4), &quick_config());
        let mut buf: Vec<u8> = Vec::new();
        report.render(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("ARCHETYPE COORDINATE FALSIFICATION REPORT"));
        assert!(text.contains("Entities:            12"));
        assert!(text.contains(&format!("VERDICT: {}", report.verdict.summary)));
        assert_eq!(text.matches("[PASS]").count() + text.matches("[FAIL]").count(), 4);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let corpus = planted_corpus(15, 3);
        let mut serial = quick_config();
        serial.parallel = false;
        serial.calibration.parallel = false;
        let mut parallel = quick_config();
        parallel.parallel = true;
        parallel.calibration.parallel = true;

        let a = run_analysis(&corpus, &serial);
        let b = run_analysis(&corpus, &parallel);
        assert_eq!(a.permutation, b.permutation);
        assert_eq!(a.mantel, b.mantel);
        assert_eq!(a.bootstrap, b.bootstrap);
        assert_eq!(a.sensitivity, b.sensitivity);
        assert_eq!(a.search, b.search);
        assert_eq!(a.verdict.n_passed, b.verdict.n_passed);
    }

    #[test]
    fn test_snapshot_too_small() {
        let snapshot = planted_snapshot(4, 1);
        let outcome = analyze_snapshot(&snapshot, &quick_config());
        assert_eq!(outcome.kind(), "insufficient_data");
    }
}
