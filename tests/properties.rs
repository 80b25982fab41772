//! Properties every run must satisfy, independent of the corpus.
//!
//! Run with: cargo test --test properties

use proptest::prelude::*;

use mythos::ablation::{
    axis_ablation, compare_to_baseline, coordinate_sensitivity, dimensionality_search,
    optimal_weights_from,
};
use mythos::calibration::{calibrate_corpus, cross_validate, fold_assignment, CalibrationState};
use mythos::config::{AnalysisConfig, CalibrationConfig};
use mythos::engine::{
    correlate, CooccurrenceTable, CoordinateVector, CorpusBuilder, DistanceMetric,
    EntityArchetypeBinding, N_AXES,
};
use mythos::significance::{benjamini_hochberg, bonferroni, permutation_test, permutation_test_with};
use mythos::stats::CorrelationMethod;
use mythos::synthetic::{planted_corpus, planted_snapshot};

// ═══════════════════════════════════════════════════════════════════════════════
// DETERMINISM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn identical_seeds_identical_p_values() {
    let corpus = planted_corpus(12, 5);
    let a = permutation_test(&corpus, 200, 77).into_success().unwrap();
    let b = permutation_test(&corpus, 200, 77).into_success().unwrap();
    assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
    assert_eq!(a.null, b.null);
}

#[test]
fn parallel_trials_match_serial() {
    let corpus = planted_corpus(14, 8);
    let serial =
        permutation_test_with(&corpus, 150, 3, CorrelationMethod::Spearman, false);
    let parallel =
        permutation_test_with(&corpus, 150, 3, CorrelationMethod::Spearman, true);
    assert_eq!(serial, parallel);

    let mut serial_cfg = CalibrationConfig::default();
    serial_cfg.parallel = false;
    serial_cfg.chunk_size = 7;
    serial_cfg.max_steps = 20;
    let mut parallel_cfg = serial_cfg.clone();
    parallel_cfg.parallel = true;
    assert_eq!(
        calibrate_corpus(&corpus, &serial_cfg),
        calibrate_corpus(&corpus, &parallel_cfg)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALIBRATION BOUNDS
// ═══════════════════════════════════════════════════════════════════════════════

fn within_bounds(original: &[CoordinateVector], current: &[CoordinateVector], max_shift: f64) -> bool {
    original.iter().zip(current).all(|(o, c)| {
        o.values().iter().zip(c.values()).all(|(a, b)| {
            (0.0..=1.0).contains(b) && (a - b).abs() <= max_shift + 1e-12
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_gradient_steps_respect_clamps(
        start in prop::collection::vec(prop::array::uniform8(0.0f64..=1.0), 1..6),
        grads in prop::collection::vec(prop::array::uniform8(-50.0f64..50.0), 1..20),
        lr in 0.0001f64..10.0,
        max_shift in 0.0f64..0.5,
    ) {
        let original: Vec<CoordinateVector> =
            start.iter().map(|v| CoordinateVector::clamped(*v)).collect();
        let mut state = CalibrationState::new(original.clone(), max_shift);
        for g in &grads {
            let gradient = vec![*g; original.len()];
            state.apply_gradient(&gradient, lr);
        }
        prop_assert!(within_bounds(&original, &state.current(), max_shift));
        prop_assert!(state.max_displacement() <= max_shift + 1e-12);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_calibrated_coordinates_stay_bounded(
        lr in 0.001f64..5.0,
        steps in 1usize..40,
        max_shift in 0.01f64..0.3,
        seed in 0u64..1000,
    ) {
        let corpus = planted_corpus(8, seed);
        let config = CalibrationConfig {
            learning_rate: lr,
            max_steps: steps,
            max_shift,
            parallel: false,
            ..CalibrationConfig::default()
        };
        let result = calibrate_corpus(&corpus, &config).into_success().unwrap();
        let original: Vec<CoordinateVector> = result.original.iter().map(|a| a.coordinates).collect();
        let calibrated: Vec<CoordinateVector> =
            result.calibrated.iter().map(|a| a.coordinates).collect();
        prop_assert!(within_bounds(&original, &calibrated, max_shift));
        prop_assert!(result.descent.steps <= steps);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ABLATION / SEARCH CONSISTENCY
// ═══════════════════════════════════════════════════════════════════════════════

/// Co-occurrence driven by axes 0..7 only; axis 7 is noise
fn noisy_axis_corpus() -> mythos::engine::Corpus {
    use rand::{Rng, SeedableRng};
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(19);
    let points: Vec<[f64; N_AXES]> = (0..18)
        .map(|_| {
            let mut v = [0.0; N_AXES];
            for x in v.iter_mut() {
                *x = rng.gen::<f64>();
            }
            v
        })
        .collect();
    let bindings: Vec<EntityArchetypeBinding> = points
        .iter()
        .enumerate()
        .map(|(i, v)| {
            EntityArchetypeBinding::new(&format!("e{}", i), &format!("a{}", i), CoordinateVector::clamped(*v))
        })
        .collect();
    let mut table = CooccurrenceTable::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d2: f64 = (0..7).map(|k| (points[i][k] - points[j][k]).powi(2)).sum();
            let count = (40.0 * (-2.0 * d2.sqrt()).exp()).round() as u64;
            table.add(&format!("e{}", i), &format!("e{}", j), count);
        }
    }
    CorpusBuilder::new(&table).build(&bindings).into_success().unwrap()
}

#[test]
fn harmful_axes_equal_forced_zero_weights() {
    let config = AnalysisConfig::default();
    for corpus in [planted_corpus(16, 2), noisy_axis_corpus()] {
        let ablation = axis_ablation(&corpus, &config).into_success().unwrap();
        let weights = optimal_weights_from(&corpus, &ablation, &config)
            .into_success()
            .unwrap();
        let mut harmful = ablation.harmful.clone();
        harmful.sort();
        let mut forced = weights.forced_zero.clone();
        forced.sort();
        assert_eq!(harmful, forced);
        for axis in &forced {
            assert_eq!(weights.weights.get(*axis), 0.0);
        }
    }
}

#[test]
fn full_subset_equals_correlate() {
    for (n, seed) in [(12, 1), (20, 9), (15, 33)] {
        let corpus = planted_corpus(n, seed);
        let search = dimensionality_search(&corpus, 8, 8).into_success().unwrap();
        let full = correlate(&corpus).into_success().unwrap();
        let best = search.best.unwrap();
        assert_eq!(best.axes.len(), 8);
        assert_eq!(best.r, full.spearman_r);
    }
}

#[test]
fn cosine_routines_judge_the_same_model() {
    let config = AnalysisConfig::default();
    for (n, seed) in [(20, 7), (14, 3)] {
        let corpus = planted_snapshot(n, seed)
            .build_corpus(DistanceMetric::Cosine)
            .into_success()
            .unwrap();
        let full = correlate(&corpus).into_success().unwrap();
        let search = dimensionality_search(&corpus, 8, 8).into_success().unwrap();
        let ablation = axis_ablation(&corpus, &config).into_success().unwrap();
        let baseline = compare_to_baseline(&corpus, &config).into_success().unwrap();
        assert_eq!(search.best.unwrap().r, full.spearman_r);
        assert_eq!(ablation.r_full, full.spearman_r);
        assert_eq!(baseline.model_r, full.spearman_r);

        let weights = optimal_weights_from(&corpus, &ablation, &config)
            .into_success()
            .unwrap();
        assert_eq!(weights.r_uniform, full.spearman_r);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLANTED SIGNAL & SMALL INPUTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn planted_twenty_entities_significant_and_robust() {
    let corpus = planted_corpus(20, 42);
    let perm = permutation_test(&corpus, 500, 1).into_success().unwrap();
    assert!(perm.p_value < 0.05, "p = {}", perm.p_value);
    let sens = coordinate_sensitivity(&corpus, 0.05, 200, 2).into_success().unwrap();
    assert!(sens.robustness > 0.95, "robustness = {}", sens.robustness);
}

#[test]
fn nine_pairs_reports_insufficient() {
    let corpus = planted_corpus(5, 1);
    let nine: Vec<usize> = (0..9).collect();
    let small = corpus.with_pairs(&nine);
    let json = serde_json::to_value(correlate(&small)).unwrap();
    assert_eq!(json["error"], "Insufficient pairs");
}

// ═══════════════════════════════════════════════════════════════════════════════
// MULTIPLE COMPARISONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn bonferroni_and_bh_on_three_tests() {
    let family = [("a", 0.01), ("b", 0.04), ("c", 0.5)];
    let bonf = bonferroni(&family, 0.05).into_success().unwrap();
    let bh = benjamini_hochberg(&family, 0.05).into_success().unwrap();
    assert_eq!(bonf.n_significant, 1);
    assert_eq!(bonf.significant_names(), vec!["a"]);
    assert!(bh.n_significant >= bonf.n_significant);
}

proptest! {
    #[test]
    fn prop_bh_rejects_superset_of_bonferroni(
        ps in prop::collection::vec(0.0f64..=1.0, 1..30),
        alpha in 0.001f64..0.2,
    ) {
        let family: Vec<(String, f64)> =
            ps.iter().enumerate().map(|(i, p)| (format!("t{}", i), *p)).collect();
        let bonf = bonferroni(&family, alpha).into_success().unwrap();
        let bh = benjamini_hochberg(&family, alpha).into_success().unwrap();
        for name in bonf.significant_names() {
            prop_assert!(bh.get(name).map(|t| t.significant).unwrap_or(false));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CROSS-VALIDATION PARTITION
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_folds_partition_pairs(n in 10usize..300, k in 2usize..12, seed in any::<u64>()) {
        prop_assume!(k <= n);
        let folds = fold_assignment(n, k, seed);
        prop_assert_eq!(folds.len(), n);
        let mut sizes = vec![0usize; k];
        for f in &folds {
            prop_assert!(*f < k);
            sizes[*f] += 1;
        }
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        prop_assert!(max - min <= 1);
    }
}

#[test]
fn cross_validation_folds_cover_every_pair_once() {
    let corpus = planted_corpus(12, 6);
    let config = CalibrationConfig {
        max_steps: 10,
        parallel: false,
        ..CalibrationConfig::default()
    };
    let report = cross_validate(&corpus, 5, 21, &config).into_success().unwrap();
    let tested: usize = report.folds.iter().map(|f| f.n_test).sum();
    assert_eq!(tested, corpus.len());
    for fold in &report.folds {
        assert_eq!(fold.n_train + fold.n_test, corpus.len());
    }
}
