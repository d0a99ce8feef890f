//! Reynolds-stress feasibility and realization through the full pipeline

mod common;

use common::{flat_spectrum, single_point_config};
use turbgen_core::{
    CoherenceConfig, RunConfig, SpectralModel, StressCriterion, StressPair, SynthesisError,
    TurbulenceField, TurbulenceRun, UniformProfile, UniformStress,
};

/// Run a single-point synthesis with stresses given as correlations.
fn run_with_correlations(seed: u64, n_t: usize, r: [f64; 3]) -> turbgen_core::Result<TurbulenceField> {
    run_configured(single_point_config(seed, n_t, 0.1), r)
}

fn run_configured(mut config: RunConfig, r: [f64; 3]) -> turbgen_core::Result<TurbulenceField> {
    config.coherence = CoherenceConfig::None;
    let spectra = flat_spectrum(1.0);
    let run = TurbulenceRun::new(config)?;
    // Equal spectra: every stress maximum is the common variance.
    let variance = spectra
        .spectra(run.grid())?
        .variance(turbgen_core::Component::U, 0);
    let stress = UniformStress {
        upvp: r[0] * variance,
        upwp: r[1] * variance,
        vpwp: r[2] * variance,
    };
    run.synthesize(&spectra, &UniformProfile::streamwise(2.0), &stress)
}

fn correlation(field: &TurbulenceField, pair: StressPair) -> f64 {
    let (a, b) = pair.components();
    let tke = field.tke();
    let n_p = field.grid().n_p();
    field.reynolds_stress(pair)[0] / (tke[a.index() * n_p] * tke[b.index() * n_p]).sqrt()
}

#[test]
fn jointly_infeasible_targets_are_rejected() {
    let err = run_with_correlations(1, 256, [0.9, 0.9, -0.9]).unwrap_err();
    match &err {
        SynthesisError::InfeasibleStress {
            point, criterion, ..
        } => {
            assert_eq!(*point, 0);
            assert_eq!(*criterion, StressCriterion::Sign);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_configuration_error());
}

#[test]
fn correlation_above_one_is_rejected() {
    let err = run_with_correlations(1, 256, [1.2, 0.0, 0.0]).unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::InfeasibleStress {
            criterion: StressCriterion::Magnitude,
            ..
        }
    ));
}

#[test]
fn three_negative_targets_beyond_unit_sum_are_rejected() {
    let err = run_with_correlations(1, 256, [-0.45, -0.45, -0.45]).unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::InfeasibleStress {
            criterion: StressCriterion::NegativeTriple,
            ..
        }
    ));
}

#[test]
fn non_positive_calibration_is_rejected() {
    let mut config = single_point_config(1, 256, 0.1);
    config.stress.phase_lock_calibration = 0.0;
    let err = run_configured(config, [0.1, 0.0, 0.0]).unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::InvalidParameter {
            parameter: "phase_lock_calibration",
            ..
        }
    ));
    assert!(err.is_configuration_error());
}

#[test]
fn realized_correlations_converge_to_targets() {
    let n_realizations = 8;
    for targets in [[0.3, -0.4, 0.0], [0.5, 0.6, 0.3], [-0.3, -0.3, -0.3]] {
        let mut mean = [0.0; 3];
        for seed in 0..n_realizations {
            let field = run_with_correlations(100 + seed, 8192, targets).unwrap();
            for pair in StressPair::ALL {
                mean[pair.index()] += correlation(&field, pair) / n_realizations as f64;
            }
        }
        for pair in StressPair::ALL {
            let (realized, target) = (mean[pair.index()], targets[pair.index()]);
            assert!(
                (realized - target).abs() < 0.03,
                "{targets:?} {}: realized {realized:.4}, target {target}",
                pair.name()
            );
        }
    }
}

#[test]
fn zero_stress_leaves_components_uncorrelated() {
    let field = run_with_correlations(9, 8192, [0.0; 3]).unwrap();
    assert_eq!(field.info().coupling.locked, [0; 4]);
    for pair in StressPair::ALL {
        assert!(correlation(&field, pair).abs() < 0.06);
    }
}
