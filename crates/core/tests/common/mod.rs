//! Shared helpers for the integration suites
#![allow(dead_code)]

use turbgen_core::{GridConfig, RunConfig, SpectralModel};

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Single-point grid with `n_t` steps of `dt`.
pub fn single_point_config(seed: u64, n_t: usize, dt: f64) -> RunConfig {
    RunConfig {
        seed: Some(seed),
        grid: GridConfig {
            n_y: Some(1),
            n_z: Some(1),
            width: Some(0.0),
            height: Some(0.0),
            n_t: Some(n_t),
            time_sec: None,
            dt: Some(dt),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Flat spectrum with zero DC bin, same level for every component.
pub fn flat_spectrum(level: f64) -> impl SpectralModel {
    turbgen_core::FnSpectrum::new(move |_, _, _, _| level)
}
