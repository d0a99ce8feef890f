//! Time-series synthesis
//!
//! For each component the synthesizer assembles the packed cross-spectral
//! matrix of every frequency bin, factors it, applies the factor to that
//! bin's phases and inverse-transforms each point's one-sided spectrum into
//! a real time series.
//!
//! # Parallelism
//!
//! Frequency bins are independent and run on the rayon pool; each worker
//! owns its packed buffers through `map_init`. Points are independent in the
//! inverse transform and run the same way. Phases and stress coupling are
//! complete before the first bin is processed and are only read afterwards.
//!
//! # Normalization
//!
//! Bin `k` of the one-sided spectrum carries `H(f_k) X_k`, with the DC and
//! Nyquist bins zero. The unnormalized inverse real FFT is scaled by
//! `1 / (n_t sqrt(dt / n_f))`, which makes the variance of each series
//! `Σ_{k≥1} S_k df`.

use crate::coherence::{create_coherence, CoherenceModel};
use crate::config::{RunConfig, SynthesisConfig};
use crate::core_types::{Component, N_COMP};
use crate::error::{Result, SynthesisError, ToleranceWarning};
use crate::factor::{create_factorizer, relative_residual, Factorizer};
use crate::grid::Grid;
use crate::output::{RunInfo, TurbulenceField};
use crate::phases::{PhaseField, RandomSource};
use crate::profile::{MeanProfile, ProfileModel};
use crate::spectra::{packed_len, CrossSpectrumBuffer, PackedEntries, SpectralModel, SpectralTensor};
use crate::stress::{CouplingSummary, ReynoldsStress, StressModel};
use rayon::prelude::*;
use realfft::num_complex::Complex64;
use realfft::RealFftPlanner;
use rustc_hash::FxHashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-worker scratch for one frequency bin.
struct BinWorkspace {
    cross: CrossSpectrumBuffer,
    factor: Vec<f64>,
    phases: Vec<Complex64>,
}

impl BinWorkspace {
    fn new(n_p: usize) -> Self {
        Self {
            cross: CrossSpectrumBuffer::new(n_p),
            factor: vec![0.0; packed_len(n_p)],
            phases: vec![Complex64::new(0.0, 0.0); n_p],
        }
    }
}

/// Correlated spectral coefficients of one bin, one per point.
struct BinOutput {
    coefficients: Vec<Complex64>,
    warning: Option<ToleranceWarning>,
}

/// Turbulent fluctuation of the output window, `[comp][point][t]`.
#[derive(Debug, Clone)]
pub struct Fluctuation {
    pub data: Vec<f64>,
    pub warnings: Vec<ToleranceWarning>,
}

/// Spectral-factorization synthesizer for one grid.
pub struct Synthesizer<'a> {
    grid: &'a Grid,
    tensor: &'a SpectralTensor,
    coherence: &'a dyn CoherenceModel,
    factorizer: Box<dyn Factorizer>,
    config: SynthesisConfig,
}

impl<'a> Synthesizer<'a> {
    /// # Errors
    ///
    /// [`SynthesisError::ShapeMismatch`] if `tensor` was not evaluated on
    /// `grid`, [`SynthesisError::InvalidParameter`] for inconsistent residual
    /// bounds.
    pub fn new(
        grid: &'a Grid,
        tensor: &'a SpectralTensor,
        coherence: &'a dyn CoherenceModel,
        config: SynthesisConfig,
    ) -> Result<Self> {
        if tensor.n_p() != grid.n_p() {
            return Err(SynthesisError::shape_mismatch("spectra points", grid.n_p(), tensor.n_p()));
        }
        if tensor.n_f() != grid.n_f() {
            return Err(SynthesisError::shape_mismatch(
                "spectra frequencies",
                grid.n_f(),
                tensor.n_f(),
            ));
        }
        if !(config.residual_tolerance >= 0.0 && config.residual_soft_bound >= config.residual_tolerance)
        {
            return Err(SynthesisError::InvalidParameter {
                parameter: "residual_soft_bound",
                reason: format!(
                    "need 0 <= residual_tolerance ({}) <= residual_soft_bound ({})",
                    config.residual_tolerance, config.residual_soft_bound
                ),
            });
        }
        Ok(Self {
            grid,
            tensor,
            coherence,
            factorizer: create_factorizer(config.factorizer),
            config,
        })
    }

    pub fn factorizer_name(&self) -> &'static str {
        self.factorizer.name()
    }

    /// Synthesize the fluctuation of every component from frozen phases.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::NotPositiveSemiDefinite`] or
    /// [`SynthesisError::ResidualExceeded`] for the failing bin,
    /// [`SynthesisError::ShapeMismatch`] if `phases` does not match the grid.
    pub fn synthesize(&self, phases: &PhaseField) -> Result<Fluctuation> {
        if phases.n_p() != self.grid.n_p() || phases.n_f() != self.grid.n_f() {
            return Err(SynthesisError::shape_mismatch(
                "phases",
                N_COMP * self.grid.n_p() * self.grid.n_f(),
                phases.as_slice().len(),
            ));
        }
        match self.config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| SynthesisError::WorkerPool(e.to_string()))?
                .install(|| self.synthesize_components(phases)),
            None => self.synthesize_components(phases),
        }
    }

    fn synthesize_components(&self, phases: &PhaseField) -> Result<Fluctuation> {
        let n_p = self.grid.n_p();
        let n_t_out = self.grid.n_t_out();
        let mut data = vec![0.0; N_COMP * n_p * n_t_out];
        let mut warnings = Vec::new();

        for comp in Component::ALL {
            let bins = self.correlate_bins(comp, phases)?;
            warnings.extend(bins.iter().filter_map(|b| b.warning));
            let out = &mut data[comp.index() * n_p * n_t_out..(comp.index() + 1) * n_p * n_t_out];
            self.inverse_transform(&bins, out)?;
            debug!("Synthesized component {} ({} bins)", comp, bins.len());
        }

        Ok(Fluctuation { data, warnings })
    }

    /// `H(f_k) X_k` for bins `k = 1..n_f`.
    fn correlate_bins(&self, comp: Component, phases: &PhaseField) -> Result<Vec<BinOutput>> {
        let n_p = self.grid.n_p();
        (1..self.grid.n_f())
            .into_par_iter()
            .map_init(
                || BinWorkspace::new(n_p),
                |ws, k| self.correlate_bin(ws, comp, k, phases),
            )
            .collect()
    }

    fn correlate_bin(
        &self,
        ws: &mut BinWorkspace,
        comp: Component,
        k: usize,
        phases: &PhaseField,
    ) -> Result<BinOutput> {
        let n_p = self.grid.n_p();
        let c = ws
            .cross
            .assemble(self.tensor, self.coherence, comp, k, self.grid.f()[k]);
        self.factorizer
            .factor(c, n_p, &mut ws.factor)
            .map_err(|failure| failure.into_error(comp, k))?;

        let mut warning = None;
        if self.config.verify_factors {
            let residual = relative_residual(c, &ws.factor, n_p);
            if residual > self.config.residual_soft_bound {
                return Err(SynthesisError::ResidualExceeded {
                    component: comp,
                    frequency_index: k,
                    residual,
                    bound: self.config.residual_soft_bound,
                });
            }
            if residual > self.config.residual_tolerance {
                warn!(
                    "Cholesky residual {:.3e} above tolerance for component {} at frequency index {}",
                    residual, comp, k
                );
                warning = Some(ToleranceWarning {
                    component: comp,
                    frequency_index: k,
                    residual,
                });
            }
        }

        phases.column_into(comp, k, &mut ws.phases);
        let mut coefficients = vec![Complex64::new(0.0, 0.0); n_p];
        for (idx, i, j) in PackedEntries::new(n_p) {
            coefficients[i] += ws.phases[j] * ws.factor[idx];
        }
        Ok(BinOutput {
            coefficients,
            warning,
        })
    }

    /// Inverse-transform each point and write its output window into `out`
    /// (`[point][t]`).
    fn inverse_transform(&self, bins: &[BinOutput], out: &mut [f64]) -> Result<()> {
        let n_t = self.grid.n_t();
        let n_f = self.grid.n_f();
        let n_t_out = self.grid.n_t_out();
        let i0 = self.grid.i0_out();
        let scale = 1.0 / (n_t as f64 * (self.grid.dt() / n_f as f64).sqrt());
        let remove_mean = self.config.remove_window_mean;
        let c2r = RealFftPlanner::<f64>::new().plan_fft_inverse(n_t);

        out.par_chunks_mut(n_t_out).enumerate().try_for_each_init(
            || (c2r.make_input_vec(), c2r.make_output_vec(), c2r.make_scratch_vec()),
            |(spectrum, series, scratch), (point, window)| {
                spectrum.fill(Complex64::new(0.0, 0.0));
                for (k, bin) in bins.iter().enumerate() {
                    spectrum[k + 1] = bin.coefficients[point];
                }
                c2r.process_with_scratch(spectrum, series, scratch)
                    .map_err(|e| SynthesisError::Transform(e.to_string()))?;

                for (w, &x) in window.iter_mut().zip(&series[i0..i0 + n_t_out]) {
                    *w = x * scale;
                }
                if remove_mean {
                    let mean = window.iter().sum::<f64>() / n_t_out as f64;
                    window.iter_mut().for_each(|w| *w -= mean);
                }
                Ok(())
            },
        )
    }
}

/// A synthesis run: configuration, run random source and grid.
///
/// The grid (and with it the output window offset) is drawn when the run is
/// created, so collaborators that need the grid, such as an explicit
/// [`crate::coherence::UserCoherence`], can be built before synthesizing.
/// Random draws happen in a fixed order: window offset, phases, stress locks.
pub struct TurbulenceRun {
    config: RunConfig,
    rng: RandomSource,
    grid: Grid,
}

impl TurbulenceRun {
    /// # Errors
    ///
    /// [`SynthesisError::InvalidGrid`] for bad grid parameters.
    pub fn new(config: RunConfig) -> Result<Self> {
        let mut rng = RandomSource::new(config.seed);
        let grid = Grid::new(&config.grid, &mut rng)?;
        Ok(Self { config, rng, grid })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Seed of the run random source.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Synthesize with the configured coherence model.
    ///
    /// # Errors
    ///
    /// Any error from the collaborators or the synthesis itself.
    pub fn synthesize(
        self,
        spectra: &dyn SpectralModel,
        profile: &dyn ProfileModel,
        stress: &dyn StressModel,
    ) -> Result<TurbulenceField> {
        let mean = profile.mean_profile(&self.grid)?;
        let coherence = create_coherence(&self.config.coherence, &self.grid, &mean)?;
        self.run(spectra, mean, stress, coherence.as_ref())
    }

    /// Synthesize with an explicitly constructed coherence model.
    ///
    /// # Errors
    ///
    /// Any error from the collaborators or the synthesis itself.
    pub fn synthesize_with_coherence(
        self,
        spectra: &dyn SpectralModel,
        profile: &dyn ProfileModel,
        stress: &dyn StressModel,
        coherence: &dyn CoherenceModel,
    ) -> Result<TurbulenceField> {
        let mean = profile.mean_profile(&self.grid)?;
        self.run(spectra, mean, stress, coherence)
    }

    fn run(
        self,
        spectra: &dyn SpectralModel,
        mean: MeanProfile,
        stress: &dyn StressModel,
        coherence: &dyn CoherenceModel,
    ) -> Result<TurbulenceField> {
        let Self {
            config,
            mut rng,
            grid,
        } = self;
        let start = Instant::now();

        let tensor = spectra.spectra(&grid)?;
        let synthesizer = Synthesizer::new(&grid, &tensor, coherence, config.synthesis)?;
        info!(
            "Synthesizing {}x{} grid: n_t={} (output {}), n_f={}, seed={}{}, coherence={}, factorizer={}",
            grid.n_z(),
            grid.n_y(),
            grid.n_t(),
            grid.n_t_out(),
            grid.n_f(),
            rng.seed(),
            if rng.is_seeded() { "" } else { " (from entropy)" },
            coherence.name(),
            synthesizer.factorizer_name()
        );

        let stress = ReynoldsStress::from_model(stress, &grid, &tensor)?;
        stress.check_validity()?;
        let mut phases = PhaseField::generate_uniform(grid.n_p(), grid.n_f(), &mut rng);
        let coupling: CouplingSummary = stress.couple_phases(&mut phases, &mut rng, &config.stress)?;

        let fluctuation = synthesizer.synthesize(&phases)?;

        let n_p = grid.n_p();
        let n_t_out = grid.n_t_out();
        let mut velocity = Vec::with_capacity(fluctuation.data.len());
        for comp in Component::ALL {
            for p in 0..n_p {
                let offset = (comp.index() * n_p + p) * n_t_out;
                let u_mean = mean.get(comp, p);
                velocity.extend(
                    fluctuation.data[offset..offset + n_t_out]
                        .iter()
                        .map(|&x| (u_mean + x) as f32),
                );
            }
        }

        if fluctuation.warnings.is_empty() {
            info!("Synthesis complete in {:.2?}", start.elapsed());
        } else {
            let mut degraded: FxHashMap<Component, usize> = FxHashMap::default();
            for w in &fluctuation.warnings {
                *degraded.entry(w.component).or_default() += 1;
            }
            let mut counts: Vec<_> = degraded.into_iter().collect();
            counts.sort();
            warn!(
                "Synthesis complete in {:.2?} with degraded factorizations (bins per component: {:?})",
                start.elapsed(),
                counts
            );
        }

        let info = RunInfo {
            seed: rng.seed(),
            seeded: rng.is_seeded(),
            coherence_model: coherence.name().to_string(),
            factorizer: synthesizer.factorizer_name().to_string(),
            n_t_synth: grid.n_t(),
            i0_out: grid.i0_out(),
            coupling,
        };
        TurbulenceField::new(grid, mean, velocity, info, fluctuation.warnings)
    }
}

/// Run a complete synthesis with the configured coherence model.
///
/// With `config.seed == None` the run is valid but not reproducible; the
/// seed actually used is reported in [`RunInfo::seed`].
///
/// # Errors
///
/// Configuration errors for infeasible grid, coherence, stress or spectra;
/// contract errors for collaborators returning arrays of the wrong shape.
pub fn synthesize(
    config: &RunConfig,
    spectra: &dyn SpectralModel,
    profile: &dyn ProfileModel,
    stress: &dyn StressModel,
) -> Result<TurbulenceField> {
    TurbulenceRun::new(config.clone())?.synthesize(spectra, profile, stress)
}
