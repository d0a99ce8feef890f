//! Cholesky backends and packed indexing against dense references

mod common;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use turbgen_core::factor::{relative_residual, DenseFactorizer, PackedFactorizer};
use turbgen_core::spectra::packed::pack_lower;
use turbgen_core::spectra::{packed_index, packed_len, PackedEntries};
use turbgen_core::{Factorizer, Grid, GridConfig, RandomSource};

/// `A Aᵗ` for a random `n x (n + 3)` matrix `A`, packed.
fn random_psd(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let a = DMatrix::from_fn(n, n + 3, |_, _| rng.random_range(-1.0..1.0));
    let c = &a * a.transpose();
    let mut packed = vec![0.0; packed_len(n)];
    pack_lower(&c, &mut packed);
    packed
}

#[test]
fn factors_reconstruct_random_psd_matrices() {
    let mut rng = StdRng::seed_from_u64(2024);
    let backends: [&dyn Factorizer; 2] = [&PackedFactorizer, &DenseFactorizer];
    for n in [1, 2, 3, 7, 16, 33, 50] {
        let c = random_psd(n, &mut rng);
        for backend in backends {
            let mut h = vec![f64::NAN; packed_len(n)];
            backend.factor(&c, n, &mut h).unwrap();
            let residual = relative_residual(&c, &h, n);
            assert!(
                residual < 1e-12,
                "{} backend, n = {n}: residual {residual:e}",
                backend.name()
            );
        }
    }
}

#[test]
fn rank_deficient_matrix_still_reconstructs() {
    // Fully coherent points: C = s sᵗ has rank one.
    let n = 12;
    let s: Vec<f64> = (0..n).map(|i| 1.0 + 0.1 * i as f64).collect();
    let c = DMatrix::from_fn(n, n, |i, j| s[i] * s[j]);
    let mut packed = vec![0.0; packed_len(n)];
    pack_lower(&c, &mut packed);

    let mut h = vec![0.0; packed_len(n)];
    PackedFactorizer.factor(&packed, n, &mut h).unwrap();
    assert!(relative_residual(&packed, &h, n) < 1e-12);
    // Only the first column carries weight.
    for (k, _, j) in PackedEntries::new(n) {
        if j > 0 {
            assert!(h[k].abs() < 1e-6, "column {j} entry {}", h[k]);
        }
    }
}

#[test]
fn indefinite_matrix_reports_failing_column() {
    let c = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 2.0, 0.0, 1.0]);
    let mut packed = vec![0.0; 6];
    pack_lower(&c, &mut packed);
    let mut h = vec![0.0; 6];
    let failure = PackedFactorizer.factor(&packed, 3, &mut h).unwrap_err();
    assert_eq!(failure.column, 2);
    assert!(failure.pivot < 0.0);
}

#[test]
fn packed_order_matches_double_loop_and_grid_indexing() {
    let grid = Grid::new(
        &GridConfig {
            n_y: Some(4),
            n_z: Some(3),
            ..Default::default()
        },
        &mut RandomSource::from_seed(0),
    )
    .unwrap();
    let n = grid.n_p();
    assert_eq!(grid.n_packed(), packed_len(n));

    let mut reference = Vec::new();
    for j in 0..n {
        for i in j..n {
            reference.push((i, j));
        }
    }
    let entries: Vec<_> = PackedEntries::new(n).collect();
    assert_eq!(entries.len(), reference.len());
    for (offset, ((k, i, j), &(ri, rj))) in entries.iter().zip(&reference).enumerate() {
        assert_eq!((*k, *i, *j), (offset, ri, rj));
        assert_eq!(packed_index(n, ri, rj), offset);
        assert_eq!(packed_index(n, rj, ri), offset);

        // Both ends of every pair survive the grid's flat/subscript round trip.
        for p in [ri, rj] {
            let (iz, iy) = grid.ind2sub(p).unwrap();
            assert_eq!(grid.sub2ind(iz as isize, iy as isize), Some(p));
        }
    }
    assert_eq!(grid.ind2sub(n), None);
}
