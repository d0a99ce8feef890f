//! Packed lower-triangular storage
//!
//! A symmetric `n x n` matrix is stored as its lower triangle, column by
//! column: `(0,0), (1,0), .., (n-1,0), (1,1), (2,1), .., (n-1,n-1)`. This is
//! the layout the packed Cholesky routine walks, so assembly, factorization
//! and the factor-times-phase product all share one ordering.
//!
//! All index arithmetic for the layout lives here.

use nalgebra::DMatrix;

/// Number of stored entries for an `n x n` symmetric matrix.
#[inline]
pub const fn packed_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Offset of the first entry (the diagonal) of column `j`.
#[inline]
pub const fn column_start(n: usize, j: usize) -> usize {
    j * n - j * (j.saturating_sub(1)) / 2
}

/// Offset of entry `(i, j)`. The matrix is symmetric, so `i < j` reads the
/// mirrored entry.
///
/// # Panics
///
/// In debug builds, if either index is out of range.
#[inline]
pub fn packed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < n && j < n, "({i}, {j}) outside {n}x{n}");
    let (row, col) = if i >= j { (i, j) } else { (j, i) };
    column_start(n, col) + (row - col)
}

/// Iterator over `(offset, i, j)` in packed storage order.
///
/// Column `j` runs over `0..n`; within a column row `i` runs over `j..n`.
#[derive(Debug, Clone)]
pub struct PackedEntries {
    n: usize,
    offset: usize,
    i: usize,
    j: usize,
}

impl PackedEntries {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            offset: 0,
            i: 0,
            j: 0,
        }
    }
}

impl Iterator for PackedEntries {
    type Item = (usize, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.j >= self.n {
            return None;
        }
        let item = (self.offset, self.i, self.j);
        self.offset += 1;
        self.i += 1;
        if self.i == self.n {
            self.j += 1;
            self.i = self.j;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = packed_len(self.n) - self.offset;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PackedEntries {}

/// Expand packed storage into a full symmetric matrix.
///
/// # Panics
///
/// If `packed.len() != packed_len(n)`.
pub fn unpack_symmetric(packed: &[f64], n: usize) -> DMatrix<f64> {
    assert_eq!(packed.len(), packed_len(n), "packed length for n = {n}");
    let mut full = DMatrix::zeros(n, n);
    for (k, i, j) in PackedEntries::new(n) {
        full[(i, j)] = packed[k];
        full[(j, i)] = packed[k];
    }
    full
}

/// Expand packed storage of a lower-triangular factor (upper part zero).
pub fn unpack_lower(packed: &[f64], n: usize) -> DMatrix<f64> {
    assert_eq!(packed.len(), packed_len(n), "packed length for n = {n}");
    let mut full = DMatrix::zeros(n, n);
    for (k, i, j) in PackedEntries::new(n) {
        full[(i, j)] = packed[k];
    }
    full
}

/// Copy the lower triangle of `full` into packed storage.
pub fn pack_lower(full: &DMatrix<f64>, out: &mut [f64]) {
    let n = full.nrows();
    debug_assert_eq!(out.len(), packed_len(n));
    for (k, i, j) in PackedEntries::new(n) {
        out[k] = full[(i, j)];
    }
}
