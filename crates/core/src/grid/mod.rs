//! Grid geometry and time axis

pub mod primes;
mod turb_grid;

pub use turb_grid::Grid;
