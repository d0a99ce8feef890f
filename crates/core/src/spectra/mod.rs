//! Auto-spectra and cross-spectral matrix assembly

mod cross;
pub mod packed;
mod tensor;

pub use cross::CrossSpectrumBuffer;
pub use packed::{packed_index, packed_len, unpack_symmetric, PackedEntries};
pub use tensor::{ArraySpectrum, FnSpectrum, SpectralModel, SpectralTensor};
