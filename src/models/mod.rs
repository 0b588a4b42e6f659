//! SNR model.
//!
//! Terms are implemented as small, pure functions so the calculator can stay a
//! thin layer that resolves fluxes and geometry.

pub mod noise;

pub use noise::*;
