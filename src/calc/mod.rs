//! Limiting-magnitude calculation.
//!
//! Responsibilities:
//!
//! - compose signal and noise terms for a magnitude (`calculator`)
//! - invert SNR(magnitude) with bisection
//! - memoize sky-background lookups per atmosphere setting (`cache`)

pub mod cache;
pub mod calculator;

pub use cache::{SkyCache, SkyKey};
pub use calculator::ExposureTimeCalculator;
