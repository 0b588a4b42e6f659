//! Domain types used throughout the calculator.
//!
//! This module defines:
//!
//! - detector configuration (`DetectorConfig`) and fixed optics (`TelescopeGeometry`)
//! - per-call observation requests (`ObservationRequest`)
//! - solver settings (`MagnitudeRange`, `SolverSettings`)
//! - result records (`LimitingMagnitude`, `NoiseBudget`)

pub mod types;

pub use types::*;
