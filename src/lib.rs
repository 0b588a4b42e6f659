//! `etc-limits` library crate.
//!
//! Computes the limiting magnitude of a point source for a target SNR given an
//! integration time, detector characteristics and sky conditions.
//!
//! The binary (`etc`) is a thin wrapper around this library so that:
//!
//! - the calculator is testable without spawning processes
//! - photometry and sky backends can be swapped or stubbed

pub mod app;
pub mod calc;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod math;
pub mod models;
pub mod report;

pub use calc::ExposureTimeCalculator;
pub use error::EtcError;
