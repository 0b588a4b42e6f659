//! Numeric building blocks: typed quantities, unit strings and bisection.

pub mod bisect;
pub mod measure;
pub mod units;

pub use bisect::*;
pub use measure::{Dimension, Measurement, UnitError};
pub use units::*;
