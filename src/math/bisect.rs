//! Bracketed bisection.
//!
//! We only need to invert a monotone scalar function on a fixed interval, so a
//! plain bisection is enough: it is robust, deterministic and its convergence
//! criterion is expressed directly on `x` (magnitudes).
//!
//! Failure modes are kept distinct:
//! - [`EtcError::RootNotBracketed`]: `f(low)` and `f(high)` share a sign
//! - [`EtcError::Convergence`]: iteration cap hit before the bracket shrank
//! - [`EtcError::NonFiniteObjective`]: the objective returned NaN/inf

use crate::error::EtcError;

/// Bisection tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectOptions {
    /// Absolute tolerance on `x`.
    pub xtol: f64,
    /// Maximum number of halvings after the endpoints are evaluated.
    pub max_iter: usize,
}

impl Default for BisectOptions {
    fn default() -> Self {
        Self {
            xtol: 1e-6,
            max_iter: 100,
        }
    }
}

/// A located root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub x: f64,
    pub iterations: usize,
}

/// Find `x` in `[a, b]` with `f(x) = 0`.
///
/// `f` must change sign across the bracket. Errors returned by `f` are
/// propagated unchanged.
pub fn bisect<F>(mut f: F, a: f64, b: f64, opts: BisectOptions) -> Result<Root, EtcError>
where
    F: FnMut(f64) -> Result<f64, EtcError>,
{
    if !(a.is_finite() && b.is_finite()) || a == b {
        return Err(EtcError::InvalidRequest(format!(
            "invalid bisection bracket [{a}, {b}]"
        )));
    }
    if !(opts.xtol.is_finite() && opts.xtol > 0.0) {
        return Err(EtcError::InvalidRequest(format!(
            "bisection tolerance must be positive, got {}",
            opts.xtol
        )));
    }

    let fa = eval(&mut f, a)?;
    let fb = eval(&mut f, b)?;

    if fa == 0.0 {
        return Ok(Root { x: a, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(Root { x: b, iterations: 0 });
    }
    if fa.signum() == fb.signum() {
        return Err(EtcError::RootNotBracketed {
            low: a,
            high: b,
            f_low: fa,
            f_high: fb,
        });
    }

    // Invariant: sign(f(lo)) == sign(f_lo) != sign(f(hi)).
    let (mut lo, mut hi, mut f_lo) = (a, b, fa);
    for iteration in 1..=opts.max_iter {
        let mid = lo + (hi - lo) / 2.0;
        let f_mid = eval(&mut f, mid)?;

        tracing::trace!(iteration, x = mid, f = f_mid, "bisection step");

        if f_mid == 0.0 {
            return Ok(Root {
                x: mid,
                iterations: iteration,
            });
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }

        if (hi - lo).abs() < opts.xtol {
            return Ok(Root {
                x: lo + (hi - lo) / 2.0,
                iterations: iteration,
            });
        }
    }

    Err(EtcError::Convergence {
        iterations: opts.max_iter,
        width: (hi - lo).abs(),
    })
}

fn eval<F>(f: &mut F, x: f64) -> Result<f64, EtcError>
where
    F: FnMut(f64) -> Result<f64, EtcError>,
{
    let y = f(x)?;
    if !y.is_finite() {
        return Err(EtcError::NonFiniteObjective { magnitude: x });
    }
    Ok(y)
}
