//! Shared "build calculator, run query" logic behind the subcommands.
//!
//! Keeping this separate from `app` lets the printing code focus on
//! presentation (text vs JSON) while the workflow stays testable.

use uom::si::f64::Time;

use crate::calc::ExposureTimeCalculator;
use crate::cli::{Backend, CommonArgs, LimitArgs, SnrArgs, SolverArgs, SweepArgs};
use crate::data::{BuiltinPhotometry, BuiltinSky, Photometry, ServiceClient, SkyBackground};
use crate::domain::{
    DetectorConfig, LimitingMagnitude, MagnitudeRange, NoiseBudget, ObservationRequest, SolverSettings,
};
use crate::error::EtcError;
use crate::math::TimeExt;

/// Construct a calculator from the shared CLI options.
pub fn build_calculator(
    common: &CommonArgs,
    solver: Option<&SolverArgs>,
) -> Result<ExposureTimeCalculator, EtcError> {
    let detector = DetectorConfig::from_measurements(common.dark, common.readout, common.seeing)?;

    let (photometry, sky): (Box<dyn Photometry>, Box<dyn SkyBackground>) = match common.backend {
        Backend::Builtin => (Box::new(BuiltinPhotometry), Box::new(BuiltinSky::default())),
        Backend::Service => {
            let client = ServiceClient::from_env()?;
            tracing::info!(url = client.base_url(), "using remote photometry service");
            (Box::new(client.clone()), Box::new(client))
        }
    };

    let mut calc = ExposureTimeCalculator::from_detector(detector, photometry, sky);
    if let Some(args) = solver {
        calc = calc.with_solver(solver_settings(args)?);
    }
    Ok(calc)
}

pub fn solver_settings(args: &SolverArgs) -> Result<SolverSettings, EtcError> {
    if !(args.tolerance.is_finite() && args.tolerance > 0.0) {
        return Err(EtcError::InvalidRequest(format!(
            "tolerance must be positive, got {}",
            args.tolerance
        )));
    }
    if args.max_iterations == 0 {
        return Err(EtcError::InvalidRequest("max iterations must be at least 1".into()));
    }
    Ok(SolverSettings {
        range: MagnitudeRange::new(args.mag_min, args.mag_max)?,
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
    })
}

pub fn build_request(common: &CommonArgs, target_snr: f64, dit: Time) -> ObservationRequest {
    ObservationRequest::new(target_snr, dit)
        .with_exposures(common.ndit)
        .with_filter(common.filter.clone())
        .with_airmass(common.airmass)
        .with_water_vapor(common.pwv)
}

pub fn run_limit(args: &LimitArgs) -> Result<LimitingMagnitude, EtcError> {
    let dit = args.dit.into_time("dit")?;
    let calc = build_calculator(&args.common, Some(&args.solver))?;
    let request = build_request(&args.common, args.solver.snr, dit);
    calc.limiting_magnitude(&request)
}

pub fn run_snr(args: &SnrArgs) -> Result<NoiseBudget, EtcError> {
    let dit = args.dit.into_time("dit")?;
    let calc = build_calculator(&args.common, None)?;
    // The target is unused when evaluating a fixed magnitude.
    let request = build_request(&args.common, 1.0, dit);
    calc.noise_budget(args.magnitude, &request)
}

pub fn run_sweep(args: &SweepArgs) -> Result<Vec<LimitingMagnitude>, EtcError> {
    let times = args
        .times
        .iter()
        .map(|t| t.into_time("times"))
        .collect::<Result<Vec<_>, _>>()?;
    let calc = build_calculator(&args.common, Some(&args.solver))?;
    let request = build_request(&args.common, args.solver.snr, Time::from_seconds(1.0));
    calc.sweep(&request, &times)
}
