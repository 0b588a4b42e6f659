//! Command-line parsing for the `etc` binary.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! calculator. Defaults reproduce the reference observation: HAWK-I Ks band,
//! one 3600 s integration, SNR 5, 2.5 mm water vapour.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::math::Measurement;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "etc", version, about = "Limiting-magnitude exposure time calculator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve for the faintest magnitude reaching the target SNR (default).
    Limit(LimitArgs),
    /// Evaluate the SNR and noise budget at a given magnitude.
    Snr(SnrArgs),
    /// Solve the limiting magnitude for several integration times.
    Sweep(SweepArgs),
}

/// Where photometry and sky-background values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Built-in band tables (offline).
    Builtin,
    /// Remote service at `ETC_SERVICE_URL`.
    Service,
}

/// Detector, atmosphere and output options shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Dark current, e.g. "0.01 ph/s".
    #[arg(long, default_value = "0.01 ph/s", value_parser = parse_measurement)]
    pub dark: Measurement,

    /// Readout noise per pixel, e.g. "5 ph".
    #[arg(long, default_value = "5 ph", value_parser = parse_measurement)]
    pub readout: Measurement,

    /// Seeing FWHM, e.g. "0.6 arcsec".
    #[arg(long, default_value = "0.6 arcsec", value_parser = parse_measurement)]
    pub seeing: Measurement,

    /// Filter name, forwarded unchanged to the photometry backend.
    #[arg(short = 'f', long, default_value = "Ks")]
    pub filter: String,

    /// Airmass (>= 1).
    #[arg(long, default_value_t = 1.0)]
    pub airmass: f64,

    /// Precipitable water vapour in mm.
    #[arg(long, default_value_t = 2.5)]
    pub pwv: f64,

    /// Number of detector integrations.
    #[arg(long, default_value_t = 1)]
    pub ndit: u32,

    /// Photometry / sky backend.
    #[arg(long, value_enum, default_value_t = Backend::Builtin)]
    pub backend: Backend,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Solver options.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Target signal-to-noise ratio.
    #[arg(long, default_value_t = 5.0)]
    pub snr: f64,

    /// Brightest magnitude searched.
    #[arg(long, default_value_t = 0.0)]
    pub mag_min: f64,

    /// Faintest magnitude searched.
    #[arg(long, default_value_t = 30.0)]
    pub mag_max: f64,

    /// Convergence tolerance in magnitudes.
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,

    /// Maximum bisection iterations.
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,
}

#[derive(Debug, Args, Clone)]
pub struct LimitArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Detector integration time, e.g. "3600 s" or "1 h".
    #[arg(long, default_value = "3600 s", value_parser = parse_measurement)]
    pub dit: Measurement,
}

#[derive(Debug, Args, Clone)]
pub struct SnrArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Source magnitude.
    #[arg(short = 'm', long)]
    pub magnitude: f64,

    /// Detector integration time.
    #[arg(long, default_value = "3600 s", value_parser = parse_measurement)]
    pub dit: Measurement,
}

#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Integration times, comma separated (e.g. "60 s,10 min,1 h").
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["60 s", "300 s", "900 s", "3600 s", "14400 s"],
        value_parser = parse_measurement
    )]
    pub times: Vec<Measurement>,
}

fn parse_measurement(input: &str) -> Result<Measurement, String> {
    Measurement::parse(input).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Dimension;

    #[test]
    fn defaults_match_reference_observation() {
        let cli = Cli::parse_from(["etc", "limit"]);
        let Command::Limit(args) = cli.command else {
            panic!("expected limit");
        };
        assert_eq!(args.common.filter, "Ks");
        assert_eq!(args.common.pwv, 2.5);
        assert_eq!(args.common.ndit, 1);
        assert_eq!(args.common.dark.dim(), Dimension::PHOTON_RATE);
        assert_eq!(args.dit.dim(), Dimension::TIME);
        assert_eq!(args.dit.value(), 3600.0);
        assert_eq!(args.solver.snr, 5.0);
        assert_eq!(args.common.backend, Backend::Builtin);
    }

    #[test]
    fn sweep_times_are_comma_separated() {
        let cli = Cli::parse_from(["etc", "sweep", "--times", "60 s,10 min,1 h"]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        let secs: Vec<f64> = args.times.iter().map(|t| t.value()).collect();
        assert_eq!(secs, vec![60.0, 600.0, 3600.0]);
    }

    #[test]
    fn bad_unit_string_is_a_parse_error() {
        let result = Cli::try_parse_from(["etc", "limit", "--dit", "3600 parsecs"]);
        assert!(result.is_err());
    }

    #[test]
    fn overflowing_exponent_is_a_parse_error() {
        let result = Cli::try_parse_from(["etc", "limit", "--dit", "3600 s999"]);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_dimension_still_parses() {
        // Dimension checks happen when the calculator is built.
        let cli = Cli::parse_from(["etc", "limit", "--dark", "0.01"]);
        let Command::Limit(args) = cli.command else {
            panic!("expected limit");
        };
        assert!(args.common.dark.dim().is_dimensionless());
    }
}
