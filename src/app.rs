//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initialises logging
//! - parses CLI arguments
//! - runs the requested query
//! - prints text or JSON output

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, LimitArgs, SnrArgs, SweepArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `etc` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `etc` on its own and `etc --flag ...` behave like `etc limit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Limit(args) => handle_limit(args),
        Command::Snr(args) => handle_snr(args),
        Command::Sweep(args) => handle_sweep(args),
    }
}

/// Log to stderr so stdout carries only results. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn handle_limit(args: LimitArgs) -> Result<(), AppError> {
    let limit = pipeline::run_limit(&args)?;
    if args.common.json {
        println!("{}", crate::report::to_json(&limit)?);
    } else {
        println!("{}", crate::report::format_limit(&limit));
    }
    Ok(())
}

fn handle_snr(args: SnrArgs) -> Result<(), AppError> {
    let budget = pipeline::run_snr(&args)?;
    if args.common.json {
        println!("{}", crate::report::to_json(&budget)?);
    } else {
        println!("{}", crate::report::format_budget(&budget, &args.common.filter));
    }
    Ok(())
}

fn handle_sweep(args: SweepArgs) -> Result<(), AppError> {
    let limits = pipeline::run_sweep(&args)?;
    if args.common.json {
        println!("{}", crate::report::to_json(&limits)?);
    } else {
        print!("{}", crate::report::format_sweep(&limits));
    }
    Ok(())
}

/// Rewrite argv so `etc` defaults to `etc limit`.
///
/// Rules:
/// - `etc`                       -> `etc limit`
/// - `etc --snr 10 ...`          -> `etc limit --snr 10 ...`
/// - `etc --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("limit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "limit" | "snr" | "sweep");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "limit".to_string());
        return argv;
    }

    argv
}
