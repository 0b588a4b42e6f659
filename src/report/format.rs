//! Terminal formatting of calculator results.
//!
//! Formatting lives here so the calculator stays free of presentation code and
//! output changes stay localized.

use crate::data::filters;
use crate::domain::{LimitingMagnitude, NoiseBudget};

/// Two-line summary of a limiting-magnitude query.
pub fn format_limit(limit: &LimitingMagnitude) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Desired SNR {:3}, ndit = {:4}, dit = {} s\n",
        limit.target_snr, limit.exposures, limit.integration_time_s
    ));
    out.push_str(&format!("Limiting magnitude is {:.3}", limit.magnitude));
    out
}

/// Per-term breakdown of the variance at one magnitude.
pub fn format_budget(budget: &NoiseBudget, filter_name: &str) -> String {
    let band = match filters::lookup(filter_name) {
        Some(b) => format!("{} ({:.2} um)", b.name, b.wavelength_um),
        None => filter_name.to_string(),
    };
    let mut out = String::new();
    out.push_str(&format!(
        "SNR at {band} = {:.3} is {:.4}\n",
        budget.magnitude, budget.snr
    ));
    out.push_str("\nNoise budget (photons):\n");

    let total = budget.total_variance;
    for (label, value) in [
        ("signal", budget.signal),
        ("background", budget.background),
        ("dark", budget.dark),
        ("readout", budget.readout),
    ] {
        out.push_str(&format!(
            "  {label:<11} {value:>14.6e}  {:>6.2}%\n",
            percent(value, total)
        ));
    }
    out.push_str(&format!("  {:<11} {total:>14.6e}", "total"));
    out
}

/// Table of limiting magnitudes, one row per integration time.
pub fn format_sweep(limits: &[LimitingMagnitude]) -> String {
    let mut out = String::new();
    let Some(first) = limits.first() else {
        return out;
    };

    out.push_str(&format!(
        "Limiting magnitudes for SNR {} in {} (airmass {}, pwv {} mm)\n",
        first.target_snr, first.filter_name, first.airmass, first.water_vapor
    ));
    out.push_str(&format!("{:>12} {:>6} {:>10}\n", "dit [s]", "ndit", "mag"));
    for limit in limits {
        out.push_str(&format!(
            "{:>12.1} {:>6} {:>10.3}\n",
            limit.integration_time_s, limit.exposures, limit.magnitude
        ));
    }
    out
}

fn percent(value: f64, total: f64) -> f64 {
    if total > 0.0 { 100.0 * value / total } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(dit: f64, magnitude: f64) -> LimitingMagnitude {
        LimitingMagnitude {
            magnitude,
            snr: 5.0,
            target_snr: 5.0,
            integration_time_s: dit,
            exposures: 1,
            filter_name: "Ks".to_string(),
            airmass: 1.0,
            water_vapor: 2.5,
            iterations: 25,
        }
    }

    #[test]
    fn limit_summary_lines() {
        let text = format_limit(&limit(3600.0, 22.73456));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Desired SNR   5, ndit =    1, dit = 3600 s");
        assert_eq!(lines[1], "Limiting magnitude is 22.735");
    }

    #[test]
    fn budget_percentages() {
        let budget = NoiseBudget {
            magnitude: 20.0,
            signal: 25.0,
            background: 50.0,
            dark: 0.0,
            readout: 25.0,
            total_variance: 100.0,
            snr: 2.5,
        };
        let text = format_budget(&budget, "H");
        assert!(text.starts_with("SNR at H (1.63 um) = 20.000 is 2.5000"), "{text}");
        assert!(text.contains("50.00%"));
        assert!(text.contains("total"));

        let text = format_budget(&budget, "NB2090");
        assert!(text.starts_with("SNR at NB2090 = 20.000 is 2.5000"));
    }

    #[test]
    fn sweep_has_row_per_time() {
        let text = format_sweep(&[limit(60.0, 20.5), limit(600.0, 21.7)]);
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("21.700"));
        assert!(format_sweep(&[]).is_empty());
    }
}
