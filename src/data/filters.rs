//! Broad-band filter table used by the built-in backends.
//!
//! Photon zero points are Vega photon flux densities (Bessell, Castelli & Plez
//! 1998) multiplied by the effective bandwidth. Sky surface brightness values are
//! typical dark-time Paranal zenith values.

/// Reference precipitable water vapour for the tabulated infrared sky, in mm.
pub const REFERENCE_PWV_MM: f64 = 2.5;

/// One photometric band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub name: &'static str,
    /// Effective wavelength, in micrometres.
    pub wavelength_um: f64,
    /// Photon flux of a magnitude-0 source, in ph s⁻¹ m⁻².
    pub zero_point: f64,
    /// Zenith sky surface brightness, in mag arcsec⁻².
    pub sky_brightness: f64,
    /// Fractional change in sky flux per mm of water vapour above the reference.
    pub pwv_coefficient: f64,
}

pub const BANDS: &[Band] = &[
    Band { name: "U", wavelength_um: 0.366, zero_point: 4.99e9, sky_brightness: 22.3, pwv_coefficient: 0.0 },
    Band { name: "B", wavelength_um: 0.438, zero_point: 1.31e10, sky_brightness: 22.6, pwv_coefficient: 0.0 },
    Band { name: "V", wavelength_um: 0.545, zero_point: 8.76e9, sky_brightness: 21.6, pwv_coefficient: 0.0 },
    Band { name: "R", wavelength_um: 0.641, zero_point: 9.69e9, sky_brightness: 20.9, pwv_coefficient: 0.0 },
    Band { name: "I", wavelength_um: 0.798, zero_point: 6.73e9, sky_brightness: 19.7, pwv_coefficient: 0.0 },
    Band { name: "Z", wavelength_um: 0.878, zero_point: 5.64e9, sky_brightness: 18.8, pwv_coefficient: 0.0 },
    Band { name: "Y", wavelength_um: 1.021, zero_point: 5.02e9, sky_brightness: 17.3, pwv_coefficient: 0.005 },
    Band { name: "J", wavelength_um: 1.22, zero_point: 4.11e9, sky_brightness: 16.5, pwv_coefficient: 0.01 },
    Band { name: "H", wavelength_um: 1.63, zero_point: 2.86e9, sky_brightness: 14.4, pwv_coefficient: 0.02 },
    Band { name: "Ks", wavelength_um: 2.15, zero_point: 1.48e9, sky_brightness: 13.0, pwv_coefficient: 0.05 },
    Band { name: "K", wavelength_um: 2.19, zero_point: 1.70e9, sky_brightness: 12.8, pwv_coefficient: 0.06 },
];

/// Look up a band by exact (case-sensitive) name.
pub fn lookup(name: &str) -> Option<&'static Band> {
    BANDS.iter().find(|b| b.name == name)
}

/// Comma-separated list of known band names, for error messages.
pub fn known_names() -> String {
    BANDS.iter().map(|b| b.name).collect::<Vec<_>>().join(", ")
}
