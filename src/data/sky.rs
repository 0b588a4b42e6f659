//! Sky background photon flux.

use crate::data::filters::{self, REFERENCE_PWV_MM};
use crate::domain::TelescopeGeometry;
use crate::error::EtcError;
use crate::math::{AngleExt, PhotonFlux, PhotonFluxExt};

/// Lower bound on the water-vapour scaling so very dry nights keep a positive sky.
const MIN_PWV_FACTOR: f64 = 0.1;

/// Atmospheric model lookup.
pub trait SkyBackground: Send + Sync {
    /// Sky photon flux (ph s⁻¹ m⁻²) falling on one pixel footprint.
    fn background_flux(&self, filter: &str, airmass: f64, water_vapor_mm: f64) -> Result<PhotonFlux, EtcError>;

    fn name(&self) -> &str;
}

/// Offline sky model from the built-in band table.
///
/// `flux = F0 * 10^(-0.4 μ) * Ω_pix * X * (1 + c_pwv (pwv - 2.5))`
///
/// where `μ` is the zenith surface brightness, `Ω_pix` the pixel solid angle in
/// arcsec², `X` the airmass and `c_pwv` the band's water-vapour coefficient.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSky {
    pixel_solid_angle_arcsec2: f64,
}

impl BuiltinSky {
    pub fn new(geometry: &TelescopeGeometry) -> Self {
        let pixel_arcsec = geometry.pixel_scale.as_arcseconds();
        Self {
            pixel_solid_angle_arcsec2: pixel_arcsec * pixel_arcsec,
        }
    }
}

impl Default for BuiltinSky {
    fn default() -> Self {
        Self::new(&TelescopeGeometry::hawki_ut4())
    }
}

impl SkyBackground for BuiltinSky {
    fn background_flux(&self, filter: &str, airmass: f64, water_vapor_mm: f64) -> Result<PhotonFlux, EtcError> {
        let band = filters::lookup(filter).ok_or_else(|| {
            EtcError::upstream(
                self.name(),
                format!("unknown filter '{filter}' (known: {})", filters::known_names()),
            )
        })?;

        let per_arcsec2 = band.zero_point * 10f64.powf(-0.4 * band.sky_brightness);
        let pwv_factor =
            (1.0 + band.pwv_coefficient * (water_vapor_mm - REFERENCE_PWV_MM)).max(MIN_PWV_FACTOR);

        Ok(PhotonFlux::from_photons_per_m2_s(
            per_arcsec2 * self.pixel_solid_angle_arcsec2 * airmass * pwv_factor,
        ))
    }

    fn name(&self) -> &str {
        "builtin-sky"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_scales_linearly_with_airmass() {
        let sky = BuiltinSky::default();
        let zenith = sky.background_flux("H", 1.0, 2.5).unwrap();
        let low = sky.background_flux("H", 2.0, 2.5).unwrap();
        assert!((low.as_photons_per_m2_s() / zenith.as_photons_per_m2_s() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn water_vapor_only_affects_infrared() {
        let sky = BuiltinSky::default();
        let dry = sky.background_flux("Ks", 1.0, 0.5).unwrap();
        let wet = sky.background_flux("Ks", 1.0, 10.0).unwrap();
        assert!(wet > dry);

        let v_dry = sky.background_flux("V", 1.0, 0.5).unwrap();
        let v_wet = sky.background_flux("V", 1.0, 10.0).unwrap();
        assert_eq!(v_dry, v_wet);
    }

    #[test]
    fn infrared_sky_is_brighter_than_optical() {
        let sky = BuiltinSky::default();
        let ks = sky.background_flux("Ks", 1.0, 2.5).unwrap();
        let v = sky.background_flux("V", 1.0, 2.5).unwrap();
        assert!(ks > v);
    }

    #[test]
    fn pixel_solid_angle_from_geometry() {
        let sky = BuiltinSky::default();
        assert!((sky.pixel_solid_angle_arcsec2 - 0.106 * 0.106).abs() < 1e-12);
    }

    #[test]
    fn unknown_filter_fails() {
        let err = BuiltinSky::default().background_flux("Lp", 1.0, 2.5).unwrap_err();
        assert!(matches!(err, EtcError::Upstream { .. }));
    }
}
