//! Shared domain types.
//!
//! These are plain values: detector configuration fixed at construction,
//! per-call observation requests, solver settings, and serializable results
//! for the report/JSON layer.

use std::f64::consts::PI;

use serde::Serialize;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Area, Length, Time};

use crate::error::EtcError;
use crate::math::{
    AngleExt, LengthExt, Measurement, PhotonRate, PhotonRateExt, Photons, PhotonsExt, TimeExt,
};

/// Filter used when the caller does not name one.
pub const DEFAULT_FILTER: &str = "K";

/// Instrument name forwarded to photometry lookups.
pub const INSTRUMENT: &str = "HAWKI";

/// Observatory name forwarded to photometry lookups.
pub const OBSERVATORY: &str = "Paranal";

/// Detector characteristics, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    dark_rate: PhotonRate,
    readout_noise: Photons,
    seeing: Angle,
}

impl DetectorConfig {
    pub fn new(dark_rate: PhotonRate, readout_noise: Photons, seeing: Angle) -> Self {
        Self {
            dark_rate,
            readout_noise,
            seeing,
        }
    }

    /// Build from parsed unit strings.
    ///
    /// `dark` must be a photon rate, `readout` a photon count and `seeing` an
    /// angle; anything else fails with [`EtcError::IncompatibleUnits`]. Only the
    /// dimension is checked, so any magnitude (zero and negative included) is
    /// accepted.
    pub fn from_measurements(
        dark: Measurement,
        readout: Measurement,
        seeing: Measurement,
    ) -> Result<Self, EtcError> {
        Ok(Self::new(
            dark.into_photon_rate("dark")?,
            readout.into_photons("readout")?,
            seeing.into_angle("seeing")?,
        ))
    }

    pub fn dark_rate(&self) -> PhotonRate {
        self.dark_rate
    }

    pub fn readout_noise(&self) -> Photons {
        self.readout_noise
    }

    pub fn seeing(&self) -> Angle {
        self.seeing
    }
}

impl Default for DetectorConfig {
    /// No dark current, no readout noise, 1 arcsec seeing.
    fn default() -> Self {
        Self::new(
            PhotonRate::from_photons_per_second(0.0),
            Photons::from_photons(0.0),
            Angle::from_arcseconds(1.0),
        )
    }
}

/// Fixed optics of the modeled instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeGeometry {
    /// Radius of the collecting aperture.
    pub aperture_radius: Length,
    /// Angular size of one detector pixel.
    pub pixel_scale: Angle,
}

impl TelescopeGeometry {
    /// HAWK-I on VLT UT4.
    pub fn hawki_ut4() -> Self {
        Self {
            aperture_radius: Length::from_meters(4.1),
            pixel_scale: Angle::from_arcseconds(0.106),
        }
    }

    /// `π r²`.
    pub fn collecting_area(&self) -> Area {
        self.aperture_radius * self.aperture_radius * PI
    }

    /// Number of pixels covered by a seeing disc: `π (seeing / pixel_scale)²`.
    pub fn pixels(&self, seeing: Angle) -> f64 {
        let ratio = seeing.get::<radian>() / self.pixel_scale.get::<radian>();
        PI * ratio.powi(2)
    }
}

impl Default for TelescopeGeometry {
    fn default() -> Self {
        Self::hawki_ut4()
    }
}

/// One limiting-magnitude or SNR query.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRequest {
    /// Desired signal-to-noise ratio.
    pub target_snr: f64,
    /// Detector integration time (DIT).
    pub integration_time: Time,
    /// Number of detector integrations (NDIT).
    pub exposures: u32,
    pub filter_name: String,
    pub airmass: f64,
    /// Precipitable water vapour, in mm.
    pub water_vapor: f64,
}

impl ObservationRequest {
    pub fn new(target_snr: f64, integration_time: Time) -> Self {
        Self {
            target_snr,
            integration_time,
            exposures: 1,
            filter_name: DEFAULT_FILTER.to_string(),
            airmass: 1.0,
            water_vapor: 0.5,
        }
    }

    pub fn with_exposures(mut self, exposures: u32) -> Self {
        self.exposures = exposures;
        self
    }

    pub fn with_filter(mut self, filter_name: impl Into<String>) -> Self {
        self.filter_name = filter_name.into();
        self
    }

    pub fn with_airmass(mut self, airmass: f64) -> Self {
        self.airmass = airmass;
        self
    }

    pub fn with_water_vapor(mut self, water_vapor: f64) -> Self {
        self.water_vapor = water_vapor;
        self
    }

    /// Check the atmosphere and integration settings.
    ///
    /// The target SNR is checked separately by the solver since SNR-at-magnitude
    /// queries do not use it.
    pub fn validate(&self) -> Result<(), EtcError> {
        let dit_s = self.integration_time.as_seconds();
        if !(dit_s.is_finite() && dit_s > 0.0) {
            return Err(EtcError::InvalidRequest(format!(
                "integration time must be positive, got {dit_s} s"
            )));
        }
        if self.exposures == 0 {
            return Err(EtcError::InvalidRequest("exposure count must be at least 1".into()));
        }
        if !(self.airmass.is_finite() && self.airmass >= 1.0) {
            return Err(EtcError::InvalidRequest(format!(
                "airmass must be >= 1, got {}",
                self.airmass
            )));
        }
        if !(self.water_vapor.is_finite() && self.water_vapor >= 0.0) {
            return Err(EtcError::InvalidRequest(format!(
                "water vapour must be >= 0 mm, got {}",
                self.water_vapor
            )));
        }
        Ok(())
    }
}

/// Magnitude interval searched by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MagnitudeRange {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeRange {
    pub fn new(min: f64, max: f64) -> Result<Self, EtcError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(EtcError::InvalidRequest(format!(
                "invalid magnitude range [{min}, {max}] (must be finite with min < max)"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, magnitude: f64) -> bool {
        magnitude >= self.min && magnitude <= self.max
    }
}

impl Default for MagnitudeRange {
    fn default() -> Self {
        Self { min: 0.0, max: 30.0 }
    }
}

/// Limiting-magnitude solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub range: MagnitudeRange,
    /// Convergence tolerance on magnitude.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            range: MagnitudeRange::default(),
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Solved limiting magnitude plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitingMagnitude {
    pub magnitude: f64,
    /// SNR re-evaluated at `magnitude`.
    pub snr: f64,
    pub target_snr: f64,
    pub integration_time_s: f64,
    pub exposures: u32,
    pub filter_name: String,
    pub airmass: f64,
    pub water_vapor: f64,
    pub iterations: usize,
}

/// Per-term photon counts at one magnitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseBudget {
    pub magnitude: f64,
    pub signal: f64,
    pub background: f64,
    pub dark: f64,
    pub readout: f64,
    /// `signal + background + dark + readout`.
    pub total_variance: f64,
    pub snr: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{AreaExt, Dimension};

    fn measure(input: &str) -> Measurement {
        Measurement::parse(input).unwrap()
    }

    #[test]
    fn detector_rejects_wrong_dimensions() {
        let ok_dark = measure("0.01 ph/s");
        let ok_readout = measure("5 ph");
        let ok_seeing = measure("0.6 arcsec");

        let err = DetectorConfig::from_measurements(measure("0.01"), ok_readout, ok_seeing).unwrap_err();
        assert!(matches!(err, EtcError::IncompatibleUnits { parameter: "dark", .. }));

        let err = DetectorConfig::from_measurements(ok_dark, measure("5 m"), ok_seeing).unwrap_err();
        assert!(matches!(err, EtcError::IncompatibleUnits { parameter: "readout", .. }));

        let err = DetectorConfig::from_measurements(ok_dark, ok_readout, measure("5 s")).unwrap_err();
        assert_eq!(
            err,
            EtcError::IncompatibleUnits {
                parameter: "seeing",
                expected: Dimension::ANGLE,
                found: Dimension::TIME,
            }
        );
    }

    #[test]
    fn detector_accepts_any_magnitude_with_right_dimension() {
        for scale in ["0", "1e-9", "1", "1e9", "-3"] {
            let cfg = DetectorConfig::from_measurements(
                measure(&format!("{scale} ph/s")),
                measure(&format!("{scale} ph")),
                measure(&format!("{scale} arcsec")),
            );
            assert!(cfg.is_ok(), "scale {scale} rejected");
        }
        // Unit prefixes are conversions, not dimension changes.
        let cfg = DetectorConfig::from_measurements(measure("0 ph/min"), measure("0 photons"), measure("0.01 deg"))
            .unwrap();
        assert!((cfg.seeing().as_arcseconds() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn hawki_geometry_constants() {
        let geometry = TelescopeGeometry::hawki_ut4();
        let area = geometry.collecting_area();
        assert!((area.as_square_meters() - PI * 4.1 * 4.1).abs() < 1e-9);

        let pixels = geometry.pixels(Angle::from_arcseconds(0.106));
        assert!((pixels - PI).abs() < 1e-12);

        let pixels = geometry.pixels(Angle::from_arcseconds(0.6));
        assert!((pixels - PI * (0.6f64 / 0.106).powi(2)).abs() < 1e-9);
    }

    #[test]
    fn request_validation() {
        let base = ObservationRequest::new(5.0, Time::from_seconds(3600.0));
        assert!(base.validate().is_ok());
        assert_eq!(base.filter_name, DEFAULT_FILTER);
        assert_eq!(base.exposures, 1);

        assert!(base.clone().with_exposures(0).validate().is_err());
        assert!(base.clone().with_airmass(0.9).validate().is_err());
        assert!(base.clone().with_water_vapor(-1.0).validate().is_err());

        let zero_time = ObservationRequest::new(5.0, Time::from_seconds(0.0));
        assert!(matches!(zero_time.validate(), Err(EtcError::InvalidRequest(_))));
    }

    #[test]
    fn magnitude_range_must_be_ordered() {
        assert!(MagnitudeRange::new(0.0, 30.0).is_ok());
        assert!(MagnitudeRange::new(30.0, 0.0).is_err());
        assert!(MagnitudeRange::new(f64::NAN, 1.0).is_err());
        assert!(MagnitudeRange::default().contains(22.5));
    }
}
