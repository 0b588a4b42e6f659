//! Type-safe physical quantities for the SNR model.
//!
//! Lengths, areas, times and angles are `uom` SI quantities. Photon counts have
//! no SI dimension, so a count is a dimensionless [`Ratio`] and photon rates and
//! fluxes are the matching `s⁻¹` and `m⁻² s⁻¹` quantities. Every noise term
//! therefore comes out as [`Photons`] at compile time; a term with a stray time
//! or area factor does not type-check.

use uom::si::angle::degree;
use uom::si::area::square_meter;
use uom::si::f64::{Angle, Area, Length, Ratio, Time};
use uom::si::length::meter;
use uom::si::ratio::ratio;
use uom::si::time::second;
use uom::si::{ISQ, SI};
use uom::typenum::{N1, N2, Z0};

const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Photon count (dimensionless).
pub type Photons = Ratio;

/// Photons per second.
pub type PhotonRate = uom::si::Quantity<ISQ<Z0, Z0, N1, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Photons per square metre per second.
pub type PhotonFlux = uom::si::Quantity<ISQ<N2, Z0, N1, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Extension trait for photon counts
pub trait PhotonsExt {
    fn from_photons(count: f64) -> Self;

    fn as_photons(&self) -> f64;
}

/// Extension trait for photon rates (dark current)
pub trait PhotonRateExt {
    fn from_photons_per_second(rate: f64) -> Self;

    fn as_photons_per_second(&self) -> f64;
}

/// Extension trait for photon fluxes
pub trait PhotonFluxExt {
    /// Create a flux from ph s⁻¹ m⁻²
    fn from_photons_per_m2_s(flux: f64) -> Self;

    /// Get the flux in ph s⁻¹ m⁻²
    fn as_photons_per_m2_s(&self) -> f64;
}

/// Extension trait for angles on the sky
pub trait AngleExt {
    fn from_arcseconds(arcsec: f64) -> Self;

    fn as_arcseconds(&self) -> f64;
}

/// Extension trait for integration times
pub trait TimeExt {
    fn from_seconds(s: f64) -> Self;

    fn as_seconds(&self) -> f64;
}

/// Extension trait for optical dimensions
pub trait LengthExt {
    fn from_meters(m: f64) -> Self;

    fn as_meters(&self) -> f64;
}

/// Extension trait for collecting areas
pub trait AreaExt {
    fn from_square_meters(m2: f64) -> Self;

    fn as_square_meters(&self) -> f64;
}

impl PhotonsExt for Photons {
    fn from_photons(count: f64) -> Self {
        Ratio::new::<ratio>(count)
    }

    fn as_photons(&self) -> f64 {
        self.get::<ratio>()
    }
}

impl PhotonRateExt for PhotonRate {
    fn from_photons_per_second(rate: f64) -> Self {
        Photons::from_photons(rate) / Time::from_seconds(1.0)
    }

    fn as_photons_per_second(&self) -> f64 {
        // Base units are already ph s⁻¹.
        self.value
    }
}

impl PhotonFluxExt for PhotonFlux {
    fn from_photons_per_m2_s(flux: f64) -> Self {
        Photons::from_photons(flux) / (Area::from_square_meters(1.0) * Time::from_seconds(1.0))
    }

    fn as_photons_per_m2_s(&self) -> f64 {
        self.value
    }
}

impl AngleExt for Angle {
    fn from_arcseconds(arcsec: f64) -> Self {
        Angle::new::<degree>(arcsec / ARCSEC_PER_DEGREE)
    }

    fn as_arcseconds(&self) -> f64 {
        self.get::<degree>() * ARCSEC_PER_DEGREE
    }
}

impl TimeExt for Time {
    fn from_seconds(s: f64) -> Self {
        Time::new::<second>(s)
    }

    fn as_seconds(&self) -> f64 {
        self.get::<second>()
    }
}

impl LengthExt for Length {
    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }
}

impl AreaExt for Area {
    fn from_square_meters(m2: f64) -> Self {
        Area::new::<square_meter>(m2)
    }

    fn as_square_meters(&self) -> f64 {
        self.get::<square_meter>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs()
    }

    #[test]
    fn flux_time_area_is_a_photon_count() {
        let flux = PhotonFlux::from_photons_per_m2_s(2.0);
        let counts: Photons = flux * Time::from_seconds(3.0) * Area::from_square_meters(4.0);
        assert!(rel_close(counts.as_photons(), 24.0, 1e-12));
    }

    #[test]
    fn rate_times_time_is_a_photon_count() {
        let dark = PhotonRate::from_photons_per_second(0.01);
        let counts: Photons = dark * Time::from_seconds(7.0);
        assert!(rel_close(counts.as_photons(), 0.07, 1e-12));
        assert!(rel_close(dark.as_photons_per_second(), 0.01, 1e-12));
    }

    #[test]
    fn arcsecond_conversions() {
        let seeing = Angle::from_arcseconds(0.6);
        assert!(rel_close(seeing.as_arcseconds(), 0.6, 1e-12));
        assert!(rel_close(Angle::from_arcseconds(3600.0).get::<degree>(), 1.0, 1e-12));
    }

    #[test]
    fn aperture_area() {
        let r = Length::from_meters(4.1);
        let area: Area = r * r;
        assert!(rel_close(area.as_square_meters(), 16.81, 1e-12));
        assert!(rel_close(r.as_meters(), 4.1, 1e-12));
    }

    #[test]
    fn flux_round_trips_through_base_units() {
        let flux = PhotonFlux::from_photons_per_m2_s(1e8);
        assert!(rel_close(flux.as_photons_per_m2_s(), 1e8, 1e-12));
        assert!(PhotonFlux::from_photons_per_m2_s(1.0) < flux);
    }
}
