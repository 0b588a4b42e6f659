//! Magnitude to photon flux conversion.

use crate::data::filters;
use crate::error::EtcError;
use crate::math::{PhotonFlux, PhotonFluxExt};

/// Converts a magnitude in a band into the photon flux arriving at the telescope.
pub trait Photometry: Send + Sync {
    /// Photon flux (ph s⁻¹ m⁻²) of a source of `magnitude` in `filter`.
    fn object_flux(
        &self,
        filter: &str,
        magnitude: f64,
        instrument: &str,
        observatory: &str,
    ) -> Result<PhotonFlux, EtcError>;

    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Offline Vega-system photometry from the built-in band table.
///
/// Instrument and observatory are accepted for interface compatibility; the
/// tabulated zero points do not depend on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPhotometry;

impl Photometry for BuiltinPhotometry {
    fn object_flux(
        &self,
        filter: &str,
        magnitude: f64,
        _instrument: &str,
        _observatory: &str,
    ) -> Result<PhotonFlux, EtcError> {
        let band = filters::lookup(filter).ok_or_else(|| {
            EtcError::upstream(
                self.name(),
                format!("unknown filter '{filter}' (known: {})", filters::known_names()),
            )
        })?;
        Ok(PhotonFlux::from_photons_per_m2_s(
            band.zero_point * 10f64.powf(-0.4 * magnitude),
        ))
    }

    fn name(&self) -> &str {
        "builtin-photometry"
    }
}
