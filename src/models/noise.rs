//! Signal and noise terms of the SNR model.
//!
//! Every variance term is expressed as a photon count so the terms can be
//! summed directly (Poisson statistics: variance of a count equals the count):
//!
//! ```text
//! signal     = F_obj * t * A
//! background = F_sky * N_pix * t * A
//! dark       = D * N_pix * N_exp * t
//! readout    = R * N_pix
//!
//! SNR = signal / sqrt(signal + background + dark + readout)
//! ```
//!
//! The object's own shot noise enters as `signal`, not `signal²`. Each function
//! returns [`Photons`], so a term that does not reduce to a photon count is a
//! type error.

use uom::si::f64::{Area, Time};

use crate::math::{PhotonFlux, PhotonRate, Photons, PhotonsExt};

/// Object photons collected: `flux * time * area`.
pub fn signal(flux: PhotonFlux, time: Time, area: Area) -> Photons {
    flux * time * area
}

/// Sky photons collected over the seeing disc.
pub fn noise_background_squared(background_flux: PhotonFlux, pixels: f64, time: Time, area: Area) -> Photons {
    background_flux * pixels * time * area
}

/// Dark-current photon-equivalents over all integrations.
pub fn noise_dark_squared(dark_rate: PhotonRate, pixels: f64, exposures: u32, time: Time) -> Photons {
    dark_rate * (pixels * f64::from(exposures)) * time
}

/// Readout contribution; independent of integration time.
pub fn noise_readout_squared(readout_noise: Photons, pixels: f64) -> Photons {
    readout_noise * pixels
}

/// The four variance contributions at one magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseTerms {
    pub signal: Photons,
    pub background: Photons,
    pub dark: Photons,
    pub readout: Photons,
}

impl NoiseTerms {
    pub fn total_variance(&self) -> Photons {
        self.signal + self.background + self.dark + self.readout
    }

    pub fn snr(&self) -> f64 {
        snr_from_terms(self.signal, self.background, self.dark, self.readout)
    }
}

/// SNR for already-resolved photon counts.
///
/// A zero total variance (no signal, no noise) yields an SNR of zero.
pub fn snr_from_terms(signal: Photons, background: Photons, dark: Photons, readout: Photons) -> f64 {
    let total = (signal + background + dark + readout).as_photons();
    if total <= 0.0 {
        return 0.0;
    }
    signal.as_photons() / total.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{AreaExt, PhotonFluxExt, PhotonRateExt, TimeExt};

    fn rel_close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs()
    }

    fn ph(n: f64) -> Photons {
        Photons::from_photons(n)
    }

    #[test]
    fn signal_is_flux_time_area() {
        let s = signal(
            PhotonFlux::from_photons_per_m2_s(1e8),
            Time::from_seconds(50.0),
            Area::from_square_meters(1.0),
        );
        assert!(rel_close(s.as_photons(), 5e9, 1e-6));
        assert!(rel_close((s + ph(1.0)).as_photons(), 5e9 + 1.0, 1e-12));
    }

    #[test]
    fn readout_is_linear_in_pixels() {
        let readout = ph(5.0);
        assert!(rel_close(noise_readout_squared(readout, 5.0).as_photons(), 25.0, 1e-9));
        assert!(rel_close(noise_readout_squared(readout, 10.0).as_photons(), 50.0, 1e-9));
    }

    #[test]
    fn dark_scales_with_pixels_time_and_exposures() {
        let dark = PhotonRate::from_photons_per_second(0.01);
        let one = noise_dark_squared(dark, 50.0, 1, Time::from_seconds(7.0));
        assert!(rel_close(one.as_photons(), 3.5, 1e-6));

        let four = noise_dark_squared(dark, 50.0, 4, Time::from_seconds(7.0));
        assert!(rel_close(four.as_photons(), 14.0, 1e-9));

        let double_time = noise_dark_squared(dark, 50.0, 1, Time::from_seconds(14.0));
        assert!(rel_close(double_time.as_photons(), 7.0, 1e-9));
    }

    #[test]
    fn background_term_is_photon_count() {
        let bkg = noise_background_squared(
            PhotonFlux::from_photons_per_m2_s(100.0),
            10.0,
            Time::from_seconds(2.0),
            Area::from_square_meters(3.0),
        );
        assert!(rel_close(bkg.as_photons(), 6000.0, 1e-12));
    }

    #[test]
    fn snr_keeps_signal_under_the_root() {
        // Pure shot noise: SNR = sqrt(signal).
        let snr = snr_from_terms(ph(100.0), ph(0.0), ph(0.0), ph(0.0));
        assert!(rel_close(snr, 10.0, 1e-12));

        let snr = snr_from_terms(ph(100.0), ph(200.0), ph(50.0), ph(50.0));
        assert!(rel_close(snr, 5.0, 1e-12));
    }

    #[test]
    fn total_variance_sums_terms() {
        let terms = NoiseTerms {
            signal: ph(1.0),
            background: ph(2.0),
            dark: ph(3.0),
            readout: ph(4.0),
        };
        assert!(rel_close(terms.total_variance().as_photons(), 10.0, 1e-12));
        assert!(rel_close(terms.snr(), 1.0 / 10f64.sqrt(), 1e-12));
    }

    #[test]
    fn zero_everything_is_zero_snr() {
        let zero = ph(0.0);
        assert_eq!(snr_from_terms(zero, zero, zero, zero), 0.0);
    }
}
