//! The exposure time calculator.
//!
//! Given fixed detector characteristics, it evaluates the SNR of a point source
//! at a given magnitude and inverts that relation with bisection to find the
//! limiting magnitude for a target SNR.

use std::fmt;

use rayon::prelude::*;
use uom::si::f64::{Angle, Area, Time};

use crate::calc::cache::{SkyCache, SkyKey};
use crate::data::{BuiltinPhotometry, BuiltinSky, Photometry, SkyBackground};
use crate::domain::{
    DetectorConfig, INSTRUMENT, LimitingMagnitude, NoiseBudget, OBSERVATORY, ObservationRequest,
    SolverSettings, TelescopeGeometry,
};
use crate::error::EtcError;
use crate::math::{AreaExt, BisectOptions, PhotonFlux, PhotonRate, Photons, PhotonsExt, TimeExt, bisect};
use crate::models::{self, NoiseTerms};

pub struct ExposureTimeCalculator {
    detector: DetectorConfig,
    geometry: TelescopeGeometry,
    solver: SolverSettings,
    photometry: Box<dyn Photometry>,
    sky: Box<dyn SkyBackground>,
    cache: SkyCache,
}

impl ExposureTimeCalculator {
    /// Calculator for a detector with the given dark current, readout noise and
    /// seeing, resolving fluxes through `photometry` and `sky`.
    ///
    /// Unit strings are checked by [`DetectorConfig::from_measurements`]; here the
    /// dimensions are fixed by the argument types.
    pub fn new(
        dark: PhotonRate,
        readout: Photons,
        seeing: Angle,
        photometry: Box<dyn Photometry>,
        sky: Box<dyn SkyBackground>,
    ) -> Self {
        Self::from_detector(DetectorConfig::new(dark, readout, seeing), photometry, sky)
    }

    pub fn from_detector(
        detector: DetectorConfig,
        photometry: Box<dyn Photometry>,
        sky: Box<dyn SkyBackground>,
    ) -> Self {
        Self {
            detector,
            geometry: TelescopeGeometry::hawki_ut4(),
            solver: SolverSettings::default(),
            photometry,
            sky,
            cache: SkyCache::new(),
        }
    }

    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    /// Replace the sky cache, e.g. with one pre-filled with known backgrounds.
    pub fn with_sky_cache(mut self, cache: SkyCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn detector(&self) -> &DetectorConfig {
        &self.detector
    }

    pub fn sky_cache(&self) -> &SkyCache {
        &self.cache
    }

    pub fn signal(flux: PhotonFlux, dit: Time, area: Area) -> Photons {
        models::signal(flux, dit, area)
    }

    pub fn noise_background_squared(background_flux: PhotonFlux, pixels: f64, dit: Time, area: Area) -> Photons {
        models::noise_background_squared(background_flux, pixels, dit, area)
    }

    pub fn noise_dark_squared(&self, pixels: f64, dit: Time, exposures: u32) -> Photons {
        models::noise_dark_squared(self.detector.dark_rate(), pixels, exposures, dit)
    }

    pub fn noise_readout_squared(&self, pixels: f64) -> Photons {
        models::noise_readout_squared(self.detector.readout_noise(), pixels)
    }

    /// Sky flux for the request's filter and atmosphere, fetched at most once per key.
    pub fn background_flux(&self, request: &ObservationRequest) -> Result<PhotonFlux, EtcError> {
        self.cache.get_or_try_insert_with(SkyKey::for_request(request), || {
            self.sky
                .background_flux(&request.filter_name, request.airmass, request.water_vapor)
                .inspect_err(|e| tracing::warn!(backend = self.sky.name(), error = %e, "sky lookup failed"))
        })
    }

    /// Signal and variance terms at `magnitude`.
    pub fn noise_terms(&self, magnitude: f64, request: &ObservationRequest) -> Result<NoiseTerms, EtcError> {
        request.validate()?;
        self.evaluate(magnitude, request)
    }

    /// SNR of a point source of `magnitude`.
    pub fn calculate_snr(&self, magnitude: f64, request: &ObservationRequest) -> Result<f64, EtcError> {
        Ok(self.noise_terms(magnitude, request)?.snr())
    }

    /// Per-term photon counts at `magnitude`, for reporting.
    pub fn noise_budget(&self, magnitude: f64, request: &ObservationRequest) -> Result<NoiseBudget, EtcError> {
        let terms = self.noise_terms(magnitude, request)?;
        Ok(NoiseBudget {
            magnitude,
            signal: terms.signal.as_photons(),
            background: terms.background.as_photons(),
            dark: terms.dark.as_photons(),
            readout: terms.readout.as_photons(),
            total_variance: terms.total_variance().as_photons(),
            snr: terms.snr(),
        })
    }

    /// Faintest magnitude reaching `request.target_snr`.
    pub fn solve(&self, request: &ObservationRequest) -> Result<f64, EtcError> {
        Ok(self.limiting_magnitude(request)?.magnitude)
    }

    /// Faintest magnitude reaching `request.target_snr`, with diagnostics.
    ///
    /// SNR is assumed to decrease monotonically with magnitude over the solver
    /// range; a target outside the achievable SNR span fails with
    /// [`EtcError::RootNotBracketed`].
    pub fn limiting_magnitude(&self, request: &ObservationRequest) -> Result<LimitingMagnitude, EtcError> {
        request.validate()?;
        if !(request.target_snr.is_finite() && request.target_snr > 0.0) {
            return Err(EtcError::InvalidRequest(format!(
                "target SNR must be positive, got {}",
                request.target_snr
            )));
        }

        let range = self.solver.range;
        let opts = BisectOptions {
            xtol: self.solver.tolerance,
            max_iter: self.solver.max_iterations,
        };

        let root = bisect(
            |m| Ok(self.evaluate(m, request)?.snr() - request.target_snr),
            range.min,
            range.max,
            opts,
        )?;

        let snr = self.evaluate(root.x, request)?.snr();
        let dit_s = request.integration_time.as_seconds();
        tracing::info!(
            filter = %request.filter_name,
            dit_s,
            ndit = request.exposures,
            target_snr = request.target_snr,
            magnitude = root.x,
            iterations = root.iterations,
            "limiting magnitude solved"
        );

        Ok(LimitingMagnitude {
            magnitude: root.x,
            snr,
            target_snr: request.target_snr,
            integration_time_s: dit_s,
            exposures: request.exposures,
            filter_name: request.filter_name.clone(),
            airmass: request.airmass,
            water_vapor: request.water_vapor,
            iterations: root.iterations,
        })
    }

    /// Limiting magnitude for each integration time, solved in parallel.
    ///
    /// The sky background is shared through the cache, so it is looked up once.
    pub fn sweep(
        &self,
        request: &ObservationRequest,
        integration_times: &[Time],
    ) -> Result<Vec<LimitingMagnitude>, EtcError> {
        if integration_times.is_empty() {
            return Err(EtcError::InvalidRequest("sweep needs at least one integration time".into()));
        }
        request.validate()?;
        // Resolve the shared background before fanning out.
        self.background_flux(request)?;

        integration_times
            .par_iter()
            .map(|&dit| {
                let mut req = request.clone();
                req.integration_time = dit;
                self.limiting_magnitude(&req)
            })
            .collect()
    }

    fn evaluate(&self, magnitude: f64, request: &ObservationRequest) -> Result<NoiseTerms, EtcError> {
        let background_flux = self.background_flux(request)?;
        let object_flux = self
            .photometry
            .object_flux(&request.filter_name, magnitude, INSTRUMENT, OBSERVATORY)?;

        let pixels = self.geometry.pixels(self.detector.seeing());
        let area = self.geometry.collecting_area();
        let dit = request.integration_time;

        Ok(NoiseTerms {
            signal: Self::signal(object_flux, dit, area),
            background: Self::noise_background_squared(background_flux, pixels, dit, area),
            dark: self.noise_dark_squared(pixels, dit, request.exposures),
            readout: self.noise_readout_squared(pixels),
        })
    }
}

impl Default for ExposureTimeCalculator {
    fn default() -> Self {
        Self::from_detector(
            DetectorConfig::default(),
            Box::new(BuiltinPhotometry),
            Box::new(BuiltinSky::default()),
        )
    }
}

impl fmt::Debug for ExposureTimeCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposureTimeCalculator")
            .field("detector", &self.detector)
            .field("collecting_area_m2", &self.geometry.collecting_area().as_square_meters())
            .field("solver", &self.solver)
            .field("photometry", &self.photometry.name())
            .field("sky", &self.sky.name())
            .field("cached_backgrounds", &self.cache.len())
            .finish()
    }
}
