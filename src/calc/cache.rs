//! Keyed memoization of sky-background lookups.
//!
//! Sky lookups can be slow (remote service), and the solver evaluates the SNR
//! dozens of times per query with identical atmosphere settings. Entries are
//! keyed by `(filter, airmass, water vapour)` so changing any of them triggers a
//! fresh lookup. Entries are never evicted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ObservationRequest;
use crate::error::EtcError;
use crate::math::PhotonFlux;

/// Cache key. Floats are stored by bit pattern (after folding `-0.0` into `0.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkyKey {
    filter: String,
    airmass_bits: u64,
    water_vapor_bits: u64,
}

impl SkyKey {
    pub fn new(filter: &str, airmass: f64, water_vapor: f64) -> Self {
        Self {
            filter: filter.to_string(),
            airmass_bits: (airmass + 0.0).to_bits(),
            water_vapor_bits: (water_vapor + 0.0).to_bits(),
        }
    }

    pub fn for_request(request: &ObservationRequest) -> Self {
        Self::new(&request.filter_name, request.airmass, request.water_vapor)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn airmass(&self) -> f64 {
        f64::from_bits(self.airmass_bits)
    }

    pub fn water_vapor(&self) -> f64 {
        f64::from_bits(self.water_vapor_bits)
    }
}

/// Thread-safe map from [`SkyKey`] to background photon flux.
///
/// The lock is held while a missing entry is fetched, so each key has a single
/// writer and concurrent callers wait instead of issuing duplicate lookups.
#[derive(Debug, Default)]
pub struct SkyCache {
    entries: Mutex<HashMap<SkyKey, PhotonFlux>>,
}

impl SkyCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SkyKey, PhotonFlux>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a known background, e.g. a measured value or a test fixture.
    pub fn insert(&self, key: SkyKey, flux: PhotonFlux) {
        self.lock().insert(key, flux);
    }

    /// Return the cached value or fetch and store it.
    ///
    /// A failed fetch stores nothing, so the next call retries.
    pub fn get_or_try_insert_with<F>(&self, key: SkyKey, fetch: F) -> Result<PhotonFlux, EtcError>
    where
        F: FnOnce() -> Result<PhotonFlux, EtcError>,
    {
        let mut entries = self.lock();
        if let Some(flux) = entries.get(&key) {
            tracing::debug!(filter = key.filter(), "sky cache hit");
            return Ok(*flux);
        }

        tracing::debug!(
            filter = key.filter(),
            airmass = key.airmass(),
            water_vapor = key.water_vapor(),
            "sky cache miss"
        );
        let flux = fetch()?;
        entries.insert(key, flux);
        Ok(flux)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
