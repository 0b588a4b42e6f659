//! Remote photometry/sky service.
//!
//! The service exposes two JSON endpoints:
//!
//! ```text
//! GET {base}/photometry?filter=Ks&magnitude=21.3&instrument=HAWKI&observatory=Paranal
//! GET {base}/sky?filter=Ks&airmass=1.0&pwv=2.5
//! ```
//!
//! Both answer `{"value": <f64>, "unit": "<unit string>"}`. The unit must parse to
//! a photon flux; anything else is reported as an upstream failure.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::photometry::Photometry;
use crate::data::sky::SkyBackground;
use crate::error::EtcError;
use crate::math::{Dimension, Measurement, PhotonFlux, PhotonFluxExt};

/// Environment variable holding the service base URL.
pub const SERVICE_URL_ENV: &str = "ETC_SERVICE_URL";

const SERVICE_NAME: &str = "etc-service";

#[derive(Debug, Deserialize)]
struct FluxResponse {
    value: f64,
    unit: String,
}

/// Blocking client for the remote lookups.
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from `ETC_SERVICE_URL` (a `.env` file is honoured).
    pub fn from_env() -> Result<Self, EtcError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(SERVICE_URL_ENV).map_err(|_| {
            EtcError::InvalidRequest(format!("missing {SERVICE_URL_ENV} in environment (.env)"))
        })?;
        if base_url.trim().is_empty() {
            return Err(EtcError::InvalidRequest(format!("{SERVICE_URL_ENV} is empty")));
        }
        Ok(Self::new(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_flux(&self, endpoint: &str, query: &[(&str, String)]) -> Result<PhotonFlux, EtcError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, ?query, "service lookup");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| EtcError::upstream(SERVICE_NAME, format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            tracing::warn!(%url, %status, "service lookup rejected");
            return Err(EtcError::upstream(
                SERVICE_NAME,
                format!("{endpoint} request failed with status {status}: {}", body.trim()),
            ));
        }

        let body: FluxResponse = resp
            .json()
            .map_err(|e| EtcError::upstream(SERVICE_NAME, format!("failed to parse {endpoint} response: {e}")))?;

        flux_from_response(endpoint, body)
    }
}

fn flux_from_response(endpoint: &str, body: FluxResponse) -> Result<PhotonFlux, EtcError> {
    let measured = Measurement::with_unit(body.value, &body.unit).map_err(|e| {
        EtcError::upstream(SERVICE_NAME, format!("{endpoint} response has bad unit: {e}"))
    })?;
    if measured.dim() != Dimension::PHOTON_FLUX {
        return Err(EtcError::upstream(
            SERVICE_NAME,
            format!(
                "{endpoint} response is not a photon flux (unit '{}' has dimension {})",
                body.unit,
                measured.dim()
            ),
        ));
    }
    if !measured.value().is_finite() {
        return Err(EtcError::upstream(
            SERVICE_NAME,
            format!("{endpoint} response value is not finite"),
        ));
    }
    Ok(PhotonFlux::from_photons_per_m2_s(measured.value()))
}

impl Photometry for ServiceClient {
    fn object_flux(
        &self,
        filter: &str,
        magnitude: f64,
        instrument: &str,
        observatory: &str,
    ) -> Result<PhotonFlux, EtcError> {
        self.fetch_flux(
            "photometry",
            &[
                ("filter", filter.to_string()),
                ("magnitude", magnitude.to_string()),
                ("instrument", instrument.to_string()),
                ("observatory", observatory.to_string()),
            ],
        )
    }

    fn name(&self) -> &str {
        SERVICE_NAME
    }
}

impl SkyBackground for ServiceClient {
    fn background_flux(&self, filter: &str, airmass: f64, water_vapor_mm: f64) -> Result<PhotonFlux, EtcError> {
        self.fetch_flux(
            "sky",
            &[
                ("filter", filter.to_string()),
                ("airmass", airmass.to_string()),
                ("pwv", water_vapor_mm.to_string()),
            ],
        )
    }

    fn name(&self) -> &str {
        SERVICE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ServiceClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn response_unit_is_converted() {
        let body: FluxResponse =
            serde_json::from_str(r#"{"value": 2.0, "unit": "ph / (s cm2)"}"#).unwrap();
        let flux = flux_from_response("sky", body).unwrap();
        assert!((flux.as_photons_per_m2_s() - 2.0e4).abs() < 1e-9);
    }

    #[test]
    fn response_with_wrong_dimension_is_upstream_error() {
        let body = FluxResponse {
            value: 1.0,
            unit: "ph/s".to_string(),
        };
        let err = flux_from_response("photometry", body).unwrap_err();
        assert!(matches!(err, EtcError::Upstream { .. }));

        let body = FluxResponse {
            value: 1.0,
            unit: "jansky".to_string(),
        };
        assert!(matches!(
            flux_from_response("photometry", body),
            Err(EtcError::Upstream { .. })
        ));
    }

    #[test]
    fn overflowing_unit_exponent_is_upstream_error() {
        for unit in ["ph m100 m100", "ph m2^100", "ph s999"] {
            let body = FluxResponse {
                value: 1.0,
                unit: unit.to_string(),
            };
            let err = flux_from_response("sky", body).unwrap_err();
            assert!(matches!(err, EtcError::Upstream { .. }), "{unit}: {err:?}");
        }
    }

    #[test]
    fn unreachable_service_is_upstream_error() {
        // Reserve a free port, then release it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ServiceClient::new(format!("http://127.0.0.1:{port}"));
        let err = client.background_flux("Ks", 1.0, 2.5).unwrap_err();
        assert!(matches!(err, EtcError::Upstream { .. }));
    }
}
