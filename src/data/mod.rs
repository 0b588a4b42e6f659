//! Flux lookups: object photometry and sky background.
//!
//! The calculator depends on the [`Photometry`] and [`SkyBackground`] traits.
//! Two backends implement them:
//!
//! - built-in tables (`BuiltinPhotometry`, `BuiltinSky`), fully offline
//! - a remote JSON service (`ServiceClient`), configured via `ETC_SERVICE_URL`

pub mod filters;
pub mod photometry;
pub mod service;
pub mod sky;

pub use photometry::{BuiltinPhotometry, Photometry};
pub use service::{SERVICE_URL_ENV, ServiceClient};
pub use sky::{BuiltinSky, SkyBackground};
