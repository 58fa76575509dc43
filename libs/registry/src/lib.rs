//! Registry metadata client.
//!
//! This library talks to a container registry's metadata API:
//!
//! - Listing repositories (`GET /acr/v1/_catalog`)
//! - Listing manifests with creation time and size (`GET /acr/v1/{repo}/_manifests`)
//! - Deleting a manifest by digest (`DELETE /v2/{repo}/manifests/{digest}`)
//!
//! The [`RegistryClient`] trait is the seam the sweep logic runs against, so
//! it can be tested without a live registry. [`HttpRegistry`] is the
//! production implementation.
//!
//! Deleting an already-absent digest is reported as [`DeleteOutcome::NotFound`],
//! which callers treat as success.

mod client;
mod error;
mod http;
mod types;

pub use client::{DeleteOutcome, RegistryClient};
pub use error::RegistryError;
pub use http::{HttpRegistry, RegistryConfig};
pub use types::{Catalog, ManifestAttributes, ManifestPage};
