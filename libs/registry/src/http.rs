//! HTTP implementation of the registry client.
//!
//! Speaks the registry's metadata API over HTTPS with an optional bearer
//! token. Status codes map to typed errors: 401 means the token is missing
//! or rejected, 404 on delete means the digest is already gone.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::{debug, info};

use regsweep_policy::ImageRecord;

use crate::client::{DeleteOutcome, RegistryClient};
use crate::error::RegistryError;
use crate::types::{Catalog, ManifestPage};

/// Configuration for [`HttpRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL (e.g. "https://myregistry.azurecr.io").
    pub base_url: String,
    /// Optional bearer token attached to every request.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RegistryConfig {
    /// Config for a registry host, with the default https scheme.
    pub fn for_host(host: &str) -> Self {
        Self {
            base_url: format!("https://{host}"),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Registry metadata client over HTTP.
pub struct HttpRegistry {
    config: RegistryConfig,
    client: Client,
}

impl HttpRegistry {
    /// Create a new client.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let config = RegistryConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self { config, client })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    fn unexpected(&self, status: StatusCode, path: &str) -> RegistryError {
        RegistryError::UnexpectedStatus {
            status: status.as_u16(),
            url: format!("{}{}", self.config.base_url, path),
        }
    }
}

#[async_trait]
impl RegistryClient for HttpRegistry {
    async fn list_repositories(&self) -> Result<Vec<String>, RegistryError> {
        let path = "/acr/v1/_catalog";
        debug!(url = %format!("{}{}", self.config.base_url, path), "Listing repositories");

        let response = self.request(Method::GET, path).send().await?;

        match response.status() {
            StatusCode::OK => {
                let catalog: Catalog = response.json().await?;
                Ok(catalog.repositories)
            }
            StatusCode::UNAUTHORIZED => Err(RegistryError::AuthRequired),
            status => Err(self.unexpected(status, path)),
        }
    }

    async fn list_manifests(&self, repository: &str) -> Result<Vec<ImageRecord>, RegistryError> {
        let path = format!("/acr/v1/{}/_manifests", repository);
        debug!(repository = %repository, "Listing manifests");

        let response = self.request(Method::GET, &path).send().await?;

        match response.status() {
            StatusCode::OK => {
                let page: ManifestPage = response.json().await?;

                let records = page
                    .manifests
                    .into_iter()
                    .map(|m| ImageRecord {
                        repository: repository.to_string(),
                        digest: m.digest,
                        created_at: m.created_time,
                        size_bytes: m.image_size,
                    })
                    .collect();
                Ok(records)
            }
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound(repository.to_string())),
            StatusCode::UNAUTHORIZED => Err(RegistryError::AuthRequired),
            status => Err(self.unexpected(status, &path)),
        }
    }

    async fn delete_manifest(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<DeleteOutcome, RegistryError> {
        let path = format!("/v2/{}/manifests/{}", repository, digest);

        let response = self.request(Method::DELETE, &path).send().await?;

        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK => {
                info!(repository = %repository, digest = %digest, "Manifest deleted");
                Ok(DeleteOutcome::Deleted)
            }
            // Already gone, deletion is idempotent.
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            StatusCode::UNAUTHORIZED => Err(RegistryError::AuthRequired),
            status => Err(self.unexpected(status, &path)),
        }
    }
}
