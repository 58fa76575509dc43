//! The registry client seam.

use async_trait::async_trait;

use regsweep_policy::ImageRecord;

use crate::error::RegistryError;

/// Outcome of a manifest deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The registry accepted the deletion.
    Deleted,
    /// The digest was already gone. Callers treat this as success.
    NotFound,
}

/// Abstracts the registry operations the sweep needs.
///
/// Listing errors abort the run; deletions are independent and idempotent.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// List every repository in the registry.
    async fn list_repositories(&self) -> Result<Vec<String>, RegistryError>;

    /// List the manifests of one repository as image records.
    async fn list_manifests(&self, repository: &str) -> Result<Vec<ImageRecord>, RegistryError>;

    /// Delete a manifest by digest.
    async fn delete_manifest(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<DeleteOutcome, RegistryError>;
}
