//! Configuration for the CLI.

use std::time::Duration;

use regsweep_registry::RegistryConfig;

/// CLI configuration resolved from arguments and environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry base URL.
    pub base_url: String,

    /// Bearer token for the registry, if any.
    pub token: Option<String>,
}

impl Config {
    /// Resolve configuration for a registry host.
    ///
    /// `REGSWEEP_URL` overrides the derived `https://{host}` base URL (useful
    /// for plain-http test registries); `REGSWEEP_TOKEN` carries the bearer
    /// token.
    pub fn from_env(registry: &str) -> Self {
        let base_url =
            std::env::var("REGSWEEP_URL").unwrap_or_else(|_| format!("https://{registry}"));

        let token = std::env::var("REGSWEEP_TOKEN").ok().filter(|t| !t.is_empty());

        Self { base_url, token }
    }

    /// Registry client configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(30),
        }
    }
}
