//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

use regsweep_policy::PolicyError;
use regsweep_registry::RegistryError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::Registry(RegistryError::AuthRequired) => {
                eprintln!(
                    "\n{}",
                    "Hint: Set REGSWEEP_TOKEN to a registry bearer token.".yellow()
                );
            }
            CliError::Registry(RegistryError::Http(_)) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check your network connection and the registry host.".yellow()
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_formats_a_user_facing_message() {
        let invalid = CliError::InvalidConfig("bad format".to_string());
        assert_eq!(invalid.to_string(), "invalid configuration: bad format");

        let policy = CliError::from(PolicyError::InvalidLimit);
        assert!(policy.to_string().contains("greater than zero"));

        let registry = CliError::from(RegistryError::AuthRequired);
        assert!(registry.to_string().contains("token"));
    }

    #[test]
    fn print_error_accepts_wrapped_cli_errors() {
        let err = anyhow::Error::from(CliError::from(RegistryError::AuthRequired));
        print_error(&err);
    }
}
