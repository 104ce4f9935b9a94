//! Error types for smctl
//!
//! Library errors are mapped onto a small set of user-facing variants, each
//! with suggestions printed in a cargo-style diagnostic.

use colored::Colorize;
use smctl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: List available profiles: smctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the smctl application
#[derive(Error, Debug)]
pub enum SmctlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'smctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { status: Option<u16>, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Operation {tracking_id} failed: {message}")]
    OperationFailed { tracking_id: String, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for smctl commands
pub type Result<T> = std::result::Result<T, SmctlError>;

impl SmctlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            SmctlError::ProfileNotFound { name } => vec![
                "List available profiles: smctl profile list".to_string(),
                format!(
                    "Create profile '{}': smctl profile set {} --subscription-id <id> --certificate <pem>",
                    name, name
                ),
            ],
            SmctlError::NoProfileConfigured => vec![
                "Create a profile: smctl profile set <name> --subscription-id <id> --certificate <pem>"
                    .to_string(),
                "Or set SMCTL_SUBSCRIPTION_ID and SMCTL_TOKEN".to_string(),
            ],
            SmctlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: smctl profile show <profile>".to_string(),
                "Verify the certificate is uploaded to the subscription".to_string(),
                "Check that SMCTL_TOKEN is not set to a stale token".to_string(),
            ],
            SmctlError::ConnectionError { message } if message.contains("certificate") => vec![
                "Check that the PEM file contains both the certificate and the private key"
                    .to_string(),
            ],
            SmctlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint is correct: smctl profile show <profile>".to_string(),
            ],
            SmctlError::ApiError {
                status: Some(404), ..
            } => vec![
                "Verify the tracking id or provider type is correct".to_string(),
                "Check that you're using the correct profile".to_string(),
            ],
            SmctlError::Timeout { .. } => vec![
                "The operation may still finish; check again with: smctl operation show <id>"
                    .to_string(),
                "Wait longer with --interval / --max-attempts".to_string(),
            ],
            SmctlError::InvalidInput { .. } => {
                vec!["Check the command syntax: smctl <command> --help".to_string()]
            }
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let SmctlError::ApiError {
            status: Some(status),
            ..
        } = self
        {
            diag = diag.detail(&format!("The endpoint answered with HTTP {}", status));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CoreError> for SmctlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { status, .. } if status == 401 || status == 403 => {
                SmctlError::AuthenticationFailed {
                    message: err.to_string(),
                }
            }
            CoreError::Transport { status, .. } => SmctlError::ApiError {
                status: Some(status),
                message: err.to_string(),
            },
            CoreError::Connection(message) => SmctlError::ConnectionError { message },
            CoreError::OperationTimeout { .. } | CoreError::Cancelled(_) => SmctlError::Timeout {
                message: err.to_string(),
            },
            CoreError::Validation(message) => SmctlError::InvalidInput { message },
            CoreError::Config(config_err) => SmctlError::from(config_err),
            CoreError::MalformedResponse(_) | CoreError::UnknownState(_) => {
                SmctlError::ApiError {
                    status: None,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<ConfigError> for SmctlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => SmctlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => SmctlError::NoProfileConfigured,
            other => SmctlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SmctlError {
    fn from(err: serde_json::Error) -> Self {
        SmctlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for SmctlError {
    fn from(err: serde_yaml::Error) -> Self {
        SmctlError::OutputError {
            message: format!("YAML error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_maps_to_authentication() {
        let err = SmctlError::from(CoreError::Transport {
            status: 403,
            body: "ForbiddenError".to_string(),
        });
        assert!(matches!(err, SmctlError::AuthenticationFailed { .. }));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_not_found_keeps_status() {
        let err = SmctlError::from(CoreError::Transport {
            status: 404,
            body: String::new(),
        });
        assert!(matches!(
            err,
            SmctlError::ApiError {
                status: Some(404),
                ..
            }
        ));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_missing_profile_maps_through_core() {
        let err = SmctlError::from(CoreError::Config(ConfigError::ProfileNotFound {
            name: "prod".to_string(),
        }));
        assert_eq!(err.to_string(), "Profile 'prod' not found");
    }

    #[test]
    fn test_validation_is_invalid_input() {
        let err = SmctlError::from(CoreError::Validation("empty type".to_string()));
        assert!(matches!(err, SmctlError::InvalidInput { .. }));
    }
}
