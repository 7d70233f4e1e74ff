//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use waymark::config::ConfigFileError;
use waymark::OverlayError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or written
    Config(ConfigFileError),
    /// Overlay could not be attached or driven
    Overlay(OverlayError),
    /// Async runtime or provider thread failure
    Runtime(String),
    /// Failed to write an output file
    FileWrite { path: PathBuf, error: OverlayError },
}

impl CliError {
    /// Exit the process with an error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(ConfigFileError::InvalidValue { .. }) = self {
            eprintln!();
            eprintln!("Run 'waymark config show' to see the effective settings,");
            eprintln!("or delete the offending key to fall back to its default.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Overlay(e) => write!(f, "Overlay error: {}", e),
            CliError::Runtime(msg) => write!(f, "Simulation failed: {}", msg),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Overlay(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<OverlayError> for CliError {
    fn from(e: OverlayError) -> Self {
        CliError::Overlay(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Runtime("provider thread panicked".to_string());
        assert_eq!(err.to_string(), "Simulation failed: provider thread panicked");

        let err: CliError = OverlayError::MissingComponent("camera").into();
        assert!(err.to_string().starts_with("Overlay error:"));
    }

    #[test]
    fn test_config_error_has_source() {
        use std::error::Error;

        let err: CliError = ConfigFileError::WriteError("disk full".to_string()).into();
        assert!(err.source().is_some());
    }
}
