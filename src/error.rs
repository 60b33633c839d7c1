//! Error types and exit codes for port-watch
//!
//! Probe faults never reach this type: the prober folds them into a
//! `PortStatus`. Everything else (config, close, CLI) reports through
//! `PortWatchError`.

use std::process::ExitCode;
use thiserror::Error;

/// Exit codes for the port-watch command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortWatchExitCode {
    /// Successful execution
    Success = 0,
    /// Nothing to act on
    NoTarget = 1,
    /// Permission denied
    PermissionDenied = 2,
    /// Configuration file error
    ConfigError = 3,
    /// General/other error
    GeneralError = 255,
}

impl From<PortWatchExitCode> for ExitCode {
    fn from(code: PortWatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Error types for port-watch operations
#[derive(Error, Debug)]
pub enum PortWatchError {
    // User input errors
    /// Invalid port or port range specification
    #[error("Invalid port specification: {0}")]
    InvalidPortSpec(String),

    /// Two registry entries share a name
    #[error("Duplicate port name: {0}")]
    DuplicateName(String),

    /// Invalid signal specification
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    /// Conflicting command-line flags
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// User declined a confirmation prompt
    #[error("Operation cancelled")]
    Cancelled,

    // System errors
    /// The OS socket table could not be read
    #[error("Failed to read connection table: {0}")]
    ConnectionTable(String),

    /// Process not found
    #[error("Process {0} not found")]
    ProcessNotFound(u32),

    /// Permission denied for operation
    #[error("Permission denied for PID {0}")]
    PermissionDenied(u32),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigError(String),

    /// Configuration file could not be written
    #[error("Config creation error: {0}")]
    ConfigCreationError(String),

    /// Generic system error
    #[error("System error: {0}")]
    SystemError(String),
}

impl PortWatchError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> PortWatchExitCode {
        match self {
            PortWatchError::ProcessNotFound(_) => PortWatchExitCode::NoTarget,
            PortWatchError::PermissionDenied(_) => PortWatchExitCode::PermissionDenied,
            PortWatchError::ConfigError(_)
            | PortWatchError::InvalidPortSpec(_)
            | PortWatchError::DuplicateName(_) => PortWatchExitCode::ConfigError,
            _ => PortWatchExitCode::GeneralError,
        }
    }
}
