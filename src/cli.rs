//! CLI argument parser for port-watch
//!
//! Provides type-safe argument parsing using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::MonitorOptions;
use crate::error::PortWatchError;
use crate::signal::Signal;

/// Execution mode determined from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Poll continuously until interrupted
    Watch,
    /// Run a single cycle
    Once,
    /// Terminate the owners of a port
    Close(u16),
    /// Write a sample config file
    InitConfig { force: bool },
}

/// CLI arguments for port-watch
#[derive(Parser, Debug)]
#[command(
    name = "port-watch",
    version,
    about = "Watch local TCP ports and close them",
    long_about = "Polls a set of named local TCP ports concurrently and prints only what\n\
                  changed between cycles. --close terminates every process that owns\n\
                  a port. Send SIGHUP to reload the config while watching."
)]
pub struct CliArgs {
    /// Config file (default: ~/.config/port-watch/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run one polling cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Close a port by terminating its owner processes
    #[arg(long, value_name = "PORT")]
    pub close: Option<u16>,

    /// Do not ask for confirmation before closing
    #[arg(short, long)]
    pub yes: bool,

    /// Generate config file with sample settings
    #[arg(long)]
    pub init: bool,

    /// Overwrite existing config file without confirmation (use with --init)
    #[arg(long)]
    pub force: bool,

    /// Polling interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Connect timeout per probe in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Host to probe
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Signal used by --close (name or number)
    #[arg(short, long, value_name = "SIGNAL")]
    pub signal: Option<String>,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments and determine execution mode
    ///
    /// `--once`, `--close` and `--init` are mutually exclusive; with none of
    /// them the monitor runs until interrupted.
    pub fn validate(&self) -> Result<ExecutionMode, PortWatchError> {
        let selected = [self.once, self.close.is_some(), self.init]
            .iter()
            .filter(|&&b| b)
            .count();

        if selected > 1 {
            return Err(PortWatchError::InvalidArguments(
                "--once, --close and --init cannot be combined".to_string(),
            ));
        }
        if self.force && !self.init {
            return Err(PortWatchError::InvalidArguments(
                "--force requires --init".to_string(),
            ));
        }
        if self.yes && self.close.is_none() {
            return Err(PortWatchError::InvalidArguments(
                "--yes requires --close".to_string(),
            ));
        }

        if self.init {
            Ok(ExecutionMode::InitConfig { force: self.force })
        } else if let Some(port) = self.close {
            Ok(ExecutionMode::Close(port))
        } else if self.once {
            Ok(ExecutionMode::Once)
        } else {
            Ok(ExecutionMode::Watch)
        }
    }

    /// Apply command-line overrides on top of configured options
    pub fn apply_overrides(&self, options: &mut MonitorOptions) -> Result<(), PortWatchError> {
        if let Some(ms) = self.interval_ms {
            if ms == 0 {
                return Err(PortWatchError::ConfigError(
                    "--interval-ms must be greater than 0".to_string(),
                ));
            }
            options.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            options.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ref host) = self.host {
            options.host = host.clone();
        }
        if let Some(ref signal) = self.signal {
            options.close_signal = Signal::parse(signal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn make_args() -> CliArgs {
        CliArgs {
            config: None,
            once: false,
            close: None,
            yes: false,
            init: false,
            force: false,
            interval_ms: None,
            timeout_ms: None,
            host: None,
            signal: None,
        }
    }

    fn options() -> MonitorOptions {
        Config::default().options().unwrap()
    }

    #[test]
    fn test_validate_default_is_watch() {
        assert_eq!(make_args().validate().unwrap(), ExecutionMode::Watch);
    }

    #[test]
    fn test_validate_single_modes() {
        let args = CliArgs {
            once: true,
            ..make_args()
        };
        assert_eq!(args.validate().unwrap(), ExecutionMode::Once);

        let args = CliArgs {
            close: Some(8080),
            yes: true,
            ..make_args()
        };
        assert_eq!(args.validate().unwrap(), ExecutionMode::Close(8080));

        let args = CliArgs {
            init: true,
            force: true,
            ..make_args()
        };
        assert_eq!(
            args.validate().unwrap(),
            ExecutionMode::InitConfig { force: true }
        );
    }

    #[test]
    fn test_validate_conflicting_modes() {
        let args = CliArgs {
            once: true,
            close: Some(80),
            ..make_args()
        };
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("cannot be combined"));

        let args = CliArgs {
            init: true,
            once: true,
            ..make_args()
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_dangling_flags() {
        let args = CliArgs {
            force: true,
            ..make_args()
        };
        assert!(args.validate().unwrap_err().to_string().contains("--init"));

        let args = CliArgs {
            yes: true,
            once: true,
            ..make_args()
        };
        assert!(args.validate().unwrap_err().to_string().contains("--close"));
    }

    #[test]
    fn test_overrides_applied() {
        let args = CliArgs {
            interval_ms: Some(250),
            timeout_ms: Some(100),
            host: Some("127.0.0.1".to_string()),
            signal: Some("kill".to_string()),
            ..make_args()
        };
        let mut opts = options();
        args.apply_overrides(&mut opts).unwrap();
        assert_eq!(opts.interval, Duration::from_millis(250));
        assert_eq!(opts.probe_timeout, Duration::from_millis(100));
        assert_eq!(opts.host, "127.0.0.1");
        assert_eq!(opts.close_signal, Signal::SIGKILL);
    }

    #[test]
    fn test_no_overrides_keeps_options() {
        let mut opts = options();
        make_args().apply_overrides(&mut opts).unwrap();
        assert_eq!(opts, options());
    }

    #[test]
    fn test_invalid_overrides() {
        let args = CliArgs {
            interval_ms: Some(0),
            ..make_args()
        };
        assert!(matches!(
            args.apply_overrides(&mut options()),
            Err(PortWatchError::ConfigError(_))
        ));

        let args = CliArgs {
            signal: Some("INVALID".to_string()),
            ..make_args()
        };
        assert!(matches!(
            args.apply_overrides(&mut options()),
            Err(PortWatchError::InvalidSignal(_))
        ));
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::try_parse_from([
            "port-watch",
            "--close",
            "3000",
            "--yes",
            "--signal",
            "9",
        ])
        .unwrap();
        assert_eq!(args.close, Some(3000));
        assert!(args.yes);
        assert_eq!(args.signal.as_deref(), Some("9"));
    }
}
