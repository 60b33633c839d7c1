//! Termination signals for port-watch
//!
//! Parses the configured close signal and delivers it with nix.

use crate::error::PortWatchError;
use nix::sys::signal::{self, Signal as NixSignal};
use nix::unistd::Pid;

/// Signals accepted for closing a port's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    /// SIGHUP (1) - Hangup
    SIGHUP,
    /// SIGINT (2) - Interrupt
    SIGINT,
    /// SIGQUIT (3) - Quit
    SIGQUIT,
    /// SIGKILL (9) - Kill (cannot be caught)
    SIGKILL,
    /// SIGTERM (15) - Terminate
    #[default]
    SIGTERM,
}

impl Signal {
    fn to_nix(self) -> NixSignal {
        match self {
            Signal::SIGHUP => NixSignal::SIGHUP,
            Signal::SIGINT => NixSignal::SIGINT,
            Signal::SIGQUIT => NixSignal::SIGQUIT,
            Signal::SIGKILL => NixSignal::SIGKILL,
            Signal::SIGTERM => NixSignal::SIGTERM,
        }
    }

    /// Get signal number
    pub fn number(&self) -> i32 {
        self.to_nix() as i32
    }

    /// Get signal name
    pub fn name(&self) -> &'static str {
        match self {
            Signal::SIGHUP => "SIGHUP",
            Signal::SIGINT => "SIGINT",
            Signal::SIGQUIT => "SIGQUIT",
            Signal::SIGKILL => "SIGKILL",
            Signal::SIGTERM => "SIGTERM",
        }
    }

    /// Parse signal from name or number
    ///
    /// Accepts "SIGTERM", "TERM", "term", "15" and so on.
    pub fn parse(s: &str) -> Result<Signal, PortWatchError> {
        let s = s.trim().to_uppercase();

        if let Ok(num) = s.parse::<i32>() {
            return match num {
                1 => Ok(Signal::SIGHUP),
                2 => Ok(Signal::SIGINT),
                3 => Ok(Signal::SIGQUIT),
                9 => Ok(Signal::SIGKILL),
                15 => Ok(Signal::SIGTERM),
                _ => Err(PortWatchError::InvalidSignal(num.to_string())),
            };
        }

        match s.strip_prefix("SIG").unwrap_or(&s) {
            "HUP" => Ok(Signal::SIGHUP),
            "INT" => Ok(Signal::SIGINT),
            "QUIT" => Ok(Signal::SIGQUIT),
            "KILL" => Ok(Signal::SIGKILL),
            "TERM" => Ok(Signal::SIGTERM),
            _ => Err(PortWatchError::InvalidSignal(s)),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Delivers termination signals to processes
pub trait Terminator {
    /// Send `signal` to `pid`
    ///
    /// A process that no longer exists yields `ProcessNotFound`.
    fn terminate(&self, pid: u32, signal: Signal) -> Result<(), PortWatchError>;
}

/// Signal sender for Unix processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalSender;

impl SignalSender {
    /// Send signal to process
    pub fn send(pid: u32, signal: Signal) -> Result<(), PortWatchError> {
        let nix_pid = Pid::from_raw(pid as i32);

        signal::kill(nix_pid, signal.to_nix()).map_err(|e| match e {
            nix::errno::Errno::ESRCH => PortWatchError::ProcessNotFound(pid),
            nix::errno::Errno::EPERM => PortWatchError::PermissionDenied(pid),
            _ => PortWatchError::SystemError(format!("Failed to send signal: {}", e)),
        })
    }
}

impl Terminator for SignalSender {
    fn terminate(&self, pid: u32, signal: Signal) -> Result<(), PortWatchError> {
        Self::send(pid, signal)
    }
}
