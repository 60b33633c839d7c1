//! Port closer
//!
//! Terminates every process that owns a socket on a given local port.
//! Runs independently of the polling loop with its own table snapshot.

use log::{info, warn};

use crate::conntable::{owner_pids, ConnectionTable};
use crate::error::PortWatchError;
use crate::process_info::ProcessInfoProvider;
use crate::signal::{Signal, Terminator};

/// What happened to one owner process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Signal delivered
    Terminated,
    /// Process was gone before the signal was sent
    AlreadyExited,
    /// The monitor's own process; never signalled
    Skipped,
    /// Not allowed to signal the process
    PermissionDenied,
    /// Signal could not be delivered
    Failed(String),
}

impl TerminationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TerminationOutcome::PermissionDenied | TerminationOutcome::Failed(_)
        )
    }
}

/// Result of terminating one owner process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationResult {
    pub pid: u32,
    pub name: String,
    pub outcome: TerminationOutcome,
}

impl TerminationResult {
    /// One-line summary for acknowledgments
    pub fn message(&self, signal: Signal) -> String {
        match &self.outcome {
            TerminationOutcome::Terminated => format!("Sent {} to process", signal.name()),
            TerminationOutcome::AlreadyExited => "Process already exited".to_string(),
            TerminationOutcome::Skipped => "Skipped (port-watch itself)".to_string(),
            TerminationOutcome::PermissionDenied => "Permission denied".to_string(),
            TerminationOutcome::Failed(reason) => reason.clone(),
        }
    }
}

/// Result of a close operation
#[derive(Debug, Clone, Default)]
pub struct CloseReport {
    pub port: u16,
    pub signal: Signal,
    pub results: Vec<TerminationResult>,
}

impl CloseReport {
    fn new(port: u16, signal: Signal) -> Self {
        Self {
            port,
            signal,
            results: Vec::new(),
        }
    }

    /// No process owned the port
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn terminated_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == TerminationOutcome::Terminated)
            .count()
    }

    /// Every owner is gone or was signalled
    pub fn all_success(&self) -> bool {
        !self.results.iter().any(|r| r.outcome.is_failure())
    }

    /// Error for the first owner that could not be signalled
    pub fn first_failure(&self) -> Option<PortWatchError> {
        self.results.iter().find_map(|r| match &r.outcome {
            TerminationOutcome::PermissionDenied => Some(PortWatchError::PermissionDenied(r.pid)),
            TerminationOutcome::Failed(reason) => Some(PortWatchError::SystemError(format!(
                "Failed to signal PID {}: {}",
                r.pid, reason
            ))),
            _ => None,
        })
    }
}

/// Closes ports by terminating their owner processes
pub struct PortCloser<T: ConnectionTable, K: Terminator> {
    table: T,
    terminator: K,
    signal: Signal,
}

impl<T: ConnectionTable, K: Terminator> PortCloser<T, K> {
    pub fn new(table: T, terminator: K) -> Self {
        Self {
            table,
            terminator,
            signal: Signal::default(),
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Terminate every process owning a socket on `port`
    ///
    /// Processes that already exited are not an error. Every owner is
    /// attempted; owners that could not be signalled are recorded in the
    /// report (see `CloseReport::first_failure`). Only a failed table
    /// snapshot is returned as an error.
    pub fn close_port(&self, port: u16) -> Result<CloseReport, PortWatchError> {
        let entries = self.table.snapshot()?;
        let pids = owner_pids(&entries, port);
        let names = ProcessInfoProvider::for_pids(&pids);
        let own_pid = ProcessInfoProvider::current_pid();

        let mut report = CloseReport::new(port, self.signal);

        for pid in pids {
            let name = names.name_of(pid);

            let outcome = if pid == own_pid {
                TerminationOutcome::Skipped
            } else {
                match self.terminator.terminate(pid, self.signal) {
                    Ok(()) => {
                        info!("port {}: sent {} to {} ({})", port, self.signal, name, pid);
                        TerminationOutcome::Terminated
                    }
                    Err(PortWatchError::ProcessNotFound(_)) => TerminationOutcome::AlreadyExited,
                    Err(e) => {
                        warn!("port {}: could not terminate {} ({}): {}", port, name, pid, e);
                        match e {
                            PortWatchError::PermissionDenied(_) => {
                                TerminationOutcome::PermissionDenied
                            }
                            PortWatchError::SystemError(reason) => {
                                TerminationOutcome::Failed(reason)
                            }
                            other => TerminationOutcome::Failed(other.to_string()),
                        }
                    }
                }
            };

            report.results.push(TerminationResult { pid, name, outcome });
        }

        Ok(report)
    }
}
