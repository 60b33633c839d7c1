//! Port prober
//!
//! Determines a port's status with a bounded connect attempt followed by a
//! socket table lookup. Every failure is folded into a `PortStatus`; a probe
//! never returns an error.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

use crate::conntable::ConnectionTable;
use crate::status::{classify_entries, PortStatus};

/// Default connect timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default bound on the socket table lookup after a successful connect
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(500);
/// Default host probed
pub const DEFAULT_HOST: &str = "localhost";

/// Outcome of the connect phase
#[derive(Debug)]
enum ConnectOutcome {
    Connected,
    /// Refused or timed out: nothing is serving the port
    Unreachable,
    /// Anything else: resolution failure, permission, no addresses
    Fault(io::Error),
}

/// Probes ports on one host against one connection table
pub struct PortProber<T: ConnectionTable> {
    host: String,
    connect_timeout: Duration,
    lookup_timeout: Duration,
    table: Arc<T>,
}

impl<T: ConnectionTable> PortProber<T> {
    /// Create a prober for `localhost` with default timeouts
    pub fn new(table: T) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            connect_timeout: DEFAULT_PROBE_TIMEOUT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            table: Arc::new(table),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Upper bound on how long `probe` can take, excluding scheduling jitter
    pub fn max_probe_duration(&self) -> Duration {
        self.connect_timeout + self.lookup_timeout
    }

    /// Determine the current status of `port`
    pub async fn probe(&self, port: u16) -> PortStatus {
        match timeout(self.connect_timeout, self.connect(port)).await {
            Err(_) => {
                debug!("probe {}:{}: connect timed out", self.host, port);
                PortStatus::Closed
            }
            Ok(ConnectOutcome::Unreachable) => PortStatus::Closed,
            Ok(ConnectOutcome::Fault(e)) => {
                debug!("probe {}:{}: {}", self.host, port, e);
                PortStatus::Error
            }
            Ok(ConnectOutcome::Connected) => self.lookup(port).await,
        }
    }

    async fn connect(&self, port: u16) -> ConnectOutcome {
        let addrs: Vec<SocketAddr> = match lookup_host((self.host.as_str(), port)).await {
            Ok(addrs) => addrs.collect(),
            Err(e) => return ConnectOutcome::Fault(e),
        };

        let mut unreachable = false;
        let mut last_error = None;

        // localhost usually resolves to both ::1 and 127.0.0.1; one refusal
        // is enough to call the port closed
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    drop(stream);
                    return ConnectOutcome::Connected;
                }
                Err(e) if is_unreachable(&e) => unreachable = true,
                Err(e) => last_error = Some(e),
            }
        }

        if unreachable {
            return ConnectOutcome::Unreachable;
        }

        ConnectOutcome::Fault(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "host resolved to no addresses",
            )
        }))
    }

    async fn lookup(&self, port: u16) -> PortStatus {
        let table = Arc::clone(&self.table);
        let snapshot = tokio::task::spawn_blocking(move || table.entries_for_port(port));

        match timeout(self.lookup_timeout, snapshot).await {
            Ok(Ok(Ok(entries))) => classify_entries(&entries, port),
            Ok(Ok(Err(e))) => {
                debug!("probe port {}: {}", port, e);
                PortStatus::Error
            }
            Ok(Err(join_error)) => {
                debug!("probe port {}: lookup task failed: {}", port, join_error);
                PortStatus::Error
            }
            Err(_) => {
                debug!("probe port {}: connection table lookup timed out", port);
                PortStatus::Error
            }
        }
    }
}

fn is_unreachable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut
    )
}
