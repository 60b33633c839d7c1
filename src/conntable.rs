//! Connection table access for port-watch
//!
//! Reads the OS socket table via netstat2. Both the prober and the closer
//! take a fresh snapshot on every call; nothing is cached between calls.

use crate::error::PortWatchError;
use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo};

pub use netstat2::TcpState;

/// One row of the socket table
///
/// A socket owned by several processes appears once per owning PID.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEntry {
    /// Local port
    pub local_port: u16,
    /// Remote port (0 for UDP and listening sockets)
    pub remote_port: u16,
    /// TCP state, `None` for UDP sockets
    pub state: Option<TcpState>,
    /// Owning process, if the OS reported one
    pub pid: Option<u32>,
}

impl SocketEntry {
    pub fn tcp(local_port: u16, remote_port: u16, state: TcpState, pid: Option<u32>) -> Self {
        Self {
            local_port,
            remote_port,
            state: Some(state),
            pid,
        }
    }

    pub fn udp(local_port: u16, pid: Option<u32>) -> Self {
        Self {
            local_port,
            remote_port: 0,
            state: None,
            pid,
        }
    }
}

/// Source of socket table snapshots
pub trait ConnectionTable: Send + Sync + 'static {
    /// Take a snapshot of all active sockets
    fn snapshot(&self) -> Result<Vec<SocketEntry>, PortWatchError>;

    /// Entries whose local port equals `port`, in table order
    fn entries_for_port(&self, port: u16) -> Result<Vec<SocketEntry>, PortWatchError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|e| e.local_port == port)
            .collect())
    }
}

/// Socket table backed by the OS (IPv4 + IPv6, TCP + UDP)
#[derive(Debug, Clone, Copy, Default)]
pub struct NetstatTable;

impl NetstatTable {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionTable for NetstatTable {
    fn snapshot(&self) -> Result<Vec<SocketEntry>, PortWatchError> {
        let af_flags = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
        let proto_flags = ProtocolFlags::TCP | ProtocolFlags::UDP;

        let sockets_info = get_sockets_info(af_flags, proto_flags)
            .map_err(|e| PortWatchError::ConnectionTable(e.to_string()))?;

        let mut entries = Vec::with_capacity(sockets_info.len());
        for si in sockets_info {
            let (local_port, remote_port, state) = match &si.protocol_socket_info {
                ProtocolSocketInfo::Tcp(tcp) => (tcp.local_port, tcp.remote_port, Some(tcp.state)),
                ProtocolSocketInfo::Udp(udp) => (udp.local_port, 0, None),
            };

            if si.associated_pids.is_empty() {
                entries.push(SocketEntry {
                    local_port,
                    remote_port,
                    state,
                    pid: None,
                });
                continue;
            }

            for pid in &si.associated_pids {
                entries.push(SocketEntry {
                    local_port,
                    remote_port,
                    state,
                    pid: Some(*pid),
                });
            }
        }

        Ok(entries)
    }
}

/// Distinct owner PIDs of sockets bound to `port`, ascending
pub fn owner_pids(entries: &[SocketEntry], port: u16) -> Vec<u32> {
    let mut pids: Vec<u32> = entries
        .iter()
        .filter(|e| e.local_port == port)
        .filter_map(|e| e.pid)
        .collect();

    // Same PID may own several sockets on the port
    pids.sort_unstable();
    pids.dedup();
    pids
}
