//! Port status values and their display classification

use crate::conntable::{SocketEntry, TcpState};

/// Live status of a monitored port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortStatus {
    Listening,
    Established,
    TimeWait,
    CloseWait,
    Closed,
    Closing,
    Error,
}

impl PortStatus {
    /// Every status value
    pub const ALL: [PortStatus; 7] = [
        PortStatus::Listening,
        PortStatus::Established,
        PortStatus::TimeWait,
        PortStatus::CloseWait,
        PortStatus::Closed,
        PortStatus::Closing,
        PortStatus::Error,
    ];

    /// Human-readable status text
    pub fn label(&self) -> &'static str {
        match self {
            PortStatus::Listening => "Listening",
            PortStatus::Established => "Established",
            PortStatus::TimeWait => "Time wait",
            PortStatus::CloseWait => "Close wait",
            PortStatus::Closed => "Closed",
            PortStatus::Closing => "Closing",
            PortStatus::Error => "Error",
        }
    }

    /// Parse a status label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }

    pub fn color_class(&self) -> ColorClass {
        match self {
            PortStatus::Listening | PortStatus::Established => ColorClass::Healthy,
            PortStatus::Closed | PortStatus::Error => ColorClass::Fault,
            PortStatus::TimeWait | PortStatus::CloseWait | PortStatus::Closing => {
                ColorClass::Transitional
            }
        }
    }

    pub fn color(&self) -> Color {
        self.color_class().color()
    }

    /// Whether a close control should be offered for a port in this state
    ///
    /// `Closing` is deliberately ineligible along with `Closed` and `Error`.
    pub fn eligible_for_close(&self) -> bool {
        match self {
            PortStatus::Closed | PortStatus::Closing | PortStatus::Error => false,
            PortStatus::Listening
            | PortStatus::Established
            | PortStatus::TimeWait
            | PortStatus::CloseWait => true,
        }
    }
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display grouping of statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Healthy,
    Fault,
    Transitional,
}

impl ColorClass {
    pub fn color(&self) -> Color {
        match self {
            ColorClass::Healthy => Color::Green,
            ColorClass::Fault => Color::Red,
            ColorClass::Transitional => Color::Amber,
        }
    }
}

/// Status text color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    Red,
    Amber,
    /// Anything that is not a known status
    Alarm,
}

impl Color {
    /// Tk-style color name
    pub fn name(&self) -> &'static str {
        match self {
            Color::Green => "lawn green",
            Color::Red => "red3",
            Color::Amber => "gold",
            Color::Alarm => "firebrick1",
        }
    }
}

/// Color for a raw status label; unknown labels get the alarm color
pub fn color_for_label(label: &str) -> Color {
    PortStatus::from_label(label)
        .map(|s| s.color())
        .unwrap_or(Color::Alarm)
}

/// Status implied by a socket table TCP state, if it is decisive
pub fn status_from_tcp_state(state: TcpState) -> Option<PortStatus> {
    match state {
        TcpState::Listen => Some(PortStatus::Listening),
        TcpState::Established => Some(PortStatus::Established),
        TcpState::TimeWait => Some(PortStatus::TimeWait),
        TcpState::CloseWait => Some(PortStatus::CloseWait),
        TcpState::Closing => Some(PortStatus::Closing),
        _ => None,
    }
}

/// Status of `port` after a successful connect, from a table snapshot
///
/// The first entry for the port with a decisive state wins. No such entry
/// means the socket went away between connect and lookup: `Closed`.
pub fn classify_entries(entries: &[SocketEntry], port: u16) -> PortStatus {
    entries
        .iter()
        .filter(|e| e.local_port == port)
        .filter_map(|e| e.state)
        .find_map(status_from_tcp_state)
        .unwrap_or(PortStatus::Closed)
}
