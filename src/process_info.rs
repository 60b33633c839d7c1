//! Owner process lookup using sysinfo
//!
//! Only used to put names on the PIDs a close operation touches.

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Information about a single process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Process name
    pub name: String,
}

/// Provider for process information using sysinfo
pub struct ProcessInfoProvider {
    system: System,
}

impl ProcessInfoProvider {
    /// Create a provider with information for `pids` only
    pub fn for_pids(pids: &[u32]) -> Self {
        let mut system = System::new();
        let pids: Vec<Pid> = pids.iter().map(|p| Pid::from_u32(*p)).collect();
        system.refresh_processes(ProcessesToUpdate::Some(&pids), true);
        Self { system }
    }

    /// Get process information by PID
    pub fn get(&self, pid: u32) -> Option<ProcessInfo> {
        self.system
            .process(Pid::from_u32(pid))
            .map(|proc| ProcessInfo {
                pid,
                name: proc.name().to_string_lossy().to_string(),
            })
    }

    /// Process name, or `pid:N` when the process is unknown
    pub fn name_of(&self, pid: u32) -> String {
        self.get(pid)
            .map(|p| p.name)
            .unwrap_or_else(|| format!("pid:{}", pid))
    }

    /// Get current process PID
    pub fn current_pid() -> u32 {
        std::process::id()
    }
}
