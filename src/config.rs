//! Configuration file loader for port-watch
//!
//! Loads ~/.config/port-watch/config.toml: monitor timing, the close
//! signal, and the list of ports to watch.

use crate::error::PortWatchError;
use crate::prober::{DEFAULT_HOST, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_PROBE_TIMEOUT};
use crate::registry::{PortSpec, Registry};
use crate::scheduler::{DEFAULT_INTERVAL, DEFAULT_SHUTDOWN_GRACE};
use crate::signal::Signal;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Timing and close behavior
    pub monitor: MonitorSettings,
    /// Individually named ports
    pub ports: Vec<PortEntry>,
    /// Generated groups of numbered ports
    pub port_groups: Vec<PortGroup>,
}

/// `[monitor]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorSettings {
    pub host: String,
    pub interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub lookup_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
    pub close_signal: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT.as_millis() as u64,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE.as_millis() as u64,
            close_signal: Signal::default().name().to_string(),
        }
    }
}

/// `[[ports]]` entry
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub name: String,
    pub port: u16,
}

/// `[[port_groups]]` entry: `"{prefix} {n}"` for each port in `ports`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PortGroup {
    pub prefix: String,
    #[serde(default = "default_first_index")]
    pub first_index: u32,
    /// Single port "8080" or inclusive range "8081-8089"
    pub ports: String,
}

fn default_first_index() -> u32 {
    1
}

impl PortGroup {
    /// Expand into named specs
    pub fn expand(&self) -> Result<Vec<PortSpec>, PortWatchError> {
        let range = PortRange::parse(&self.ports)?;
        range
            .ports()
            .enumerate()
            .map(|(offset, port)| -> Result<PortSpec, PortWatchError> {
                let index = u32::try_from(offset)
                    .ok()
                    .and_then(|offset| self.first_index.checked_add(offset))
                    .ok_or_else(|| {
                        PortWatchError::InvalidPortSpec(format!(
                            "{}: first_index {} overflows over {} ports",
                            self.prefix, self.first_index, self.ports
                        ))
                    })?;
                Ok(PortSpec::new(format!("{} {}", self.prefix, index), port))
            })
            .collect()
    }
}

/// Represents a port range or single port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRange {
    /// Single port number
    Single(u16),
    /// Port range (inclusive)
    Range { start: u16, end: u16 },
}

impl PortRange {
    /// Parse a port specification string into PortRange
    ///
    /// Supports:
    /// - Single port: "3306"
    /// - Range: "3000-3100"
    pub fn parse(spec: &str) -> Result<Self, PortWatchError> {
        let spec = spec.trim();
        let invalid = || PortWatchError::InvalidPortSpec(spec.to_string());

        if let Some((start, end)) = spec.split_once('-') {
            let start = start.trim().parse::<u16>().map_err(|_| invalid())?;
            let end = end.trim().parse::<u16>().map_err(|_| invalid())?;

            if start > end {
                return Err(invalid());
            }

            Ok(PortRange::Range { start, end })
        } else {
            let port = spec.parse::<u16>().map_err(|_| invalid())?;
            Ok(PortRange::Single(port))
        }
    }

    /// Ports covered, ascending
    pub fn ports(&self) -> std::ops::RangeInclusive<u16> {
        match self {
            PortRange::Single(p) => *p..=*p,
            PortRange::Range { start, end } => *start..=*end,
        }
    }
}

/// Runtime settings derived from `[monitor]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    pub host: String,
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub lookup_timeout: Duration,
    pub shutdown_grace: Duration,
    pub close_signal: Signal,
}

impl Config {
    /// Load configuration from ~/.config/port-watch/config.toml
    ///
    /// Returns default config if file doesn't exist.
    /// Returns default config with warning on parse error.
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a file that must exist and parse
    pub fn from_file(path: &Path) -> Result<Self, PortWatchError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PortWatchError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| PortWatchError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, PortWatchError> {
        toml::from_str::<Config>(content).map_err(|e| PortWatchError::ConfigError(e.to_string()))
    }

    /// Get the default config file path (XDG-compliant)
    ///
    /// Returns `~/.config/port-watch/config.toml` on Linux
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|config_dir| config_dir.join("port-watch"))
    }

    /// Ports watched when the config names none
    pub fn default_ports() -> Vec<PortEntry> {
        vec![
            PortEntry {
                name: "http".to_string(),
                port: 80,
            },
            PortEntry {
                name: "test API 1".to_string(),
                port: 8080,
            },
        ]
    }

    /// Port groups used when the config names no ports
    pub fn default_port_groups() -> Vec<PortGroup> {
        vec![PortGroup {
            prefix: "test API".to_string(),
            first_index: 3,
            ports: "8081-8089".to_string(),
        }]
    }

    /// Build the registry: named ports first, then expanded groups
    pub fn registry(&self) -> Result<Registry, PortWatchError> {
        let (ports, groups) = if self.ports.is_empty() && self.port_groups.is_empty() {
            (Self::default_ports(), Self::default_port_groups())
        } else {
            (self.ports.clone(), self.port_groups.clone())
        };

        let mut specs: Vec<PortSpec> = ports
            .into_iter()
            .map(|p| PortSpec::new(p.name, p.port))
            .collect();
        for group in &groups {
            specs.extend(group.expand()?);
        }

        Registry::from_specs(specs)
    }

    /// Runtime options from `[monitor]`
    pub fn options(&self) -> Result<MonitorOptions, PortWatchError> {
        let m = &self.monitor;
        if m.interval_ms == 0 {
            return Err(PortWatchError::ConfigError(
                "monitor.interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(MonitorOptions {
            host: m.host.clone(),
            interval: Duration::from_millis(m.interval_ms),
            probe_timeout: Duration::from_millis(m.probe_timeout_ms),
            lookup_timeout: Duration::from_millis(m.lookup_timeout_ms),
            shutdown_grace: Duration::from_millis(m.shutdown_grace_ms),
            close_signal: Signal::parse(&m.close_signal)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_port_range_parse_single() {
        assert_eq!(PortRange::parse("8080").unwrap(), PortRange::Single(8080));
        assert_eq!(PortRange::parse(" 80 ").unwrap(), PortRange::Single(80));
    }

    #[test]
    fn test_port_range_parse_range() {
        assert_eq!(
            PortRange::parse("8081-8089").unwrap(),
            PortRange::Range {
                start: 8081,
                end: 8089
            }
        );
        assert_eq!(
            PortRange::parse("3000 - 3001").unwrap(),
            PortRange::Range {
                start: 3000,
                end: 3001
            }
        );
    }

    #[test]
    fn test_port_range_parse_invalid() {
        for spec in ["", "abc", "70000", "9000-80", "1-2-3", "-5"] {
            assert!(
                matches!(PortRange::parse(spec), Err(PortWatchError::InvalidPortSpec(_))),
                "{:?} should be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_port_range_ports() {
        let ports: Vec<u16> = PortRange::parse("10-12").unwrap().ports().collect();
        assert_eq!(ports, vec![10, 11, 12]);
        assert_eq!(PortRange::Single(7).ports().count(), 1);
    }

    #[test]
    fn test_port_group_expand() {
        let group = PortGroup {
            prefix: "worker".to_string(),
            first_index: 3,
            ports: "9000-9002".to_string(),
        };
        let specs = group.expand().unwrap();
        assert_eq!(
            specs,
            vec![
                PortSpec::new("worker 3", 9000),
                PortSpec::new("worker 4", 9001),
                PortSpec::new("worker 5", 9002),
            ]
        );
    }

    #[test]
    fn test_port_group_index_overflow_is_error() {
        let config = Config::parse(
            r#"
[[port_groups]]
prefix = "edge"
first_index = 4294967295
ports = "1-2"
"#,
        )
        .unwrap();

        match config.registry() {
            Err(PortWatchError::InvalidPortSpec(msg)) => assert!(msg.contains("edge")),
            other => panic!("Expected InvalidPortSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_port_group_last_index_fits() {
        let group = PortGroup {
            prefix: "edge".to_string(),
            first_index: u32::MAX,
            ports: "1".to_string(),
        };
        assert_eq!(
            group.expand().unwrap(),
            vec![PortSpec::new(format!("edge {}", u32::MAX), 1)]
        );
    }

    #[test]
    fn test_default_registry() {
        let registry = Config::default().registry().unwrap();
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.get("http").map(|s| s.port), Some(80));
        assert_eq!(registry.get("test API 1").map(|s| s.port), Some(8080));
        assert_eq!(registry.get("test API 3").map(|s| s.port), Some(8081));
        assert_eq!(registry.get("test API 11").map(|s| s.port), Some(8089));
        assert!(registry.get("test API 2").is_none());
    }

    #[test]
    fn test_default_options() {
        let options = Config::default().options().unwrap();
        assert_eq!(options.host, "localhost");
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.probe_timeout, Duration::from_secs(1));
        assert_eq!(options.lookup_timeout, Duration::from_millis(500));
        assert_eq!(options.shutdown_grace, Duration::from_millis(500));
        assert_eq!(options.close_signal, Signal::SIGTERM);
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
[monitor]
host = "127.0.0.1"
interval_ms = 250
close_signal = "KILL"

[[ports]]
name = "web"
port = 3000

[[port_groups]]
prefix = "api"
ports = "4000-4001"
"#,
        )
        .unwrap();

        let options = config.options().unwrap();
        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.interval, Duration::from_millis(250));
        // Unset fields keep their defaults
        assert_eq!(options.probe_timeout, Duration::from_secs(1));
        assert_eq!(options.close_signal, Signal::SIGKILL);

        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["web", "api 1", "api 2"]);
    }

    #[test]
    fn test_configured_ports_replace_defaults() {
        let config = Config::parse("[[ports]]\nname = \"db\"\nport = 5432\n").unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["db"]);
    }

    #[test]
    fn test_registry_duplicate_name_is_error() {
        let config = Config::parse(
            r#"
[[ports]]
name = "api 1"
port = 1

[[port_groups]]
prefix = "api"
ports = "2"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.registry(),
            Err(PortWatchError::DuplicateName(name)) if name == "api 1"
        ));
    }

    #[test]
    fn test_registry_bad_group_range_is_error() {
        let config = Config::parse("[[port_groups]]\nprefix = \"x\"\nports = \"9-1\"\n").unwrap();
        assert!(matches!(
            config.registry(),
            Err(PortWatchError::InvalidPortSpec(_))
        ));
    }

    #[test]
    fn test_options_reject_bad_signal() {
        let config = Config::parse("[monitor]\nclose_signal = \"SIGFOO\"\n").unwrap();
        assert!(matches!(
            config.options(),
            Err(PortWatchError::InvalidSignal(_))
        ));
    }

    #[test]
    fn test_options_reject_zero_interval() {
        let config = Config::parse("[monitor]\ninterval_ms = 0\n").unwrap();
        assert!(matches!(
            config.options(),
            Err(PortWatchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(matches!(
            Config::parse("this is not valid TOML {{"),
            Err(PortWatchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(path.to_string_lossy().contains("port-watch"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_load_from_nonexistent_path() {
        let config = Config::load_from_path(Some(PathBuf::from("/nonexistent/port-watch.toml")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_none_path() {
        assert_eq!(Config::load_from_path(None), Config::default());
    }

    #[test]
    fn test_load_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[ports]]\nname = \"redis\"\nport = 6379").unwrap();

        let config = Config::load_from_path(Some(file.path().to_path_buf()));
        assert_eq!(config.ports.len(), 1);
        assert_eq!(config.ports[0].name, "redis");
    }

    #[test]
    fn test_load_invalid_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[ports]]\nname = 42").unwrap();

        let config = Config::load_from_path(Some(file.path().to_path_buf()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let result = Config::from_file(Path::new("/nonexistent/port-watch.toml"));
        assert!(matches!(result, Err(PortWatchError::ConfigError(_))));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let config = Config::load_from_path(Some(file.path().to_path_buf()));
        assert_eq!(config, Config::default());
        assert_eq!(config.registry().unwrap().len(), 11);
    }
}
