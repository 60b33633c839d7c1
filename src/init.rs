//! Init command module for port-watch
//!
//! Generates configuration file with sample settings.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::PortWatchError;

/// Init command for generating configuration file
pub struct InitCommand;

impl InitCommand {
    /// Write the sample config to the default location
    ///
    /// # Arguments
    /// * `force` - If true, overwrite existing file without confirmation
    pub fn execute(force: bool) -> Result<PathBuf, PortWatchError> {
        let config_path = Config::config_path().ok_or_else(|| {
            PortWatchError::ConfigCreationError("Unable to determine config path".to_string())
        })?;
        Self::execute_at(&config_path, force)
    }

    /// Write the sample config to `path`
    pub fn execute_at(path: &Path, force: bool) -> Result<PathBuf, PortWatchError> {
        if path.exists() && !force && !Self::confirm_overwrite(path)? {
            return Err(PortWatchError::Cancelled);
        }

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                PortWatchError::ConfigCreationError(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        fs::write(path, Self::default_config_content()).map_err(|e| {
            PortWatchError::ConfigCreationError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(path.to_path_buf())
    }

    /// Generate default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# port-watch configuration file

# Monitor timing. All values in milliseconds.
[monitor]
host = "localhost"
interval_ms = 1000
probe_timeout_ms = 1000
lookup_timeout_ms = 500
# Grace period for an in-flight cycle when stopping
shutdown_grace_ms = 500
# Signal sent to a port's owner processes by --close (name or number)
close_signal = "SIGTERM"

# Individually named ports. Names must be unique.
[[ports]]
name = "http"
port = 80

[[ports]]
name = "test API 1"
port = 8080

# Numbered groups: "test API 3" .. "test API 11" on 8081-8089.
# `ports` is a single port ("8080") or an inclusive range ("8081-8089").
[[port_groups]]
prefix = "test API"
first_index = 3
ports = "8081-8089"
"#
        .to_string()
    }

    /// Ask user for confirmation to overwrite existing file
    fn confirm_overwrite(path: &Path) -> Result<bool, PortWatchError> {
        eprint!(
            "Config file already exists at {}. Overwrite? [y/N]: ",
            path.display()
        );
        io::stderr().flush().map_err(|e| {
            PortWatchError::ConfigCreationError(format!("Failed to flush stderr: {}", e))
        })?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(|e| {
            PortWatchError::ConfigCreationError(format!("Failed to read input: {}", e))
        })?;

        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }
}
