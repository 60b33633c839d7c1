//! port-watch: Watch local TCP ports and close them
//!
//! Polls a registry of named ports, prints the minimal set of view
//! changes per cycle, and terminates a port's owners on request.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};

use port_watch::cli::{CliArgs, ExecutionMode};
use port_watch::closer::{CloseReport, PortCloser, TerminationOutcome};
use port_watch::config::{Config, MonitorOptions};
use port_watch::conntable::NetstatTable;
use port_watch::error::PortWatchError;
use port_watch::init::InitCommand;
use port_watch::monitor::{Control, Monitor, ViewSink};
use port_watch::registry::Registry;
use port_watch::render::TextRenderer;
use port_watch::signal::{Signal, SignalSender};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("port-watch: {}", e);
            e.exit_code().into()
        }
    }
}

/// Main execution logic
fn run() -> Result<(), PortWatchError> {
    let args = CliArgs::parse_args();
    let mode = args.validate()?;

    if let ExecutionMode::InitConfig { force } = mode {
        let path = match args.config {
            Some(ref path) => InitCommand::execute_at(path, force)?,
            None => InitCommand::execute(force)?,
        };
        println!("Created: {}", path.display());
        println!();
        println!("Hint: Edit the config file to choose which ports to watch.");
        println!("      Then run `port-watch` to start watching.");
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    let mut options = config.options()?;
    args.apply_overrides(&mut options)?;

    match mode {
        ExecutionMode::Close(port) => close(port, args.yes, options.close_signal),
        ExecutionMode::Once => {
            let registry = config.registry()?;
            runtime()?.block_on(once(registry, options));
            Ok(())
        }
        ExecutionMode::Watch => {
            let registry = config.registry()?;
            runtime()?.block_on(watch_ports(registry, options, args.config))
        }
        ExecutionMode::InitConfig { .. } => Ok(()),
    }
}

/// An explicit config file must exist and parse; the default one may not exist
fn load_config(path: Option<&Path>) -> Result<Config, PortWatchError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::load()),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, PortWatchError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| PortWatchError::SystemError(format!("Failed to start runtime: {}", e)))
}

async fn once(registry: Registry, options: MonitorOptions) {
    let mut monitor = Monitor::with_options(registry, &options, NetstatTable::new());
    let ops = monitor.tick().await;
    TextRenderer::stdout().apply(&ops);
}

/// Watch until Ctrl+C; SIGHUP reloads the registry from the config file
async fn watch_ports(
    registry: Registry,
    options: MonitorOptions,
    config_path: Option<PathBuf>,
) -> Result<(), PortWatchError> {
    let mut monitor = Monitor::with_options(registry, &options, NetstatTable::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let (control_tx, mut control_rx) = mpsc::unbounded_channel();

    let mut hangup = signal(SignalKind::hangup()).map_err(|e| {
        PortWatchError::SystemError(format!("Failed to install SIGHUP handler: {}", e))
    })?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!("Ctrl+C handler failed: {}", e);
                    }
                    info!("stop requested");
                    let _ = stop_tx.send(true);
                    break;
                }
                Some(()) = hangup.recv() => {
                    match reload_registry(config_path.as_deref()) {
                        Ok(registry) => {
                            if control_tx.send(Control::Replace(registry)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("config reload failed, keeping current ports: {}", e),
                    }
                }
            }
        }
    });

    let mut renderer = TextRenderer::stdout();
    monitor.run(&mut renderer, &mut control_rx, stop_rx).await;
    Ok(())
}

fn reload_registry(path: Option<&Path>) -> Result<Registry, PortWatchError> {
    load_config(path)?.registry()
}

fn close(port: u16, yes: bool, signal: Signal) -> Result<(), PortWatchError> {
    if !yes && !confirm_close(port)? {
        return Err(PortWatchError::Cancelled);
    }

    let closer = PortCloser::new(NetstatTable::new(), SignalSender).with_signal(signal);
    let report = closer.close_port(port)?;
    for line in close_report_lines(&report) {
        println!("{}", line);
    }
    match report.first_failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Ask user for confirmation before terminating a port's owners
fn confirm_close(port: u16) -> Result<bool, PortWatchError> {
    eprint!("Do you want to close port {}? [y/N]: ", port);
    io::stderr()
        .flush()
        .map_err(|e| PortWatchError::SystemError(format!("Failed to flush stderr: {}", e)))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| PortWatchError::SystemError(format!("Failed to read input: {}", e)))?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Acknowledgment followed by one line per owner process
fn close_report_lines(report: &CloseReport) -> Vec<String> {
    let header = if report.all_success() {
        format!("Port {} closed successfully.", report.port)
    } else {
        format!("Port {} could not be fully closed:", report.port)
    };
    let mut lines = vec![header];
    if report.is_empty() {
        lines.push("  No process was using it.".to_string());
    }
    for r in &report.results {
        let mark = match r.outcome {
            TerminationOutcome::Terminated => "✓",
            TerminationOutcome::AlreadyExited | TerminationOutcome::Skipped => "-",
            TerminationOutcome::PermissionDenied | TerminationOutcome::Failed(_) => "✗",
        };
        lines.push(format!(
            "  {} {} (PID {}): {}",
            mark,
            r.name,
            r.pid,
            r.message(report.signal)
        ));
    }
    lines
}
