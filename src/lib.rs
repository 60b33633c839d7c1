//! port-watch: Concurrent local TCP port monitor
//!
//! This library polls a registry of named ports, classifies each one into a
//! `PortStatus`, and reconciles every cycle's results into the minimal list
//! of view operations. It can also close a port by terminating the
//! processes that own it.

pub mod cli;
pub mod closer;
pub mod config;
pub mod conntable;
pub mod error;
pub mod init;
pub mod monitor;
pub mod process_info;
pub mod prober;
pub mod reconciler;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod signal;
pub mod status;
