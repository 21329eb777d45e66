//! CLI command implementations.
//!
//! Each subcommand is a thin shell over the daemon's service API:
//!
//! - Lifecycle operations (create, destroy, start, stop)
//! - Inspection (list, info)
//! - Event streaming (monitor)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod create;
pub mod destroy;
pub mod info;
pub mod list;
pub mod monitor;
pub mod start;
pub mod stop;

/// Corral - container lifecycle manager
#[derive(Parser)]
#[command(name = "corral")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Unix socket path for daemon connection
    ///
    /// Can also be set via the CORRAL_SOCKET environment variable.
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a container from a configuration file
    Create(create::CreateArgs),

    /// Destroy a container
    Destroy(destroy::DestroyArgs),

    /// Start a container
    Start(start::StartArgs),

    /// Stop a container
    Stop(stop::StopArgs),

    /// List containers
    List(list::ListArgs),

    /// Show detailed information about a container
    Info(info::InfoArgs),

    /// Stream container events
    Monitor(monitor::MonitorArgs),
}
