//! Monitor command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;

/// Arguments for the monitor command.
#[derive(Args)]
pub struct MonitorArgs {}

/// Executes the monitor command: streams container events as JSON lines
/// until interrupted or the daemon goes away.
pub async fn execute(_args: MonitorArgs, client: &DaemonClient) -> Result<()> {
    client
        .stream_lines("/events", |line| {
            println!("{line}");
        })
        .await
}
