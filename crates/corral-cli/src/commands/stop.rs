//! Stop command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Arguments for the stop command.
#[derive(Args)]
pub struct StopArgs {
    /// Container ID
    pub id: String,

    /// Force the stop; the interior decides what escalation means
    #[arg(long)]
    pub force: bool,
}

/// Executes the stop command.
pub async fn execute(args: StopArgs, client: &DaemonClient) -> Result<()> {
    client
        .post_empty(
            "/container.stop",
            Some(json!({"id": args.id, "force": args.force})),
        )
        .await?;
    println!("{}", args.id);
    Ok(())
}
