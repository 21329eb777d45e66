//! Start command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Container ID
    pub id: String,
}

/// Executes the start command.
pub async fn execute(args: StartArgs, client: &DaemonClient) -> Result<()> {
    client
        .post_empty("/container.start", Some(json!({"id": args.id})))
        .await?;
    println!("{}", args.id);
    Ok(())
}
