//! Destroy command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Arguments for the destroy command.
#[derive(Args)]
pub struct DestroyArgs {
    /// Container ID
    pub id: String,
}

/// Executes the destroy command.
pub async fn execute(args: DestroyArgs, client: &DaemonClient) -> Result<()> {
    client
        .post_empty("/container.destroy", Some(json!({"id": args.id})))
        .await?;
    println!("{}", args.id);
    Ok(())
}
