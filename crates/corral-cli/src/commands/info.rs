//! Info command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Container ID
    pub id: String,
}

/// Executes the info command.
pub async fn execute(args: InfoArgs, client: &DaemonClient) -> Result<()> {
    let snapshot: serde_json::Value = client
        .post("/container.query", Some(json!({"id": args.id})))
        .await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
