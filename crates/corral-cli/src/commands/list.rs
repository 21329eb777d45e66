//! List command implementation.

use crate::client::DaemonClient;
use anyhow::Result;
use clap::Args;
use serde::Deserialize;
use serde_json::json;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Only print container IDs
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Deserialize)]
struct ListResponse {
    ids: Vec<String>,
}

/// Executes the list command.
pub async fn execute(args: ListArgs, client: &DaemonClient) -> Result<()> {
    let response: ListResponse = client.post("/container.list", Some(json!({}))).await?;

    if args.quiet {
        for id in &response.ids {
            println!("{id}");
        }
        return Ok(());
    }

    println!("{:<20} {:<12} {:<12}", "ID", "STATE", "INTERIOR");
    for id in &response.ids {
        // The listing is not a consistent snapshot: an entry may vanish
        // between list and query.
        let snapshot: serde_json::Value = match client
            .post("/container.query", Some(json!({"id": id})))
            .await
        {
            Ok(snapshot) => snapshot,
            Err(_) => continue,
        };
        println!(
            "{:<20} {:<12} {:<12}",
            id,
            snapshot["state"].as_str().unwrap_or("-"),
            snapshot["interiorState"].as_str().unwrap_or("-"),
        );
    }

    Ok(())
}
