//! Create command implementation.

use crate::client::DaemonClient;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Container ID
    pub id: String,

    /// Path to a JSON configuration file, or '-' for stdin
    pub config: PathBuf,
}

/// Executes the create command.
pub async fn execute(args: CreateArgs, client: &DaemonClient) -> Result<()> {
    let raw = if args.config.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read configuration from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.config)
            .with_context(|| format!("failed to read {}", args.config.display()))?
    };

    let conf: serde_json::Value =
        serde_json::from_str(&raw).context("configuration is not valid JSON")?;

    client
        .post_empty("/container.create", Some(json!({"id": args.id, "conf": conf})))
        .await?;

    println!("{}", args.id);
    Ok(())
}
