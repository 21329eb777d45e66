//! Corral CLI - thin client for the container lifecycle daemon.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "corral=debug,corral_cli=debug"
    } else {
        "corral=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let client = client::connect(cli.socket).await?;

    match cli.command {
        Commands::Create(args) => commands::create::execute(args, &client).await,
        Commands::Destroy(args) => commands::destroy::execute(args, &client).await,
        Commands::Start(args) => commands::start::execute(args, &client).await,
        Commands::Stop(args) => commands::stop::execute(args, &client).await,
        Commands::List(args) => commands::list::execute(args, &client).await,
        Commands::Info(args) => commands::info::execute(args, &client).await,
        Commands::Monitor(args) => commands::monitor::execute(args, &client).await,
    }
}
