// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use codio_cli::{Cli, Commands, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.logging.init("codio")?;

    match &cli.command {
        Commands::Inspect(args) => args.run().await,
        Commands::Frame(args) => args.run().await,
        Commands::Play(args) => {
            let config = cli.load_config(args.workspace.as_deref())?;
            args.run(&config).await
        }
        Commands::Record(args) => {
            let config = cli.load_config(Some(&args.workspace))?;
            args.run(&config).await
        }
    }
}
