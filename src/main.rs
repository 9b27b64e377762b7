use anyhow::Context;
use clap::Parser;
use firemigrate::cli::{self, Args};
use firemigrate::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> firemigrate::Result<ExitCode> {
    // A missing .env is the normal case on operator machines.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let command = args.command_or_default();
    let _guard = logging::init(&command).context("failed to initialize logging")?;

    Ok(cli::run(command).await)
}
