use anyhow::Result;
use clap::Parser;
use requester::{
    HttpPoster,
    cli::{self, Cli, Command},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Command::Run(args) = Cli::parse().command;
    let poster = HttpPoster::new(args.timeout.map(Into::into))?;

    if let Err(e) = cli::run(&args, poster).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
