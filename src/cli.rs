//! This module provides the CLI interface of the requester.
//!
//! ```shell
//! $ requester run --help
//! Run requests against the target URL
//!
//! Usage: requester run [OPTIONS]
//!
//! Options:
//!       --cfg <CFG>
//!           Path to the YAML config file
//!
//!           Used when --url is not given.
//!
//!           [default: cfg.yaml]
//!
//!       --url <URL>
//!           Target URL
//!
//!       --amount <AMOUNT>
//!           Total number of requests to send
//!
//!       --per-second <PER_SECOND>
//!           Maximum number of requests issued per second
//!
//!   -t, --timeout <TIMEOUT>
//!           Timeout of a single request
//!
//!           Examples: -t 500ms, -t 10s
//! ```
use std::path::PathBuf;

use clap::{
    Args, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use tokio_util::sync::CancellationToken;

use crate::{dispatcher::Dispatcher, poster::Poster, request::RequestSpec};

/// Command line interface of the requester.
#[derive(Parser, Clone, Debug)]
#[clap(
    version,
    about,
    styles(Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
    )
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Run requests against the target URL
    Run(RunArgs),
}

/// Options of the `run` subcommand.
#[derive(Args, Clone, Debug)]
#[allow(missing_docs)]
pub struct RunArgs {
    /// Path to the YAML config file
    ///
    /// Used when --url is not given.
    #[clap(long, default_value = "cfg.yaml")]
    pub cfg: PathBuf,

    /// Target URL
    #[clap(long, requires = "amount", requires = "per_second", conflicts_with = "cfg")]
    pub url: Option<String>,

    /// Total number of requests to send
    #[clap(long, requires = "url")]
    pub amount: Option<u64>,

    /// Maximum number of requests issued per second
    #[clap(long, requires = "url")]
    pub per_second: Option<u32>,

    /// Timeout of a single request
    ///
    /// Examples: -t 500ms, -t 10s
    #[clap(long, short = 't')]
    pub timeout: Option<humantime::Duration>,
}

impl RunArgs {
    /// Assemble the request spec from direct parameters, or from the config file when
    /// no URL was given.
    pub fn request_spec(&self) -> crate::Result<RequestSpec> {
        match (&self.url, self.amount, self.per_second) {
            (Some(url), Some(amount), Some(per_second)) => {
                Ok(RequestSpec::new(url.clone(), amount, per_second))
            }
            _ => RequestSpec::from_file(&self.cfg),
        }
    }
}

/// Run the requests described by `args` through `poster` until done or cancelled.
///
/// The run is cancelled on Ctrl-C, and on SIGTERM on unix. Requests already issued are
/// still awaited before this returns.
pub async fn run<P>(args: &RunArgs, poster: P) -> anyhow::Result<()>
where
    P: Poster + 'static,
{
    let spec = args.request_spec()?;

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(cancel_on_signal(cancel.clone()));

    let res = Dispatcher::new(poster).run(&cancel, &spec).await;
    signals.abort();

    Ok(res?)
}

async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                log::warn!("Failed to listen for SIGTERM: {}", _e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => (),
        _ = terminate => (),
    }

    #[cfg(feature = "tracing")]
    log::warn!("Received shutdown signal, stopping");
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<RunArgs, clap::Error> {
        let cli = Cli::try_parse_from(std::iter::once("requester").chain(args.iter().copied()))?;
        let Command::Run(args) = cli.command;
        Ok(args)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_direct_parameters() {
        let args = parse(&["run", "--url", "http://x.test", "--amount", "5", "--per-second", "2"]).unwrap();
        assert_eq!(args.request_spec().unwrap(), RequestSpec::new("http://x.test", 5, 2));
    }

    #[test]
    fn test_direct_parameters_required_together() {
        assert!(parse(&["run", "--url", "http://x.test"]).is_err());
        assert!(parse(&["run", "--url", "http://x.test", "--amount", "5"]).is_err());
        assert!(parse(&["run", "--amount", "5", "--per-second", "2"]).is_err());
        assert!(parse(&["run", "--per-second", "2"]).is_err());
    }

    #[test]
    fn test_direct_parameters_conflict_with_config() {
        let args = ["run", "--cfg", "a.yaml", "--url", "http://x.test", "--amount", "5", "--per-second", "2"];
        assert!(parse(&args).is_err());
    }

    #[test]
    fn test_default_config_path() {
        let args = parse(&["run"]).unwrap();
        assert_eq!(args.cfg, PathBuf::from("cfg.yaml"));
        assert!(args.url.is_none());
    }

    #[test]
    fn test_config_source_when_no_url() {
        let args = parse(&["run", "--cfg", "/nonexistent/requester.yaml"]).unwrap();
        assert!(matches!(args.request_spec(), Err(crate::Error::ConfigOpen { .. })));
    }

    #[test]
    fn test_timeout() {
        let args = parse(&["run", "-t", "500ms"]).unwrap();
        assert_eq!(args.timeout.map(|t| *t), Some(std::time::Duration::from_millis(500)));
    }
}
