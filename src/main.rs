//  [rgrant 20261015 14:20 UTC] staketax

#![forbid(unsafe_code)]

use directories::ProjectDirs;
use error_iter::ErrorIter as _;
use is_terminal::IsTerminal as _;
use onlyargs::CliError;
use onlyargs_derive::OnlyArgs;
use staketax::client::coinmarketcap::CoinMarketCapClient;
use staketax::client::polkascan::{PolkascanClient, PolkascanClientMemo};
use staketax::config::{Config, RawConfig};
use staketax::errors::{
    CoinMarketCapClientError, ConfigError, PolkascanClientError, PolkascanMemoError,
    ReconcileError,
};
use staketax::{reconcile, report};
use std::fs;
use std::path::PathBuf;
use std::{env, process::ExitCode};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

/// Value Polkadot and Kusama staking rewards in USD.
#[derive(Debug, OnlyArgs)]
#[footer = "Additional environment variables:"]
#[footer = "  - RUST_LOG sets the log filter, e.g. `debug`. Default is `info`"]
#[footer = "  - TERM_COLOR accepts \"always\" to override automatic terminal sensing"]
struct Args {
    /// Account address.
    account: String,

    /// Network, "polkadot" or "kusama".
    #[default("polkadot")]
    network: String,

    /// Interval between rewards, in hours.
    ///   Default is 24 for Polkadot and 6 for Kusama.
    era: Option<u64>,

    /// Polkascan API base URL.
    ///   Default is "https://explorer-32.polkascan.io".
    url: Option<String>,

    /// Number of concurrent block timestamp requests.
    ///   Default is 100.
    #[long]
    concurrent: Option<u64>,

    /// Only include rewards at or after this RFC 3339 date.
    ///   e.g. "2020-01-01T00:00:00+00:00"
    from: Option<String>,

    /// Only include rewards at or before this RFC 3339 date.
    ///   Defaults to now when `--from` is given.
    to: Option<String>,

    /// Write the report to a CSV file instead of printing a table.
    #[long]
    csv: Option<PathBuf>,

    /// CoinMarketCap API, "v3" (daily candles) or "v1" (era samples).
    ///   Default is "v3".
    #[long]
    quotes_api: Option<String>,

    /// Neither read nor write the block timestamp memo.
    #[long]
    no_memo: bool,
}

impl From<Args> for RawConfig {
    fn from(args: Args) -> Self {
        Self {
            account: args.account,
            network: args.network,
            era_hours: args.era,
            url: args.url,
            concurrency: args.concurrent,
            from: args.from,
            to: args.to,
            csv: args.csv,
            quotes_api: args.quotes_api,
            no_memo: args.no_memo,
        }
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("Argument parsing error")]
    Args(#[from] CliError),

    #[error("Invalid configuration")]
    Config(#[from] ConfigError),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Unable to locate user cache directory")]
    CacheDir,

    #[error("Polkascan client error")]
    PolkascanClient(#[from] PolkascanClientError),

    #[error("CoinMarketCap client error")]
    CoinMarketCapClient(#[from] CoinMarketCapClientError),

    #[error("Reconciliation failed")]
    Reconcile(#[from] ReconcileError),

    #[error("Unable to save block memo")]
    ClientMemo(#[from] PolkascanMemoError),
}

fn main() -> ExitCode {
    // Initialize the tracing subscriber for instrumentation.
    // Uses the `RUST_LOG` environment var for configuration. E.g. `RUST_LOG=debug cargo run`
    //
    // See: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/struct.EnvFilter.html#directives
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let term_color = env::var("TERM_COLOR")
        .map(|color| color == "always")
        .unwrap_or_else(|_| std::io::stdout().is_terminal());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(term_color))
        .with(env_filter)
        .init();

    match run(onlyargs::parse()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            for source in err.sources().skip(1) {
                eprintln!("  Caused by: {source}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(args: Result<Args, CliError>) -> Result<(), Error> {
    let config = Config::try_from(RawConfig::from(args?))?;
    let settings = &config.reconcile;

    match (settings.filter.start, settings.filter.end) {
        (Some(start), Some(end)) => info!(
            "Computing rewards for `{}` on {} between {start} and {end}",
            settings.account, settings.network
        ),
        _ => info!(
            "Computing rewards for `{}` on {}",
            settings.account, settings.network
        ),
    }

    // Find user's cache directory and make sure it exists.
    let cache_dir = if config.memo {
        let project_dir =
            ProjectDirs::from("design.contract", "DCD", "staketax").ok_or(Error::CacheDir)?;
        let cache_dir = project_dir.cache_dir().to_path_buf();
        fs::create_dir_all(&cache_dir)?;

        Some(cache_dir)
    } else {
        None
    };

    let memo = cache_dir
        .as_deref()
        .and_then(|cache_dir| PolkascanClientMemo::load(cache_dir, settings.network))
        .unwrap_or_default();
    let polkascan = PolkascanClient::from_memo(&config.url, settings.concurrency, memo)?;
    let cmc = CoinMarketCapClient::new(config.quotes_api, settings.era)?;

    let mut sink = report::sink_for(config.csv.as_deref(), settings.network);
    reconcile::run(settings, &polkascan, &polkascan, &cmc, sink.as_mut())?;

    // The memo is only saved after a successful run.
    if let Some(cache_dir) = cache_dir {
        polkascan.into_memo().save(&cache_dir, settings.network)?;
    }

    if let Some(path) = &config.csv {
        info!("Report written to {path:?}");
    }

    Ok(())
}
