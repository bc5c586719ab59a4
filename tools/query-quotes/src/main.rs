#![forbid(unsafe_code)]

use chrono::{DateTime, TimeDelta, Utc};
use error_iter::ErrorIter as _;
use onlyargs::{CliError, OnlyArgs as _};
use onlyargs_derive::OnlyArgs;
use staketax::client::coinmarketcap::{CoinMarketCapClient, QuotesApi};
use staketax::model::{constants::QUOTE_PADDING_HOURS, Network};
use staketax::reconcile::fetch_covering;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Debug, Error)]
enum Error {
    #[error("CLI error")]
    Cli(#[from] CliError),

    #[error("DateTime parsing error")]
    DateTime(#[from] chrono::ParseError),

    #[error("Network error")]
    Network(#[from] staketax::errors::NetworkError),

    #[error("CoinMarketCap client error")]
    Client(#[from] staketax::errors::CoinMarketCapClientError),

    #[error("Quote range error")]
    Range(#[from] staketax::errors::RangeError),

    #[error("Quote match error")]
    Match(#[from] staketax::errors::MatchError),
}

/// Query the CoinMarketCap USD quote nearest to a date.
#[derive(Debug, OnlyArgs)]
struct Args {
    /// Network, "polkadot" or "kusama".
    #[default("polkadot")]
    network: String,

    /// Lookup date, RFC 3339.
    date: String,

    /// CoinMarketCap API, "v3" or "v1".
    #[default("v3")]
    quotes_api: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(err, Error::Cli(_)) {
                eprintln!("{}", Args::HELP);
            }

            eprintln!("Error: {err}");
            for source in err.sources().skip(1) {
                eprintln!("  Caused by: {source}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let args: Args = onlyargs::parse()?;

    let network: Network = args.network.parse()?;
    let date: DateTime<Utc> = args.date.parse()?;
    let api: QuotesApi = args.quotes_api.parse()?;

    let client = CoinMarketCapClient::new(api, network.default_era())?;
    let padding = TimeDelta::hours(QUOTE_PADDING_HOURS);
    let series = fetch_covering(&client, network, date - padding, date + padding)?;
    let quote = series.nearest(date)?;

    println!("network:\t{network}");
    println!("date:\t{date}");
    println!("quote date:\t{}", quote.time);
    println!("quote:\t${}", quote.usd);

    Ok(())
}
