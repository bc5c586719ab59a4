use explorda::chrono::{TimeDelta, Utc};
use explorda::coinmarketcap::{CoinMarketCap, HistoricalV3, V3_ENDPOINT};
use ureq::tls::{TlsConfig, TlsProvider};
use ureq::Agent;

fn main() -> anyhow::Result<()> {
    let agent = Agent::from(
        Agent::config_builder()
            .tls_config(
                TlsConfig::builder()
                    .provider(TlsProvider::NativeTls)
                    .build(),
            )
            .build(),
    );
    let cmc = CoinMarketCap::new(V3_ENDPOINT)?;
    let end = Utc::now();
    let start = end - TimeDelta::days(7);

    // Polkadot
    let mut resp = agent.run(cmc.historical_v3(6636, start, end)?)?;

    let hist: HistoricalV3 = resp.body_mut().read_json()?;
    if let Some(msg) = hist.status.error() {
        anyhow::bail!("API error: {msg}");
    }

    for (time, price) in hist.points() {
        println!("{time}\t${price}");
    }

    Ok(())
}
