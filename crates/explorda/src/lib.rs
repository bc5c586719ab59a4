//! Block explorer and price quote API clients, [sans I/O]. (Bring your own sync/async HTTP client!)
//!
//! This library handles the protocol-layer aspects of the [Polkascan] explorer API and the
//! CoinMarketCap historical quote APIs, including ser-de and request-response abstractions.
//!
//! [Polkascan]: https://github.com/polkascan/explorer-api
//! [sans I/O]: https://sans-io.readthedocs.io/how-to-sans-io.html
//!
//! # Sync example with `ureq`
//!
//! ```no_run
//! use explorda::polkascan::{BlockResponse, Polkascan};
//!
//! fn main() -> anyhow::Result<()> {
//!     let agent = ureq::agent();
//!     let polkascan = Polkascan::new("https://explorer-32.polkascan.io")?;
//!
//!     let mut resp = agent.run(polkascan.get_block("polkadot", 1_000_000)?)?;
//!
//!     let block: BlockResponse = resp.body_mut().read_json()?;
//!
//!     println!("{block:#?}");
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub use chrono;
pub use http;
pub use rust_decimal;

use http::{Request, Uri};
use thiserror::Error;

#[cfg(feature = "coinmarketcap")]
pub mod coinmarketcap;

pub mod polkascan;

pub type Req = http::Request<()>;

/// Request construction errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid URI")]
    Uri(#[from] http::Error),

    #[error("API URI must have a scheme and host: `{0}`")]
    RelativeUri(String),

    #[error("Account address must be alphanumeric: `{0}`")]
    Account(String),

    #[error("Network name must be lowercase ASCII: `{0}`")]
    Network(String),
}

/// Create the base `GET` request that all endpoints are derived from.
///
/// Relative URIs like `/hello/world` and non-network URIs like `data:` and `mailto:` are rejected.
pub(crate) fn base_request<U>(api: U) -> Result<Req, Error>
where
    U: TryInto<Uri>,
    <U as TryInto<Uri>>::Error: Into<http::Error>,
{
    let req = Request::get(api).body(())?;
    if req.uri().scheme().is_none() || req.uri().host().is_none() {
        return Err(Error::RelativeUri(req.uri().to_string()));
    }

    Ok(req)
}

/// Append a path to the request and replace its query string.
pub(crate) fn append_path_and_query(
    req: &mut Req,
    path: &str,
    query: &[(&str, String)],
) -> Result<(), http::Error> {
    // The `http` crate has really bad ergonomics for updating paths.
    // SEE: https://github.com/hyperium/http/issues/594
    let req_uri = req.uri_mut();
    let mut uri_parts = req_uri.clone().into_parts();
    let root = req_uri.path();

    let mut path_and_query = format!("{root}{path}");
    for (i, (key, value)) in query.iter().enumerate() {
        path_and_query.push(if i == 0 { '?' } else { '&' });
        path_and_query.push_str(key);
        path_and_query.push('=');
        path_and_query.push_str(value);
    }

    uri_parts.path_and_query = Some(path_and_query.parse()?);
    *req_uri = Uri::from_parts(uri_parts)?;

    Ok(())
}
