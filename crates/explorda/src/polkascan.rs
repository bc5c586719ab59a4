//! An implementation of the Polkascan explorer protocol. The main type is the [`Polkascan`] client.

pub use self::types::{ApiErrors, BlockAttributes, BlockData, BlockResponse};
pub use self::types::{Event, EventAttributes, EventParam, EventsResponse};
use crate::{append_path_and_query, base_request, Error, Req};
use http::Uri;

mod types;

/// Search index of the `Staking.Reward` event.
pub const REWARD_SEARCH_INDEX: u32 = 39;

/// Number of events requested per page.
pub const PAGE_SIZE: u32 = 200;

/// Event ID of staking rewards.
pub const REWARD_EVENT_ID: &str = "Reward";

/// Event parameter type holding the reward amount, in planck.
pub const BALANCE_PARAM: &str = "Balance";

/// The main Polkascan client.
#[derive(Clone, Debug)]
pub struct Polkascan {
    req: Req,
}

impl Polkascan {
    /// Polkascan client constructor.
    ///
    /// The API endpoint string must be a valid absolute [`Uri`].
    ///
    /// # Example
    ///
    /// ```
    /// # use explorda::polkascan::Polkascan;
    /// # fn main() -> anyhow::Result<()> {
    /// let polkascan = Polkascan::new("https://explorer-32.polkascan.io")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<U>(api: U) -> Result<Self, Error>
    where
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<http::Error>,
    {
        Ok(Self {
            req: base_request(api)?,
        })
    }

    /// Get a block by number.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client.
    ///
    /// The response can be deserialized from JSON into a [`BlockResponse`].
    pub fn get_block(&self, network: &str, block_id: u64) -> Result<Req, Error> {
        check_network(network)?;

        let mut req = self.req.clone();
        append_path_and_query(&mut req, &format!("api/v1/{network}/block/{block_id}"), &[])?;

        Ok(req)
    }

    /// Get one page of staking reward events for an account. Pages are numbered from 1.
    ///
    /// Returns a [`Req`] which can be sent by your preferred HTTP client.
    ///
    /// The response can be deserialized from JSON into an [`EventsResponse`]. An empty `data` array
    /// marks the end of the event list.
    pub fn get_reward_events(&self, network: &str, account: &str, page: u32) -> Result<Req, Error> {
        check_network(network)?;
        if account.is_empty() || !account.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Account(account.to_string()));
        }

        // Square brackets are not allowed in a URI query; they are sent percent-encoded.
        let query = [
            ("filter%5Baddress%5D", account.to_string()),
            ("filter%5Bsearch_index%5D", REWARD_SEARCH_INDEX.to_string()),
            ("page%5Bsize%5D", PAGE_SIZE.to_string()),
            ("page%5Bnumber%5D", page.to_string()),
        ];
        let mut req = self.req.clone();
        append_path_and_query(&mut req, &format!("api/v1/{network}/event"), &query)?;

        Ok(req)
    }
}

fn check_network(network: &str) -> Result<(), Error> {
    if network.is_empty() || !network.chars().all(|c| c.is_ascii_lowercase()) {
        Err(Error::Network(network.to_string()))
    } else {
        Ok(())
    }
}
