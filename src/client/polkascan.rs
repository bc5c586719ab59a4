use super::{json_type_name, new_agent, BlockResolver, ClientError, RewardSource};
use crate::model::{constants::HTTP_TIMEOUT_SECS, Network, RewardRecord, TokenAmount};
use chrono::{DateTime, Utc};
use explorda::polkascan::{BlockResponse, EventsResponse, Polkascan, BALANCE_PARAM};
use parking_lot::RwLock;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::{collections::HashMap, time::Duration, time::Instant};
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use ureq::Agent;

#[derive(Debug, Error)]
pub enum PolkascanClientError {
    #[error("Invalid Polkascan URI")]
    PolkascanUri(#[from] explorda::Error),
}

#[derive(Debug, Error)]
pub enum PolkascanMemoError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Unable to write client memo: `{0:?}`")]
    Ron(PathBuf, #[source] ron::Error),

    #[error("Unable to rename client memo: `{0:?}`")]
    Rename(PathBuf, #[source] std::io::Error),
}

const BLOCK_MEMO: &str = "block_memo";

/// A memoizing Polkascan explorer client.
///
/// Block timestamps never change, so they are cached per `(network, block)` for the lifetime of
/// the client and can be persisted with [`PolkascanClient::into_memo`].
pub struct PolkascanClient {
    agent: Agent,
    polkascan: Polkascan,
    blocks: RwLock<HashMap<(Network, u64), DateTime<Utc>>>,
}

/// Memoized block timestamps from a [`PolkascanClient`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PolkascanClientMemo {
    blocks: Vec<(Network, u64, DateTime<Utc>)>,
}

impl PolkascanClientMemo {
    /// Location of the memo for `network` inside `cache_dir`.
    pub fn path(cache_dir: &Path, network: Network) -> PathBuf {
        cache_dir.join(format!("{BLOCK_MEMO}_{network}.ron"))
    }

    /// Read the memo for `network` from `cache_dir`.
    ///
    /// Returns `None` when there is no memo yet, or when it cannot be decoded.
    pub fn load(cache_dir: &Path, network: Network) -> Option<Self> {
        let path = Self::path(cache_dir, network);
        debug!("Reading block memo from {path:?}");
        let file = File::open(path).ok()?;

        match ron::de::from_reader(file) {
            Ok(memo) => Some(memo),
            Err(_) => {
                warn!("Corrupt block memo detected! A new one will be created.");
                None
            }
        }
    }

    /// Write the memo for `network` into `cache_dir`, replacing any previous one.
    ///
    /// The memo is written to a temporary file first and renamed over the old memo. Each network
    /// has its own temporary file.
    pub fn save(&self, cache_dir: &Path, network: Network) -> Result<PathBuf, PolkascanMemoError> {
        let temp = cache_dir.join(format!(".temp_{BLOCK_MEMO}_{network}.ron"));
        debug!("Writing temporary block memo to {temp:?}");
        let mut file = BufWriter::new(File::create(&temp)?);
        ron::ser::to_writer_pretty(&mut file, self, PrettyConfig::default())
            .map_err(|err| PolkascanMemoError::Ron(temp.clone(), err))?;
        file.flush()?;
        drop(file);

        let path = Self::path(cache_dir, network);
        debug!("Renaming temporary block memo to {path:?}");
        fs::rename(temp, &path).map_err(|err| PolkascanMemoError::Rename(path.clone(), err))?;

        Ok(path)
    }
}

impl PolkascanClient {
    /// Create a new Polkascan client with the provided API server URI.
    ///
    /// `concurrency` is the number of requests expected in flight at once.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), staketax::client::polkascan::PolkascanClientError> {
    /// # use staketax::client::polkascan::PolkascanClient;
    /// let client = PolkascanClient::new("https://explorer-32.polkascan.io", 100)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(api_server: &str, concurrency: usize) -> Result<Self, PolkascanClientError> {
        Self::from_memo(api_server, concurrency, PolkascanClientMemo::default())
    }

    /// Create a new Polkascan client with the provided API server URI and memoized responses.
    pub fn from_memo(
        api_server: &str,
        concurrency: usize,
        memo: PolkascanClientMemo,
    ) -> Result<Self, PolkascanClientError> {
        let blocks = memo
            .blocks
            .into_iter()
            .map(|(network, block_id, time)| ((network, block_id), time))
            .collect();

        Ok(Self {
            agent: new_agent(concurrency, Duration::from_secs(HTTP_TIMEOUT_SECS), true),
            polkascan: Polkascan::new(api_server)?,
            blocks: RwLock::new(blocks),
        })
    }

    /// Convert this client into its memoized responses.
    pub fn into_memo(self) -> PolkascanClientMemo {
        let mut blocks = self
            .blocks
            .into_inner()
            .into_iter()
            .map(|((network, block_id), time)| (network, block_id, time))
            .collect::<Vec<_>>();
        blocks.sort_unstable();

        PolkascanClientMemo { blocks }
    }

    fn fetch_block(&self, network: Network, block_id: u64) -> Result<DateTime<Utc>, ClientError> {
        let thread_id = std::thread::current().id();

        info!("Fetching block {block_id} on {thread_id:?}");

        let start = Instant::now();
        let req = self.polkascan.get_block(network.as_str(), block_id)?;
        let mut resp = self.agent.run(req)?;
        let block: BlockResponse = resp.body_mut().read_json()?;
        let dur = start.elapsed();

        info!("Block {block_id} received in {dur:?}");
        trace!("{block:#?}");

        block_time(block, block_id)
    }
}

impl RewardSource for PolkascanClient {
    fn list_rewards(
        &self,
        account: &str,
        network: Network,
    ) -> Result<Vec<RewardRecord>, ClientError> {
        let start = Instant::now();
        let mut rewards = Vec::new();

        for page in 1.. {
            debug!("Fetching reward events page {page} for `{account}`");

            let req = self.polkascan.get_reward_events(network.as_str(), account, page)?;
            let mut resp = self.agent.run(req)?;
            let events: EventsResponse = resp.body_mut().read_json()?;
            trace!("{events:#?}");

            if events.data.is_empty() {
                if page == 1 {
                    return Err(ClientError::NoRewards(account.to_string()));
                }
                break;
            }

            rewards.extend(reward_records(events, network)?);
            info!("{} rewards retrieved", rewards.len());
        }

        let dur = start.elapsed();
        info!("Reward events for `{account}` received in {dur:?}");

        Ok(rewards)
    }
}

impl BlockResolver for PolkascanClient {
    fn block_timestamp(
        &self,
        network: Network,
        block_id: u64,
    ) -> Result<DateTime<Utc>, ClientError> {
        if let Some(time) = self.blocks.read().get(&(network, block_id)) {
            return Ok(*time);
        }

        let time = self.fetch_block(network, block_id)?;
        self.blocks.write().insert((network, block_id), time);

        Ok(time)
    }
}

/// Convert one page of explorer events into reward records.
///
/// Events other than staking rewards are skipped. A reward without a `Balance` parameter is
/// recorded with a zero amount.
fn reward_records(
    events: EventsResponse,
    network: Network,
) -> Result<Vec<RewardRecord>, ClientError> {
    if let Some(msg) = events.errors.message() {
        return Err(ClientError::Api(msg));
    }

    events
        .data
        .iter()
        .filter(|event| event.is_reward())
        .map(|event| {
            let amount = match event.balance() {
                Some(serde_json::Value::Number(planck)) => {
                    TokenAmount::from_planck_json(planck, network)?
                }
                Some(value) => {
                    return Err(ClientError::UnexpectedType {
                        field: BALANCE_PARAM,
                        found: json_type_name(value),
                    })
                }
                None => {
                    warn!("Reward event `{}` has no {BALANCE_PARAM}", event.id);
                    TokenAmount::default()
                }
            };

            Ok(RewardRecord::new(event.attributes.block_id, amount))
        })
        .collect()
}

fn block_time(block: BlockResponse, block_id: u64) -> Result<DateTime<Utc>, ClientError> {
    if let Some(msg) = block.errors.message() {
        return Err(ClientError::Api(msg));
    }

    block
        .data
        .map(|data| data.attributes.datetime)
        .ok_or(ClientError::NoBlock(block_id))
}
