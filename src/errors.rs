//! All error types, in one place.

pub use crate::client::coinmarketcap::CoinMarketCapClientError;
pub use crate::client::polkascan::{PolkascanClientError, PolkascanMemoError};
pub use crate::client::ClientError;
pub use crate::config::ConfigError;
pub use crate::model::{ConvertAmountError, NetworkError, UnquotedError};
pub use crate::reconcile::{MatchError, RangeError, ReconcileError, ResolveError};
pub use crate::report::ReportError;
