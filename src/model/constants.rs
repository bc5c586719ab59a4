//! Defaults shared by the binaries.

/// Polkascan explorer API used when `--url` is not given.
pub const DEFAULT_POLKASCAN_URL: &str = "https://explorer-32.polkascan.io";

/// Number of concurrent block timestamp lookups.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Price queries extend this many hours past both ends of a bucket.
pub const QUOTE_PADDING_HOURS: i64 = 24;

/// Stride the quote window moves back by when a price provider truncates its results.
pub const QUOTE_BACKOFF_HOURS: i64 = 12;

/// HTTP request timeout, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 120;

/// Precision of token amounts and USD values in reports.
pub const REPORT_DIGITS: usize = 6;
