//! Rendering of valued rewards.

use crate::model::{constants::REPORT_DIGITS, Network, QuotedReward, TokenAmount, UsdAmount};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error")]
    Csv(#[from] csv::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Destination of the final report.
pub trait ReportSink {
    /// Render all rewards. Called at most once, after a successful reconciliation.
    fn render(&mut self, rewards: &[QuotedReward]) -> Result<(), ReportError>;
}

/// Totals over a set of rewards.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    pub amount: TokenAmount,
    pub usd: UsdAmount,
}

impl Totals {
    pub fn new(rewards: &[QuotedReward]) -> Self {
        Self {
            amount: rewards.iter().map(|reward| reward.amount).sum(),
            usd: rewards.iter().map(QuotedReward::usd_value).sum(),
        }
    }
}

/// One report line. Column names differ between the table and CSV formats.
#[derive(Serialize, Tabled)]
struct ReportRow {
    #[serde(rename = "REWARD DATE")]
    #[tabled(rename = "Reward Date")]
    reward_date: String,

    #[serde(rename = "AMOUNT")]
    #[tabled(rename = "Amount")]
    amount: String,

    #[serde(rename = "USD QUOTE DATE")]
    #[tabled(rename = "USD Quote Date")]
    quote_date: String,

    #[serde(rename = "USD QUOTE")]
    #[tabled(rename = "USD Quote")]
    quote: String,

    #[serde(rename = "USD VALUE")]
    #[tabled(rename = "USD Value")]
    usd_value: String,
}

impl From<&QuotedReward> for ReportRow {
    fn from(reward: &QuotedReward) -> Self {
        Self {
            reward_date: rfc3339(reward.reward_time),
            amount: fixed(reward.amount),
            quote_date: rfc3339(reward.quote_time),
            quote: fixed(reward.quote_value),
            usd_value: fixed(reward.usd_value()),
        }
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn fixed(value: impl Display) -> String {
    format!("{value:.digits$}", digits = REPORT_DIGITS)
}

/// Renders an aligned text table followed by the period totals.
pub struct TableSink<W> {
    writer: W,
    network: Network,
}

impl<W: Write> TableSink<W> {
    pub fn new(writer: W, network: Network) -> Self {
        Self { writer, network }
    }
}

impl<W: Write> ReportSink for TableSink<W> {
    fn render(&mut self, rewards: &[QuotedReward]) -> Result<(), ReportError> {
        let mut table = Table::new(rewards.iter().map(ReportRow::from));
        table.with(Style::blank());

        let totals = Totals::new(rewards);
        writeln!(self.writer)?;
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Total USD for period: {}$ for {} {}",
            fixed(totals.usd),
            fixed(totals.amount),
            self.network.symbol(),
        )?;
        self.writer.flush()?;

        Ok(())
    }
}

/// The report destination for a run: CSV at `csv` when given, otherwise a table on stdout.
///
/// The table writes through an unlocked [`std::io::Stdout`]. Log events from worker threads
/// share stdout while the report is pending, so the lock must only be taken per write.
pub fn sink_for(csv: Option<&Path>, network: Network) -> Box<dyn ReportSink> {
    match csv {
        Some(path) => Box::new(CsvSink::new(path)),
        None => Box::new(TableSink::new(std::io::stdout(), network)),
    }
}

/// Writes one CSV row per reward.
///
/// The file is not created until [`ReportSink::render`] is called.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ReportSink for CsvSink {
    fn render(&mut self, rewards: &[QuotedReward]) -> Result<(), ReportError> {
        debug!("Writing {} rewards to {:?}", rewards.len(), self.path);

        let mut writer = csv::WriterBuilder::new().from_path(&self.path)?;
        for reward in rewards {
            writer.serialize(ReportRow::from(reward))?;
        }
        writer.flush()?;

        Ok(())
    }
}
