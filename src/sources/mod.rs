//! Provider adapters.
//!
//! Every public fetch returns an empty page on failure; callers never see
//! transport or protocol errors.

pub mod finnhub;
pub mod sec;
pub mod throttle;
pub mod types;

pub use finnhub::FinnhubClient;
pub use sec::{CikDirectory, DocumentFetcher, SecClient};
pub use throttle::Throttle;
pub use types::{Enrichment, RawFiling, RawTrade};

use async_trait::async_trait;

/// Source of insider transactions for one symbol
#[async_trait]
pub trait TradeSource: Send {
    /// At most the configured page size, newest first
    async fn fetch_trades(&mut self, symbol: &str) -> Vec<RawTrade>;
}

/// Source of material-event filings for one symbol
#[async_trait]
pub trait FilingSource: Send {
    /// At most the configured page size, newest first
    async fn fetch_filings(&mut self, symbol: &str) -> Vec<RawFiling>;

    /// Item codes and report date from the filing document. Each part
    /// independently falls back to empty / `None`.
    async fn enrich(&mut self, filing: &RawFiling) -> Enrichment;
}
