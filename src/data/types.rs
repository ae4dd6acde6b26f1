use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered set of 8-K item codes ("1.01", "5.02", ...)
pub type ItemSet = BTreeSet<String>;

/// Direction of an insider transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl Direction {
    /// Positive share delta is a buy, everything else a sell
    pub fn from_change(signed_change: i64) -> Self {
        if signed_change > 0 {
            Direction::Buy
        } else {
            Direction::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insider transaction in its persisted shape.
///
/// Field names on the wire follow the dashboard's JSON contract
/// (`name`, `type`, `price`, `secLink`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTrade {
    pub id: String,
    pub symbol: String,

    #[serde(rename = "name")]
    pub insider_name: String,

    #[serde(rename = "type")]
    pub direction: Direction,

    /// Always `|signed_change|`
    pub shares: u64,

    #[serde(
        rename = "price",
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_share: Option<Decimal>,

    /// Present only when the per-share price is known and positive
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_value: Option<Decimal>,

    pub shares_owned_after: i64,
    pub transaction_date: NaiveDate,
    pub filing_date: NaiveDate,
    pub transaction_code: String,
    pub transaction_description: String,

    #[serde(rename = "secLink")]
    pub source_link: String,
}

/// Material-event (8-K) filing in its persisted shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFiling {
    pub id: String,
    pub symbol: String,

    #[serde(rename = "form")]
    pub form_type: String,

    pub filed_date: NaiveDate,
    pub accepted_date: String,

    /// Falls back to `filed_date` when the document gives no report date
    pub report_date: NaiveDate,

    pub report_url: String,
    pub access_number: String,

    #[serde(default)]
    pub items: ItemSet,
}

/// Summary block stored beside the trades dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub total_alerts: usize,
    pub buys: usize,
    pub sells: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
}

impl TradeStats {
    /// Recompute from the full sequence; trades without a known value add nothing
    pub fn from_records(trades: &[CanonicalTrade]) -> Self {
        let mut stats = TradeStats {
            total_alerts: trades.len(),
            ..Default::default()
        };

        for trade in trades {
            match trade.direction {
                Direction::Buy => stats.buys += 1,
                Direction::Sell => stats.sells += 1,
            }
            // Saturates instead of overflowing on absurd provider values
            if let Some(value) = trade.total_value {
                stats.total_value = stats
                    .total_value
                    .checked_add(value)
                    .unwrap_or(Decimal::MAX);
            }
        }

        stats
    }
}

/// Summary block stored beside the filings dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingStats {
    pub total_filings: usize,
    pub with_items: usize,
    pub by_item: BTreeMap<String, usize>,
}

impl FilingStats {
    pub fn from_records(filings: &[CanonicalFiling]) -> Self {
        let mut stats = FilingStats {
            total_filings: filings.len(),
            ..Default::default()
        };

        for filing in filings {
            if !filing.items.is_empty() {
                stats.with_items += 1;
            }
            for item in &filing.items {
                *stats.by_item.entry(item.clone()).or_insert(0) += 1;
            }
        }

        stats
    }
}
