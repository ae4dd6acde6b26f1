use crate::data::ItemSet;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One insider transaction as the market-data provider reports it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    #[serde(default)]
    pub name: String,

    /// Shares held after the transaction
    #[serde(default)]
    pub share: Option<f64>,

    /// Signed share delta; negative for dispositions
    #[serde(default)]
    pub change: Option<f64>,

    #[serde(default)]
    pub filing_date: Option<String>,

    #[serde(default)]
    pub transaction_date: Option<String>,

    #[serde(default)]
    pub transaction_code: String,

    #[serde(default)]
    pub transaction_price: Option<Decimal>,
}

/// One material-event filing, provider-neutral.
///
/// Finnhub's filings payload deserializes straight into this; the SEC
/// adapter builds it from the submissions arrays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFiling {
    #[serde(default)]
    pub access_number: String,

    #[serde(default)]
    pub form: String,

    #[serde(default)]
    pub filed_date: String,

    #[serde(default)]
    pub accepted_date: String,

    #[serde(default)]
    pub report_url: String,

    /// Only some providers supply this
    #[serde(default)]
    pub report_date: Option<String>,
}

impl RawFiling {
    pub fn is_material_event(&self) -> bool {
        self.form == "8-K" || self.form == "8-K/A"
    }
}

/// Best-effort extras pulled from the filing document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub items: ItemSet,
    pub report_date: Option<NaiveDate>,
}
