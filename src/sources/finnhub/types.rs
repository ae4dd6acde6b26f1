use crate::sources::types::RawTrade;
use serde::Deserialize;

/// `/stock/insider-transactions` response
#[derive(Debug, Clone, Deserialize)]
pub struct InsiderTransactions {
    #[serde(default)]
    pub data: Vec<RawTrade>,

    #[serde(default)]
    pub symbol: String,
}

/// Error envelope Finnhub returns with a 200 on bad keys
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: String,
}
