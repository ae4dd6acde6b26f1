use crate::error::SourceError;
use crate::sources::finnhub::types::{ApiError, InsiderTransactions};
use crate::sources::sec::DocumentFetcher;
use crate::sources::types::{Enrichment, RawFiling, RawTrade};
use crate::sources::{FilingSource, Throttle, TradeSource};
use crate::utils::config::SourcesConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Finnhub REST client for insider transactions and 8-K filings
pub struct FinnhubClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    throttle: Throttle,
    backoff: Duration,
    page_limit: usize,
    documents: Option<DocumentFetcher>,
}

impl FinnhubClient {
    /// Create new REST client. Without an API key every fetch returns an
    /// empty page.
    pub fn new(
        config: &SourcesConfig,
        api_key: Option<String>,
        documents: Option<DocumentFetcher>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.finnhub_timeout_secs))
            .build()?;

        if api_key.is_none() {
            warn!("FINNHUB_API_KEY not set; Finnhub fetches will return nothing");
        }

        Ok(Self {
            client,
            api_key,
            base_url: config.finnhub_base_url.trim_end_matches('/').to_string(),
            throttle: Throttle::new(config.finnhub_spacing()),
            backoff: config.rate_limit_backoff(),
            page_limit: config.page_limit,
            documents,
        })
    }

    /// Authenticated GET; a 429 sleeps once and gives up
    async fn get_json<T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredentials("finnhub"))?;

        self.throttle.wait().await;

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", api_key)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Finnhub rate limit hit on {}, backing off {:?}", endpoint, self.backoff);
            sleep(self.backoff).await;
            return Err(SourceError::RateLimited { provider: "finnhub" });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
            return Err(SourceError::Decode(api_error.error));
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    pub async fn get_insider_transactions(
        &mut self,
        symbol: &str,
    ) -> Result<Vec<RawTrade>, SourceError> {
        let response: InsiderTransactions = self
            .get_json("/stock/insider-transactions", &[("symbol", symbol)])
            .await?;

        let mut trades = response.data;
        trades.sort_by(|a, b| {
            b.filing_date
                .cmp(&a.filing_date)
                .then_with(|| b.transaction_date.cmp(&a.transaction_date))
        });
        trades.truncate(self.page_limit);
        Ok(trades)
    }

    pub async fn get_filings(&mut self, symbol: &str) -> Result<Vec<RawFiling>, SourceError> {
        let mut filings: Vec<RawFiling> = self
            .get_json("/stock/filings", &[("symbol", symbol), ("form", "8-K")])
            .await?;

        filings.retain(RawFiling::is_material_event);
        filings.sort_by(|a, b| b.accepted_date.cmp(&a.accepted_date));
        filings.truncate(self.page_limit);
        Ok(filings)
    }
}

#[async_trait]
impl TradeSource for FinnhubClient {
    async fn fetch_trades(&mut self, symbol: &str) -> Vec<RawTrade> {
        match self.get_insider_transactions(symbol).await {
            Ok(trades) => {
                debug!("{}: {} insider transactions", symbol, trades.len());
                trades
            }
            Err(SourceError::MissingCredentials(_)) => Vec::new(),
            Err(e) => {
                warn!("Insider transactions for {} failed: {}", symbol, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl FilingSource for FinnhubClient {
    async fn fetch_filings(&mut self, symbol: &str) -> Vec<RawFiling> {
        match self.get_filings(symbol).await {
            Ok(filings) => {
                if !filings.is_empty() {
                    info!("{}: {} 8-K filings from Finnhub", symbol, filings.len());
                }
                filings
            }
            Err(SourceError::MissingCredentials(_)) => Vec::new(),
            Err(e) => {
                warn!("Filings for {} failed: {}", symbol, e);
                Vec::new()
            }
        }
    }

    async fn enrich(&mut self, filing: &RawFiling) -> Enrichment {
        match self.documents.as_mut() {
            Some(documents) => documents.enrich(&filing.report_url).await,
            None => Enrichment::default(),
        }
    }
}
