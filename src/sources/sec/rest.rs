use crate::error::SourceError;
use crate::sources::sec::types::Submissions;
use crate::sources::sec::{CikDirectory, DocumentFetcher};
use crate::sources::types::{Enrichment, RawFiling};
use crate::sources::{FilingSource, Throttle};
use crate::utils::config::SourcesConfig;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Material-event filings straight from EDGAR's submissions endpoint
pub struct SecClient {
    client: Client,
    data_url: String,
    archive_url: String,
    ciks: CikDirectory,
    throttle: Throttle,
    backoff: Duration,
    page_limit: usize,
    lookback_days: i64,
    documents: Option<DocumentFetcher>,
}

impl SecClient {
    pub fn new(
        config: &SourcesConfig,
        ciks: CikDirectory,
        documents: Option<DocumentFetcher>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.sec_timeout_secs))
            .user_agent(config.sec_user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            data_url: config.sec_data_url.trim_end_matches('/').to_string(),
            archive_url: config.sec_archive_url.trim_end_matches('/').to_string(),
            ciks,
            throttle: Throttle::new(config.sec_spacing()),
            backoff: config.rate_limit_backoff(),
            page_limit: config.page_limit,
            lookback_days: config.lookback_days,
            documents,
        })
    }

    async fn get_submissions(&mut self, padded_cik: &str) -> Result<Submissions, SourceError> {
        self.throttle.wait().await;

        let url = format!("{}/submissions/CIK{}.json", self.data_url, padded_cik);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("SEC rate limit hit, backing off {:?}", self.backoff);
            sleep(self.backoff).await;
            return Err(SourceError::RateLimited { provider: "sec" });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Submissions>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    fn is_recent(&self, filing_date: &str, today: NaiveDate) -> bool {
        let Ok(date) = NaiveDate::parse_from_str(filing_date, "%Y-%m-%d") else {
            return false;
        };
        let Ok(days) = u64::try_from(self.lookback_days) else {
            return false;
        };
        // A window reaching past the calendar's start covers everything
        match today.checked_sub_days(Days::new(days)) {
            Some(start) => date >= start,
            None => true,
        }
    }

    /// 8-K rows from the lookback window, newest first, bounded by page size
    pub fn select_filings(
        &self,
        submissions: &Submissions,
        cik: u64,
        today: NaiveDate,
    ) -> Vec<RawFiling> {
        let mut filings: Vec<RawFiling> = submissions
            .filings
            .recent
            .entries()
            .filter(|entry| entry.form == "8-K" || entry.form == "8-K/A")
            .filter(|entry| self.is_recent(entry.filing_date, today))
            .map(|entry| entry.to_raw(&self.archive_url, cik))
            .collect();

        filings.sort_by(|a, b| b.accepted_date.cmp(&a.accepted_date));
        filings.truncate(self.page_limit);
        filings
    }
}

#[async_trait]
impl FilingSource for SecClient {
    async fn fetch_filings(&mut self, symbol: &str) -> Vec<RawFiling> {
        let (Some(cik), Some(padded)) = (self.ciks.cik(symbol), self.ciks.padded(symbol)) else {
            debug!("No CIK known for {}, skipping SEC filings", symbol);
            return Vec::new();
        };

        match self.get_submissions(&padded).await {
            Ok(submissions) => {
                let filings = self.select_filings(&submissions, cik, Utc::now().date_naive());
                if !filings.is_empty() {
                    info!("{}: {} recent 8-K filings from SEC", symbol, filings.len());
                }
                filings
            }
            Err(e) => {
                warn!("SEC submissions for {} failed: {}", symbol, e);
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
