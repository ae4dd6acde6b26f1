use crate::error::SourceError;
use crate::sources::sec::extract::{extract_items, extract_report_date, html_to_text};
use crate::sources::types::Enrichment;
use crate::sources::Throttle;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Downloads filing documents from sec.gov and runs the text extractors
pub struct DocumentFetcher {
    client: Client,
    throttle: Throttle,
    backoff: Duration,
}

impl DocumentFetcher {
    /// `user_agent` must carry a reachable contact or SEC blocks the caller
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        spacing: Duration,
        backoff: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            throttle: Throttle::new(spacing),
            backoff,
        })
    }

    pub async fn fetch_text(&mut self, url: &str) -> Result<String, SourceError> {
        self.throttle.wait().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            sleep(self.backoff).await;
            return Err(SourceError::RateLimited { provider: "sec" });
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let html = response.text().await?;
        Ok(html_to_text(&html))
    }

    /// Item codes and report date for the document at `url`.
    /// A failed download yields the empty enrichment.
    pub async fn enrich(&mut self, url: &str) -> Enrichment {
        if url.is_empty() {
            return Enrichment::default();
        }

        match self.fetch_text(url).await {
            Ok(text) => {
                let enrichment = Enrichment {
                    items: extract_items(&text),
                    report_date: extract_report_date(&text),
                };
                debug!(
                    "Enriched {}: {} items, report date {:?}",
                    url,
                    enrichment.items.len(),
                    enrichment.report_date
                );
                enrichment
            }
            Err(e) => {
                warn!("Could not fetch filing document {}: {}", url, e);
                Enrichment::default()
            }
        }
    }
}
