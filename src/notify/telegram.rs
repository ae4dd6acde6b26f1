use crate::notify::{Channel, Notifier};
use crate::sources::Throttle;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API reply envelope
#[derive(Debug, Deserialize)]
struct ApiReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API notifier; one bot per channel, one shared chat
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    chat_id: Option<String>,
    trade_token: Option<String>,
    filing_token: Option<String>,
    throttle: Throttle,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        chat_id: Option<String>,
        trade_token: Option<String>,
        filing_token: Option<String>,
        timeout: Duration,
        spacing: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            chat_id,
            trade_token,
            filing_token,
            throttle: Throttle::new(spacing),
        })
    }

    fn token(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Trades => self.trade_token.as_deref(),
            Channel::Filings => self.filing_token.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn is_enabled(&self, channel: Channel) -> bool {
        self.chat_id.is_some() && self.token(channel).is_some()
    }

    async fn send(&mut self, message: &str, channel: Channel) -> bool {
        let (Some(chat_id), Some(token)) = (self.chat_id.as_deref(), self.token(channel)) else {
            return false;
        };

        // Token is part of the path; never log this URL
        let url = format!("{}/bot{}/sendMessage", self.api_url, token);
        let payload = SendMessage {
            chat_id,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let request = self.client.post(url).json(&payload);

        self.throttle.wait().await;

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Telegram {} send failed: {}", channel.as_str(), e.without_url());
                return false;
            }
        };

        let status = response.status();
        match response.json::<ApiReply>().await {
            Ok(reply) if reply.ok => {
                debug!("Telegram {} alert delivered", channel.as_str());
                true
            }
            Ok(reply) => {
                warn!(
                    "Telegram {} alert rejected ({}): {}",
                    channel.as_str(),
                    status,
                    reply.description.unwrap_or_default()
                );
                false
            }
            Err(e) => {
                warn!(
                    "Telegram {} reply unreadable ({}): {}",
                    channel.as_str(),
                    status,
                    e.without_url()
                );
                false
            }
        }
    }
}
