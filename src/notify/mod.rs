pub mod format;
pub mod telegram;

pub use format::{render_filing, render_trade};
pub use telegram::TelegramNotifier;

use async_trait::async_trait;

/// Alert stream; each maps to its own bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Trades,
    Filings,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Trades => "trades",
            Channel::Filings => "filings",
        }
    }
}

/// Delivers rendered alerts to a messaging sink
#[async_trait]
pub trait Notifier: Send {
    /// False when the channel has no credentials configured
    fn is_enabled(&self, channel: Channel) -> bool;

    /// True only on an explicit acknowledgment from the endpoint
    async fn send(&mut self, message: &str, channel: Channel) -> bool;
}
