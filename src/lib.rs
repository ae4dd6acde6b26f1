pub mod data;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod sources;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use data::{CanonicalFiling, CanonicalTrade, Direction, FilingStats, TradeStats};
pub use error::{ConfigError, NormalizeError, SourceError, StoreError};
pub use ingest::{MonitorState, Orchestrator, RunPolicy, RunSummary};
pub use notify::{Channel, Notifier, TelegramNotifier};
pub use sources::{
    CikDirectory, DocumentFetcher, FilingSource, FinnhubClient, SecClient, TradeSource,
};
pub use store::{Dataset, DatasetStore, SeenIdStore};
pub use utils::{Config, FilingsProvider, Secrets};
