pub mod normalizer;
pub mod orchestrator;

pub use normalizer::{filing_id, normalize_filing, normalize_trade, trade_id};
pub use orchestrator::{MonitorState, Orchestrator, RunPolicy, RunSummary};
