pub mod types;

pub use types::{
    CanonicalFiling, CanonicalTrade, Direction, FilingStats, ItemSet, TradeStats,
};
