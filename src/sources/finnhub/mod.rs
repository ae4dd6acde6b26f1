pub mod rest;
pub mod types;

pub use rest::FinnhubClient;
pub use types::InsiderTransactions;
