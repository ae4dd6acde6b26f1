pub mod cik;
pub mod document;
pub mod extract;
pub mod rest;
pub mod types;

pub use cik::CikDirectory;
pub use document::DocumentFetcher;
pub use extract::{extract_items, extract_report_date, html_to_text, item_title};
pub use rest::SecClient;
pub use types::{RecentFilings, Submissions};
