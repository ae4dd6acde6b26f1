use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Central Index Keys for a few large issuers, so the SEC provider works
/// without a cache file
const BUILTIN: &[(&str, u64)] = &[
    ("AAPL", 320193),
    ("TSLA", 1318605),
    ("NVDA", 1045810),
    ("MSFT", 789019),
    ("AMZN", 1018724),
    ("META", 1326801),
    ("GOOGL", 1652044),
];

#[derive(Deserialize)]
#[serde(untagged)]
enum CikValue {
    Number(u64),
    Text(String),
}

impl CikValue {
    fn into_cik(self) -> Option<u64> {
        match self {
            CikValue::Number(n) => Some(n),
            CikValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Symbol -> CIK lookup
#[derive(Debug, Clone, Default)]
pub struct CikDirectory {
    entries: HashMap<String, u64>,
}

impl CikDirectory {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.iter().map(|(s, c)| (s.to_string(), *c)).collect(),
        }
    }

    /// Built-in entries overlaid with the JSON cache at `path`
    /// (`{"AAPL": "0000320193", "KO": 21344}`). A missing or unreadable
    /// cache leaves just the built-ins.
    pub fn load(path: Option<&Path>) -> Self {
        let mut directory = Self::builtin();

        let Some(path) = path else {
            return directory;
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No CIK cache at {}", path.display());
                return directory;
            }
            Err(e) => {
                warn!("Unreadable CIK cache {}: {}", path.display(), e);
                return directory;
            }
        };

        match serde_json::from_str::<HashMap<String, CikValue>>(&contents) {
            Ok(raw) => {
                let before = directory.len();
                for (symbol, value) in raw {
                    match value.into_cik() {
                        Some(cik) => {
                            directory.insert(&symbol, cik);
                        }
                        None => warn!("Ignoring malformed CIK for {}", symbol),
                    }
                }
                info!(
                    "Loaded CIK cache {} ({} entries, {} new)",
                    path.display(),
                    directory.len(),
                    directory.len() - before
                );
            }
            Err(e) => warn!("Corrupt CIK cache {}: {}", path.display(), e),
        }

        directory
    }

    pub fn insert(&mut self, symbol: &str, cik: u64) {
        self.entries.insert(symbol.to_uppercase(), cik);
    }

    pub fn cik(&self, symbol: &str) -> Option<u64> {
        self.entries.get(&symbol.to_uppercase()).copied()
    }

    /// Ten-digit zero-padded form used by the submissions endpoint
    pub fn padded(&self, symbol: &str) -> Option<String> {
        self.cik(symbol).map(|cik| format!("{:010}", cik))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
