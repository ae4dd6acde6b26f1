use crate::error::ConfigError;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

/// SEC fair-access policy: no more than ~6-7 requests per second
pub const MIN_SEC_SPACING_MS: u64 = 150;

/// Accepted `sources.lookback_days` values
pub const LOOKBACK_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;

const DEFAULT_WATCHLIST: &[&str] = &[
    "MSFT", "NVDA", "TSLA", "GOOGL", "META", "AMZN", "NFLX", "AMD",
    "INTC", "COIN", "LYFT", "ORCL", "AVGO", "ADBE", "PYPL", "PLTR",
    "SMCI", "SOFI", "SMR", "GME", "HIMS", "CRWV", "XPEV", "HOOD",
    "OKLO", "ACHR", "IREN", "NBIS", "MU", "SNOW", "APP", "TSM",
    "ASTS", "MRVL", "BA", "PDD", "SOUN", "PANW", "TEM", "LLY",
    "ALGN", "SPOT", "CVNA", "SHOP", "DUOL", "NKE", "CSCO", "BULL",
    "JNJ", "LCID", "KO", "GE", "BE", "NEE", "PEP", "RR", "IONQ",
    "QCOM", "LNTH", "CFLT", "LMND", "JOBY", "CAT", "OPEN", "RIVN",
    "PFE", "CNC", "NVO", "NOW", "CVS", "ABT", "IBM", "JPM", "NVAX",
    "BRK-B", "UNH", "AAPL",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
    pub alerts: AlertsConfig,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Symbols processed in this order every run
    pub watchlist: Vec<String>,
    /// Skip all writes when a run finds nothing new
    pub save_only_when_new: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            watchlist: DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
            save_only_when_new: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingsProvider {
    Finnhub,
    Sec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub finnhub_base_url: String,
    pub finnhub_spacing_ms: u64,
    pub finnhub_timeout_secs: u64,

    /// Most-recent records kept per symbol and record type
    pub page_limit: usize,

    pub filings_provider: FilingsProvider,
    pub sec_data_url: String,
    pub sec_archive_url: String,
    pub sec_user_agent: String,
    pub sec_spacing_ms: u64,
    pub sec_timeout_secs: u64,
    pub document_timeout_secs: u64,
    pub lookback_days: i64,

    /// Fetch each filing document to pull item codes and report date
    pub enrich_filings: bool,

    /// Single sleep after a 429 before giving up on the call
    pub rate_limit_backoff_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            finnhub_spacing_ms: 250,
            finnhub_timeout_secs: 15,
            page_limit: 10,
            filings_provider: FilingsProvider::Finnhub,
            sec_data_url: "https://data.sec.gov".to_string(),
            sec_archive_url: "https://www.sec.gov/Archives/edgar/data".to_string(),
            sec_user_agent: "Insider Trading Monitor research@example.com".to_string(),
            sec_spacing_ms: MIN_SEC_SPACING_MS,
            sec_timeout_secs: 10,
            document_timeout_secs: 30,
            lookback_days: 7,
            enrich_filings: true,
            rate_limit_backoff_ms: 2000,
        }
    }
}

impl SourcesConfig {
    pub fn finnhub_spacing(&self) -> Duration {
        Duration::from_millis(self.finnhub_spacing_ms)
    }

    pub fn sec_spacing(&self) -> Duration {
        Duration::from_millis(self.sec_spacing_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Trades with a known value below this are skipped. Filings have no such filter.
    pub min_trade_value: Decimal,
    /// Alerts per run; 0 disables the cap
    pub max_trade_alerts: usize,
    pub max_filing_alerts: usize,
    pub send_spacing_ms: u64,
    pub send_timeout_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            min_trade_value: Decimal::ZERO,
            max_trade_alerts: 5,
            max_filing_alerts: 3,
            send_spacing_ms: 1000,
            send_timeout_secs: 10,
        }
    }
}

impl AlertsConfig {
    pub fn trade_cap(&self) -> Option<usize> {
        (self.max_trade_alerts > 0).then_some(self.max_trade_alerts)
    }

    pub fn filing_cap(&self) -> Option<usize> {
        (self.max_filing_alerts > 0).then_some(self.max_filing_alerts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub seen_trades_path: PathBuf,
    pub seen_filings_path: PathBuf,
    pub trades_path: PathBuf,
    pub filings_path: PathBuf,
    /// Optional symbol -> CIK map used by the SEC filings provider
    pub cik_cache_path: Option<PathBuf>,
    pub max_records: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seen_trades_path: PathBuf::from("seen_form4.txt"),
            seen_filings_path: PathBuf::from("seen_form8k.txt"),
            trades_path: PathBuf::from("data/trades_data.json"),
            filings_path: PathBuf::from("data/form8k_data.json"),
            cik_cache_path: Some(PathBuf::from("data/cik_cache.json")),
            max_records: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

/// Credentials supplied through the environment, never through the TOML file
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub finnhub_api_key: Option<String>,
    pub trade_bot_token: Option<String>,
    pub filing_bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            finnhub_api_key: non_empty_var("FINNHUB_API_KEY"),
            trade_bot_token: non_empty_var("BOT_TOKEN_FORM4"),
            filing_bot_token: non_empty_var("BOT_TOKEN_FORM8K"),
            chat_id: non_empty_var("CHAT_ID"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, `CONFIG_FILE`, or the default path.
    ///
    /// Only an explicitly named file is required to exist; otherwise a
    /// missing file means built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = std::env::var("CONFIG_FILE")
                    .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
                if Path::new(&path).exists() {
                    Self::from_file(&path)?
                } else {
                    info!("No config file at {}, using defaults", path);
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.watchlist.is_empty() {
            return Err(ConfigError::EmptyWatchlist);
        }
        if self.sources.sec_spacing_ms < MIN_SEC_SPACING_MS {
            return Err(ConfigError::SecSpacingTooLow(self.sources.sec_spacing_ms));
        }
        if self.storage.max_records == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if !LOOKBACK_DAYS_RANGE.contains(&self.sources.lookback_days) {
            return Err(ConfigError::InvalidLookback(self.sources.lookback_days));
        }

        let urls = [
            ("sources.finnhub_base_url", &self.sources.finnhub_base_url),
            ("sources.sec_data_url", &self.sources.sec_data_url),
            ("sources.sec_archive_url", &self.sources.sec_archive_url),
            ("telegram.api_url", &self.telegram.api_url),
        ];
        for (field, value) in urls {
            if Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.watchlist.len(), 77);
        assert_eq!(config.storage.max_records, 500);
        assert_eq!(config.alerts.trade_cap(), Some(5));
        assert_eq!(config.alerts.filing_cap(), Some(3));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[general]
watchlist = ["AAPL", "TSLA"]
save_only_when_new = false

[sources]
filings_provider = "sec"

[alerts]
min_trade_value = 50000
max_trade_alerts = 0
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.general.watchlist, vec!["AAPL", "TSLA"]);
        assert!(!config.general.save_only_when_new);
        assert_eq!(config.sources.filings_provider, FilingsProvider::Sec);
        assert_eq!(config.sources.sec_spacing_ms, MIN_SEC_SPACING_MS);
        assert_eq!(config.alerts.min_trade_value, dec!(50000));
        assert_eq!(config.alerts.trade_cap(), None);
        assert_eq!(config.storage.max_records, 500);
    }

    #[test]
    fn test_validate_rejects_fast_sec_spacing() {
        let mut config = Config::default();
        config.sources.sec_spacing_ms = 50;
        assert_eq!(config.validate(), Err(ConfigError::SecSpacingTooLow(50)));
    }

    #[test]
    fn test_validate_rejects_lookback_out_of_range() {
        let mut config = Config::default();
        for days in [0, -7, 3651, i64::MAX] {
            config.sources.lookback_days = days;
            assert_eq!(config.validate(), Err(ConfigError::InvalidLookback(days)));
        }
        config.sources.lookback_days = 3650;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_watchlist() {
        let mut config = Config::default();
        config.general.watchlist.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyWatchlist));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.telegram.api_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "telegram.api_url", .. })
        ));
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.general.watchlist.len(), 10);
        assert_eq!(config.sources.filings_provider, FilingsProvider::Finnhub);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/monitor.toml")));
        assert!(result.is_err());
    }
}
