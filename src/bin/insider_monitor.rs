use anyhow::{Context, Result};
use clap::Parser;
use insider_monitor::sources::{FilingSource, TradeSource};
use insider_monitor::{
    CikDirectory, Config, DocumentFetcher, FilingsProvider, FinnhubClient, MonitorState,
    Orchestrator, RunPolicy, SecClient, Secrets, TelegramNotifier,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// One pass over the watchlist: fetch insider trades and 8-K filings,
/// alert on anything new, update the datasets
#[derive(Debug, Parser)]
#[command(name = "insider_monitor", version)]
struct Args {
    /// TOML config file (defaults to $CONFIG_FILE or config/monitor.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fetch and log only; send nothing and write nothing
    #[arg(long)]
    dry_run: bool,

    /// Comma-separated symbols replacing the configured watchlist
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Overrides logging.level
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

fn document_fetcher(config: &Config) -> Result<Option<DocumentFetcher>> {
    if !config.sources.enrich_filings {
        return Ok(None);
    }

    let fetcher = DocumentFetcher::new(
        &config.sources.sec_user_agent,
        Duration::from_secs(config.sources.document_timeout_secs),
        config.sources.sec_spacing(),
        config.sources.rate_limit_backoff(),
    )
    .context("building filing document client")?;
    Ok(Some(fetcher))
}

fn filing_source(config: &Config, secrets: &Secrets) -> Result<Box<dyn FilingSource>> {
    let documents = document_fetcher(config)?;

    let source: Box<dyn FilingSource> = match config.sources.filings_provider {
        FilingsProvider::Finnhub => Box::new(
            FinnhubClient::new(&config.sources, secrets.finnhub_api_key.clone(), documents)
                .context("building Finnhub filings client")?,
        ),
        FilingsProvider::Sec => {
            let ciks = CikDirectory::load(config.storage.cik_cache_path.as_deref());
            info!("SEC filings provider with {} known CIKs", ciks.len());
            Box::new(
                SecClient::new(&config.sources, ciks, documents)
                    .context("building SEC submissions client")?,
            )
        }
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.output = "json".to_string();
    }
    insider_monitor::utils::init_from_config(&config.logging)?;

    if let Some(symbols) = args.symbols {
        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !symbols.is_empty() {
            config.general.watchlist = symbols;
        }
    }

    info!(
        "Insider monitor starting: {} symbols, filings via {:?}{}",
        config.general.watchlist.len(),
        config.sources.filings_provider,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let secrets = Secrets::from_env();
    if secrets.chat_id.is_none() {
        warn!("CHAT_ID not set; alerts are disabled for this run");
    }

    let trade_source: Box<dyn TradeSource> = Box::new(
        FinnhubClient::new(&config.sources, secrets.finnhub_api_key.clone(), None)
            .context("building Finnhub trades client")?,
    );
    let filing_source = filing_source(&config, &secrets)?;

    let notifier = TelegramNotifier::new(
        &config.telegram.api_url,
        secrets.chat_id.clone(),
        secrets.trade_bot_token.clone(),
        secrets.filing_bot_token.clone(),
        Duration::from_secs(config.alerts.send_timeout_secs),
        Duration::from_millis(config.alerts.send_spacing_ms),
    )
    .context("building Telegram client")?;

    let state = MonitorState::load(&config.storage);
    let policy = RunPolicy::from_config(&config, args.dry_run);

    let mut orchestrator = Orchestrator::new(
        config.general.watchlist.clone(),
        policy,
        trade_source,
        filing_source,
        Box::new(notifier),
        state,
    );

    let summary = orchestrator.run().await;

    info!(
        "Run complete: {} new trades, {} new filings, {} alerts sent, {} failed, {} suppressed",
        summary.new_trades,
        summary.new_filings,
        summary.alerts_sent,
        summary.alerts_failed,
        summary.alerts_suppressed
    );
    info!("Summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
