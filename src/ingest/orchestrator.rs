use crate::data::{CanonicalFiling, CanonicalTrade};
use crate::ingest::normalizer::{filing_id, normalize_filing, normalize_trade};
use crate::notify::{render_filing, render_trade, Channel, Notifier};
use crate::sources::{FilingSource, TradeSource};
use crate::store::{Dataset, DatasetStore, SeenIdStore};
use crate::utils::config::{Config, StorageConfig};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Knobs that decide what gets alerted and when state is written
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Trades with a known value below this are skipped
    pub min_trade_value: Decimal,
    pub trade_alert_cap: Option<usize>,
    pub filing_alert_cap: Option<usize>,
    /// Skip every write when the run changed nothing
    pub save_only_when_new: bool,
    /// Fetch and log only: no alerts, no writes
    pub dry_run: bool,
}

impl RunPolicy {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            min_trade_value: config.alerts.min_trade_value,
            trade_alert_cap: config.alerts.trade_cap(),
            filing_alert_cap: config.alerts.filing_cap(),
            save_only_when_new: config.general.save_only_when_new,
            dry_run,
        }
    }
}

/// Per-run counters, logged at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub symbols: usize,
    pub trades_fetched: usize,
    pub trades_rejected: usize,
    pub trades_already_seen: usize,
    pub trades_below_threshold: usize,
    pub new_trades: usize,
    pub filings_fetched: usize,
    pub filings_rejected: usize,
    pub filings_already_seen: usize,
    pub new_filings: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub alerts_suppressed: usize,
    pub saved: bool,
}

/// What happened to one record's alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertOutcome {
    Delivered,
    Failed,
    /// Channel has no credentials
    Disabled,
    /// Over this run's cap
    Suppressed,
    DryRun,
}

impl AlertOutcome {
    /// Only a failed delivery leaves the id out of the seen set, so the
    /// alert is retried next run
    fn marks_seen(self) -> bool {
        matches!(
            self,
            AlertOutcome::Delivered | AlertOutcome::Disabled | AlertOutcome::Suppressed
        )
    }
}

/// Persistent state of the monitor: dedup sets and datasets
pub struct MonitorState {
    pub seen_trades: SeenIdStore,
    pub seen_filings: SeenIdStore,
    pub trades: Dataset<CanonicalTrade>,
    pub filings: Dataset<CanonicalFiling>,
    trade_store: DatasetStore<CanonicalTrade>,
    filing_store: DatasetStore<CanonicalFiling>,
}

impl MonitorState {
    pub fn load(storage: &StorageConfig) -> Self {
        let trade_store = DatasetStore::new(&storage.trades_path, storage.max_records);
        let filing_store = DatasetStore::new(&storage.filings_path, storage.max_records);

        Self {
            seen_trades: SeenIdStore::load(&storage.seen_trades_path),
            seen_filings: SeenIdStore::load(&storage.seen_filings_path),
            trades: trade_store.load(),
            filings: filing_store.load(),
            trade_store,
            filing_store,
        }
    }

    /// Write all four files; a failure on one does not stop the others
    pub fn persist(&mut self) -> bool {
        let mut ok = true;

        if let Err(e) = self.trade_store.save(&mut self.trades) {
            error!("Saving {} failed: {}", self.trade_store.path().display(), e);
            ok = false;
        }
        if let Err(e) = self.filing_store.save(&mut self.filings) {
            error!("Saving {} failed: {}", self.filing_store.path().display(), e);
            ok = false;
        }
        if let Err(e) = self.seen_trades.persist() {
            error!("Saving {} failed: {}", self.seen_trades.path().display(), e);
            ok = false;
        }
        if let Err(e) = self.seen_filings.persist() {
            error!("Saving {} failed: {}", self.seen_filings.path().display(), e);
            ok = false;
        }

        ok
    }
}

/// Sequential run over the watchlist: fetch, dedup, record, alert, persist
pub struct Orchestrator {
    watchlist: Vec<String>,
    policy: RunPolicy,
    trade_source: Box<dyn TradeSource>,
    filing_source: Box<dyn FilingSource>,
    notifier: Box<dyn Notifier>,
    state: MonitorState,
}

impl Orchestrator {
    pub fn new(
        watchlist: Vec<String>,
        policy: RunPolicy,
        trade_source: Box<dyn TradeSource>,
        filing_source: Box<dyn FilingSource>,
        notifier: Box<dyn Notifier>,
        state: MonitorState,
    ) -> Self {
        Self {
            watchlist,
            policy,
            trade_source,
            filing_source,
            notifier,
            state,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn into_state(self) -> MonitorState {
        self.state
    }

    async fn alert(
        &mut self,
        channel: Channel,
        message: &str,
        attempts: &mut usize,
        cap: Option<usize>,
    ) -> AlertOutcome {
        if self.policy.dry_run {
            return AlertOutcome::DryRun;
        }
        if !self.notifier.is_enabled(channel) {
            return AlertOutcome::Disabled;
        }
        if cap.is_some_and(|cap| *attempts >= cap) {
            return AlertOutcome::Suppressed;
        }

        *attempts += 1;
        if self.notifier.send(message, channel).await {
            AlertOutcome::Delivered
        } else {
            AlertOutcome::Failed
        }
    }

    fn tally(summary: &mut RunSummary, outcome: AlertOutcome) {
        match outcome {
            AlertOutcome::Delivered => summary.alerts_sent += 1,
            AlertOutcome::Failed => summary.alerts_failed += 1,
            AlertOutcome::Suppressed => summary.alerts_suppressed += 1,
            AlertOutcome::Disabled | AlertOutcome::DryRun => {}
        }
    }

    async fn process_trades(
        &mut self,
        symbol: &str,
        attempts: &mut usize,
        summary: &mut RunSummary,
    ) {
        let raws = self.trade_source.fetch_trades(symbol).await;
        summary.trades_fetched += raws.len();

        let mut batch: Vec<CanonicalTrade> = Vec::new();

        for raw in &raws {
            let trade = match normalize_trade(raw, symbol) {
                Ok(trade) => trade,
                Err(e) => {
                    debug!("{}: dropping insider record: {}", symbol, e);
                    summary.trades_rejected += 1;
                    continue;
                }
            };

            if self.state.seen_trades.contains(&trade.id)
                || batch.iter().any(|t| t.id == trade.id)
            {
                summary.trades_already_seen += 1;
                continue;
            }

            if let Some(value) = trade.total_value {
                if value < self.policy.min_trade_value {
                    debug!("{}: {} below alert threshold ({})", symbol, trade.id, value);
                    summary.trades_below_threshold += 1;
                    continue;
                }
            }

            if !self.state.trades.contains(&trade.id) {
                summary.new_trades += 1;
                info!(
                    "{}: new {} by {} ({} shares)",
                    symbol, trade.direction, trade.insider_name, trade.shares
                );
            }

            let message = render_trade(&trade);
            let outcome = self
                .alert(Channel::Trades, &message, attempts, self.policy.trade_alert_cap)
                .await;
            Self::tally(summary, outcome);
            if outcome.marks_seen() {
                self.state.seen_trades.add(trade.id.clone());
            } else if outcome == AlertOutcome::Failed {
                warn!("{}: alert for {} not delivered, will retry next run", symbol, trade.id);
            }

            batch.push(trade);
        }

        self.state.trades.prepend(batch);
    }

    async fn process_filings(
        &mut self,
        symbol: &str,
        attempts: &mut usize,
        summary: &mut RunSummary,
    ) {
        let raws = self.filing_source.fetch_filings(symbol).await;
        summary.filings_fetched += raws.len();

        let mut batch: Vec<CanonicalFiling> = Vec::new();

        for raw in &raws {
            let id = filing_id(symbol, raw);
            if self.state.seen_filings.contains(&id) || batch.iter().any(|f| f.id == id) {
                summary.filings_already_seen += 1;
                continue;
            }

            // A filing recorded on an earlier run whose alert failed: reuse
            // the stored copy instead of downloading the document again
            let filing = match self.state.filings.get(&id) {
                Some(existing) => existing.clone(),
                None => {
                    let enrichment = self.filing_source.enrich(raw).await;
                    match normalize_filing(raw, symbol, &enrichment) {
                        Ok(filing) => {
                            summary.new_filings += 1;
                            info!(
                                "{}: new {} {} (items: {})",
                                symbol,
                                filing.form_type,
                                filing.access_number,
                                filing.items.iter().cloned().collect::<Vec<_>>().join(", ")
                            );
                            filing
                        }
                        Err(e) => {
                            debug!("{}: dropping filing record: {}", symbol, e);
                            summary.filings_rejected += 1;
                            continue;
                        }
                    }
                }
            };

            let message = render_filing(&filing);
            let outcome = self
                .alert(Channel::Filings, &message, attempts, self.policy.filing_alert_cap)
                .await;
            Self::tally(summary, outcome);
            if outcome.marks_seen() {
                self.state.seen_filings.add(filing.id.clone());
            } else if outcome == AlertOutcome::Failed {
                warn!("{}: alert for {} not delivered, will retry next run", symbol, filing.id);
            }

            batch.push(filing);
        }

        self.state.filings.prepend(batch);
    }

    /// One full pass over the watchlist, then persistence per policy
    pub async fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary {
            symbols: self.watchlist.len(),
            ..Default::default()
        };
        let trades_before = self.state.trades.len();
        let filings_before = self.state.filings.len();
        let seen_before = self.state.seen_trades.added() + self.state.seen_filings.added();

        let mut trade_attempts = 0;
        let mut filing_attempts = 0;

        let watchlist = self.watchlist.clone();
        for symbol in &watchlist {
            self.process_trades(symbol, &mut trade_attempts, &mut summary)
                .await;
            self.process_filings(symbol, &mut filing_attempts, &mut summary)
                .await;
        }

        let changed = self.state.trades.len() != trades_before
            || self.state.filings.len() != filings_before
            || self.state.seen_trades.added() + self.state.seen_filings.added() != seen_before;

        if self.policy.dry_run {
            info!("Dry run: nothing written");
        } else if self.policy.save_only_when_new && !changed {
            info!("No new data; skipping file updates");
        } else {
            summary.saved = self.state.persist();
            if summary.saved {
                info!(
                    "Saved {} trades and {} filings",
                    self.state.trades.len(),
                    self.state.filings.len()
                );
            }
        }

        summary
    }
}
