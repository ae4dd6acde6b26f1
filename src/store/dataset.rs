use crate::data::{CanonicalFiling, CanonicalTrade, FilingStats, TradeStats};
use crate::error::StoreError;
use crate::store::write_atomic;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A record type that can live in a rolling dataset file
pub trait DatasetRecord: Serialize + DeserializeOwned + Clone + Debug {
    /// Key of the record array in the JSON document
    const COLLECTION: &'static str;

    type Stats: Serialize + DeserializeOwned + Default + Clone + PartialEq + Debug;

    fn record_id(&self) -> &str;

    /// Saved datasets are ordered by this key, largest first
    fn sort_key(&self) -> (NaiveDate, &str);

    fn summarize(records: &[Self]) -> Self::Stats;
}

impl DatasetRecord for CanonicalTrade {
    const COLLECTION: &'static str = "trades";
    type Stats = TradeStats;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> (NaiveDate, &str) {
        (self.filing_date, "")
    }

    fn summarize(records: &[Self]) -> TradeStats {
        TradeStats::from_records(records)
    }
}

impl DatasetRecord for CanonicalFiling {
    const COLLECTION: &'static str = "filings";
    type Stats = FilingStats;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> (NaiveDate, &str) {
        (self.filed_date, &self.accepted_date)
    }

    fn summarize(records: &[Self]) -> FilingStats {
        FilingStats::from_records(records)
    }
}

/// In-memory working copy, newest first
#[derive(Debug, Clone)]
pub struct Dataset<R: DatasetRecord> {
    records: Vec<R>,
    stats: R::Stats,
    last_updated: Option<DateTime<Utc>>,
}

impl<R: DatasetRecord> Default for Dataset<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            stats: R::Stats::default(),
            last_updated: None,
        }
    }
}

impl<R: DatasetRecord> Dataset<R> {
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn stats(&self) -> &R::Stats {
        &self.stats
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.record_id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.record_id() == id)
    }

    /// Insert `batch` at the front, keeping its order. Records whose id is
    /// already present are dropped. Returns how many were inserted.
    pub fn prepend(&mut self, batch: Vec<R>) -> usize {
        let mut ids: HashSet<String> =
            self.records.iter().map(|r| r.record_id().to_string()).collect();

        let fresh: Vec<R> = batch
            .into_iter()
            .filter(|r| ids.insert(r.record_id().to_string()))
            .collect();

        let inserted = fresh.len();
        if inserted > 0 {
            self.records.splice(0..0, fresh);
        }
        inserted
    }
}

/// JSON file holding one record type, its stats and a timestamp
#[derive(Debug, Clone)]
pub struct DatasetStore<R> {
    path: PathBuf,
    max_records: usize,
    _record: PhantomData<R>,
}

impl<R: DatasetRecord> DatasetStore<R> {
    pub fn new<P: AsRef<Path>>(path: P, max_records: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_records,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or corrupt files load as an empty dataset with zeroed stats.
    /// Individual records that no longer parse are dropped.
    pub fn load(&self) -> Dataset<R> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No dataset at {}, starting empty", self.path.display());
                return Dataset::default();
            }
            Err(e) => {
                warn!("Unreadable dataset {} ({}), starting empty", self.path.display(), e);
                return Dataset::default();
            }
        };

        let mut document = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(document)) => document,
            Ok(_) | Err(_) => {
                warn!("Corrupt dataset {}, starting empty", self.path.display());
                return Dataset::default();
            }
        };

        let records: Vec<R> = match document.remove(R::COLLECTION) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value(item) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        debug!("Dropping unreadable {} entry: {}", R::COLLECTION, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        let stats = document
            .remove("stats")
            .and_then(|stats| serde_json::from_value(stats).ok())
            .unwrap_or_else(|| R::summarize(&records));

        let last_updated = document
            .remove("lastUpdated")
            .and_then(|ts| serde_json::from_value(ts).ok());

        info!(
            "Loaded {} {} from {}",
            records.len(),
            R::COLLECTION,
            self.path.display()
        );

        Dataset {
            records,
            stats,
            last_updated,
        }
    }

    /// Order newest first, truncate to the retention cap, recompute stats
    /// over exactly what is kept, and write atomically. The sort is stable,
    /// so records with equal keys keep their insertion order.
    pub fn save(&self, dataset: &mut Dataset<R>) -> Result<(), StoreError> {
        dataset
            .records
            .sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        dataset.records.truncate(self.max_records);
        dataset.stats = R::summarize(&dataset.records);
        let now = Utc::now();

        let mut document = Map::new();
        document.insert(
            R::COLLECTION.to_string(),
            serde_json::to_value(&dataset.records)?,
        );
        document.insert("stats".to_string(), serde_json::to_value(&dataset.stats)?);
        document.insert("lastUpdated".to_string(), serde_json::to_value(now)?);

        let json = serde_json::to_string_pretty(&Value::Object(document))?;
        write_atomic(&self.path, json.as_bytes())?;
        dataset.last_updated = Some(now);

        debug!(
            "Saved {} {} to {}",
            dataset.records.len(),
            R::COLLECTION,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Direction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn trade(id: &str, direction: Direction, value: Option<i64>) -> CanonicalTrade {
        CanonicalTrade {
            id: id.to_string(),
            symbol: "TSLA".to_string(),
            insider_name: "Musk Elon".to_string(),
            direction,
            shares: 10,
            price_per_share: value.map(|v| Decimal::from(v) / Decimal::from(10)),
            total_value: value.map(Decimal::from),
            shares_owned_after: 100,
            transaction_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            filing_date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            transaction_code: "S".to_string(),
            transaction_description: "Open market sale".to_string(),
            source_link: "https://www.sec.gov".to_string(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty_with_zero_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store: DatasetStore<CanonicalTrade> =
            DatasetStore::new(dir.path().join("trades_data.json"), 500);

        let dataset = store.load();
        assert!(dataset.is_empty());
        assert_eq!(dataset.stats(), &TradeStats::default());
        assert_eq!(dataset.last_updated(), None);
    }

    #[test]
    fn test_prepend_keeps_batch_order_and_skips_known_ids() {
        let mut dataset = Dataset::<CanonicalTrade>::default();
        assert_eq!(dataset.prepend(vec![trade("old", Direction::Sell, None)]), 1);

        let inserted = dataset.prepend(vec![
            trade("new1", Direction::Buy, Some(5)),
            trade("old", Direction::Sell, None),
            trade("new2", Direction::Buy, Some(6)),
            trade("new1", Direction::Buy, Some(5)),
        ]);

        assert_eq!(inserted, 2);
        let ids: Vec<_> = dataset.records().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new1", "new2", "old"]);
    }

    #[test]
    fn test_save_truncates_and_stats_match_persisted_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/trades_data.json");
        let store: DatasetStore<CanonicalTrade> = DatasetStore::new(&path, 3);

        let mut dataset = Dataset::default();
        dataset.prepend(vec![
            trade("a", Direction::Buy, Some(100)),
            trade("b", Direction::Sell, None),
            trade("c", Direction::Sell, Some(50)),
            trade("d", Direction::Buy, Some(1_000_000)),
        ]);
        store.save(&mut dataset).unwrap();

        let reloaded = store.load();
        let ids: Vec<_> = reloaded.records().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(reloaded.stats(), &TradeStats::from_records(reloaded.records()));
        assert_eq!(reloaded.stats().buys, 1);
        assert_eq!(reloaded.stats().sells, 2);
        assert_eq!(reloaded.stats().total_value, Decimal::from(150));
        assert!(reloaded.last_updated().is_some());
    }

    #[test]
    fn test_save_orders_by_filing_date_then_insertion() {
        let dir = tempfile::tempdir().unwrap();
        let store: DatasetStore<CanonicalTrade> =
            DatasetStore::new(dir.path().join("trades_data.json"), 2);

        let mut older = trade("older", Direction::Buy, Some(1));
        older.filing_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut newest = trade("newest", Direction::Sell, Some(2));
        newest.filing_date = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();

        let mut dataset = Dataset::default();
        dataset.prepend(vec![older]);
        dataset.prepend(vec![
            trade("tie-first", Direction::Buy, None),
            trade("tie-second", Direction::Buy, None),
        ]);
        dataset.prepend(vec![newest]);
        store.save(&mut dataset).unwrap();

        let ids: Vec<_> = store.load().records().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["newest", "tie-first"]);
    }

    #[test]
    fn test_filings_order_by_filed_then_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store: DatasetStore<CanonicalFiling> =
            DatasetStore::new(dir.path().join("form8k_data.json"), 500);

        let filing = |id: &str, day: u32, accepted: &str| CanonicalFiling {
            id: id.to_string(),
            symbol: "AAPL".to_string(),
            form_type: "8-K".to_string(),
            filed_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            accepted_date: accepted.to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            report_url: String::new(),
            access_number: id.to_string(),
            items: Default::default(),
        };

        let mut dataset = Dataset::default();
        dataset.prepend(vec![
            filing("early", 1, "2024-05-01 08:00:00"),
            filing("late-morning", 2, "2024-05-02 08:00:00"),
            filing("late-evening", 2, "2024-05-02 17:00:00"),
        ]);
        store.save(&mut dataset).unwrap();

        let ids: Vec<_> = dataset.records().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["late-evening", "late-morning", "early"]);
    }

    #[test]
    fn test_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades_data.json");
        let store: DatasetStore<CanonicalTrade> = DatasetStore::new(&path, 500);

        let mut dataset = Dataset::default();
        dataset.prepend(vec![trade("a", Direction::Buy, Some(100))]);
        store.save(&mut dataset).unwrap();

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["trades"][0]["id"], "a");
        assert_eq!(json["stats"]["totalAlerts"], 1);
        assert!(json["lastUpdated"].is_string());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form8k_data.json");
        std::fs::write(&path, "{\"filings\": [").unwrap();

        let store: DatasetStore<CanonicalFiling> = DatasetStore::new(&path, 500);
        let dataset = store.load();
        assert!(dataset.is_empty());
        assert_eq!(dataset.stats(), &FilingStats::default());
    }

    #[test]
    fn test_bad_entries_dropped_and_missing_stats_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades_data.json");
        let good = serde_json::to_value(trade("good", Direction::Buy, Some(7))).unwrap();
        let document = serde_json::json!({ "trades": [good, {"id": "broken"}] });
        std::fs::write(&path, document.to_string()).unwrap();

        let store: DatasetStore<CanonicalTrade> = DatasetStore::new(&path, 500);
        let dataset = store.load();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.stats().buys, 1);
        assert_eq!(dataset.stats().total_value, Decimal::from(7));
    }
}
