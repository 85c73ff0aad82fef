//! In-memory `RecordStore` behind `RwLock`s.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

use super::{RecordStore, UpsertResult};
use crate::alerts::AlertLedger;
use crate::domain::{AlertKey, AlertRecord, AnalysisKey, AnalysisRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    analyses: RwLock<BTreeMap<AnalysisKey, AnalysisRecord>>,
    alerts: RwLock<BTreeMap<AlertKey, AlertRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis_count(&self) -> usize {
        self.analyses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl AlertLedger for MemoryStore {
    fn contains_alert(&self, key: &AlertKey) -> bool {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl RecordStore for MemoryStore {
    fn upsert_analysis(&self, record: AnalysisRecord) -> UpsertResult {
        let key = record.key();
        let mut analyses = self
            .analyses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match analyses.insert(key, record) {
            Some(_) => UpsertResult::Replaced,
            None => UpsertResult::Inserted,
        }
    }

    fn insert_alert(&self, alert: AlertRecord) -> bool {
        let key = alert.key();
        let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
        if alerts.contains_key(&key) {
            trace!(alert = %key, "alert already stored");
            return false;
        }
        alerts.insert(key, alert);
        true
    }

    fn analysis(&self, key: &AnalysisKey) -> Option<AnalysisRecord> {
        self.analyses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn analyses(&self) -> Vec<AnalysisRecord> {
        self.analyses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn alerts(&self) -> Vec<AlertRecord> {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
