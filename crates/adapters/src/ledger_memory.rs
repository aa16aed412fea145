//! In-memory post ledger for testing and offline mode

use async_trait::async_trait;
use autoposter_domain::{
    Clock, LedgerError, NewPostRecord, Platform, PostLedger, PostRecord, SystemClock,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory post ledger implementation
///
/// Records are kept in insertion order so pending retrieval matches the
/// oldest-first semantics of the SQLite ledger.
pub struct InMemoryLedger {
    records: RwLock<HashMap<(Platform, String), PostRecord>>,
    insertion_order: RwLock<Vec<(Platform, String)>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            insertion_order: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostLedger for InMemoryLedger {
    async fn has_been_posted(
        &self,
        platform: Platform,
        source_url: &str,
    ) -> Result<bool, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(records
            .get(&(platform, source_url.to_string()))
            .map(|r| r.posted_at.is_some())
            .unwrap_or(false))
    }

    async fn exists_record(
        &self,
        platform: Platform,
        source_url: &str,
    ) -> Result<bool, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(records.contains_key(&(platform, source_url.to_string())))
    }

    async fn record_post(&self, record: NewPostRecord) -> Result<(), LedgerError> {
        let key = (record.platform, record.source_url.clone());
        let now = self.clock.now();

        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let existing = records.get(&key);
        if existing.is_none() {
            self.insertion_order
                .write()
                .map_err(|e| LedgerError::Database(e.to_string()))?
                .push(key.clone());
        }

        // Upsert semantics mirror the SQLite ledger: stored text and a set
        // posted_at are never reverted by a later write
        let merged = PostRecord {
            platform: record.platform,
            source: record.source,
            source_url: record.source_url,
            title: record
                .title
                .or_else(|| existing.and_then(|r| r.title.clone())),
            linkedin_text: record
                .linkedin_text
                .or_else(|| existing.and_then(|r| r.linkedin_text.clone())),
            x_text: record
                .x_text
                .or_else(|| existing.and_then(|r| r.x_text.clone())),
            posted_at: record
                .success
                .then_some(now)
                .or_else(|| existing.and_then(|r| r.posted_at)),
            error: record.error,
            created_at: existing.map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
        };
        records.insert(key, merged);

        Ok(())
    }

    async fn fetch_pending(
        &self,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<PostRecord>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let order = self
            .insertion_order
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(order
            .iter()
            .filter(|(p, _)| *p == platform)
            .filter_map(|key| records.get(key))
            .filter(|r| r.posted_at.is_none())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_success(&self, platform: Platform, source_url: &str) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let record = records
            .get_mut(&(platform, source_url.to_string()))
            .ok_or_else(|| LedgerError::NotFound {
                platform,
                source_url: source_url.to_string(),
            })?;

        record.posted_at = Some(now);
        record.error = None;
        record.updated_at = now;
        Ok(())
    }

    async fn mark_error(
        &self,
        platform: Platform,
        source_url: &str,
        error: &str,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let record = records
            .get_mut(&(platform, source_url.to_string()))
            .ok_or_else(|| LedgerError::NotFound {
                platform,
                source_url: source_url.to_string(),
            })?;

        record.error = Some(error.to_string());
        record.updated_at = now;
        Ok(())
    }
}
