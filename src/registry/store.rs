// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Registry persistence
//!
//! Records group by hash; every (hash, size) variant of a hash is kept so a
//! demoted authorization survives next to its replacement. All writes for
//! one hash go through a single store entry, which is what makes two
//! concurrent first-observations of the same hash collapse into one row.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::record::{Disposition, ScriptRecord};
use crate::error::Result;

/// Filter for registry scans
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Match a single disposition
    pub disposition: Option<Disposition>,
    /// Match records whose source host contains this substring
    pub host_contains: Option<String>,
}

impl RecordFilter {
    /// Filter by disposition
    pub fn disposition(disposition: Disposition) -> Self {
        Self {
            disposition: Some(disposition),
            ..Default::default()
        }
    }

    /// Restrict to hosts containing a substring
    pub fn host_contains(mut self, needle: impl Into<String>) -> Self {
        self.host_contains = Some(needle.into());
        self
    }

    fn matches(&self, record: &ScriptRecord) -> bool {
        if let Some(d) = self.disposition {
            if record.disposition != d {
                return false;
            }
        }
        if let Some(ref needle) = self.host_contains {
            match record.host() {
                Some(host) if host.contains(needle.as_str()) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Registry store abstraction
///
/// `upsert` must be atomic per hash: two concurrent first-observations of
/// the same hash must resolve to a single stored variant, with the loser
/// updating the winner's row rather than erroring.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Insert or replace the (hash, size) variant of a record
    async fn upsert(&self, record: ScriptRecord) -> Result<()>;

    /// All variants stored under a hash
    async fn find(&self, hash: &str) -> Result<Vec<ScriptRecord>>;

    /// The exact (hash, size) variant, if seen before
    async fn find_exact(&self, hash: &str, size: u64) -> Result<Option<ScriptRecord>>;

    /// Set the disposition of every variant sharing a hash.
    /// Returns the number of updated records.
    async fn set_disposition(&self, hash: &str, disposition: Disposition) -> Result<usize>;

    /// Demote every authorized variant of a hash to pending.
    /// Returns the number of demoted records.
    async fn demote_authorized(&self, hash: &str) -> Result<usize>;

    /// Filtered scan over all records
    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<ScriptRecord>>;

    /// Whole-store teardown (uninstall); the only way records are deleted
    async fn clear(&self) -> Result<()>;

    /// All pending records
    async fn pending(&self) -> Result<Vec<ScriptRecord>> {
        self.scan(&RecordFilter::disposition(Disposition::Pending))
            .await
    }

    /// All declined records
    async fn declined(&self) -> Result<Vec<ScriptRecord>> {
        self.scan(&RecordFilter::disposition(Disposition::Declined))
            .await
    }

    /// All authorized records
    async fn authorized(&self) -> Result<Vec<ScriptRecord>> {
        self.scan(&RecordFilter::disposition(Disposition::Authorized))
            .await
    }

    /// Number of records with a disposition
    async fn count(&self, disposition: Disposition) -> Result<usize> {
        Ok(self.scan(&RecordFilter::disposition(disposition)).await?.len())
    }
}

/// In-memory registry store
///
/// The DashMap entry lock serializes all writes for one hash, giving the
/// conditional-upsert semantics the classifier needs without any
/// cross-request locking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, Vec<ScriptRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored variants
    pub fn len(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn upsert(&self, record: ScriptRecord) -> Result<()> {
        let mut variants = self.records.entry(record.hash.clone()).or_default();
        match variants.iter_mut().find(|r| r.size == record.size) {
            Some(existing) => *existing = record,
            None => variants.push(record),
        }
        Ok(())
    }

    async fn find(&self, hash: &str) -> Result<Vec<ScriptRecord>> {
        Ok(self
            .records
            .get(hash)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn find_exact(&self, hash: &str, size: u64) -> Result<Option<ScriptRecord>> {
        Ok(self
            .records
            .get(hash)
            .and_then(|entry| entry.value().iter().find(|r| r.size == size).cloned()))
    }

    async fn set_disposition(&self, hash: &str, disposition: Disposition) -> Result<usize> {
        let mut updated = 0;
        if let Some(mut entry) = self.records.get_mut(hash) {
            for record in entry.value_mut().iter_mut() {
                if record.disposition != disposition {
                    record.disposition = disposition;
                    record.last_updated = Utc::now();
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn demote_authorized(&self, hash: &str) -> Result<usize> {
        let mut demoted = 0;
        if let Some(mut entry) = self.records.get_mut(hash) {
            for record in entry.value_mut().iter_mut() {
                if record.disposition == Disposition::Authorized {
                    record.disposition = Disposition::Pending;
                    record.last_updated = Utc::now();
                    demoted += 1;
                }
            }
        }
        Ok(demoted)
    }

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<ScriptRecord>> {
        let mut out = Vec::new();
        for entry in self.records.iter() {
            for record in entry.value() {
                if filter.matches(record) {
                    out.push(record.clone());
                }
            }
        }
        out.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(out)
    }

    async fn clear(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }
}
