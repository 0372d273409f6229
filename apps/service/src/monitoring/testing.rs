//! In-memory stand-ins for the probe and the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::probe::Probe;
use super::types::{MetricsRecord, ProbeOutput};
use super::validation::Target;
use crate::database::models::{parse_range, parse_since};
use crate::database::{MetricsStore, RetentionPolicy};
use crate::error::{Error, Result};

/// Probe that returns the same output every round and remembers its calls.
#[derive(Clone)]
pub struct FakeProbe {
    output: ProbeOutput,
    calls: Arc<Mutex<Vec<(String, u32)>>>,
}

impl FakeProbe {
    pub fn always(output: ProbeOutput) -> Self {
        Self { output, calls: Arc::default() }
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn run_round(&self, target: &Target, count: u32) -> ProbeOutput {
        self.calls.lock().unwrap().push((target.to_string(), count));
        self.output.clone()
    }
}

/// Vec-backed store whose first `failures` appends fail.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<MetricsRecord>>,
    failures: AtomicUsize,
}

impl MemoryStore {
    pub fn failing_first(failures: usize) -> Self {
        Self { records: Mutex::default(), failures: AtomicUsize::new(failures) }
    }

    pub fn records(&self) -> Vec<MetricsRecord> {
        self.records.lock().unwrap().clone()
    }

    fn sorted_where(&self, keep: impl Fn(&MetricsRecord) -> bool) -> Vec<MetricsRecord> {
        let mut records: Vec<_> = self.records().into_iter().filter(|r| keep(r)).collect();
        records.sort_by_key(|r| r.timestamp);
        records
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn append(&self, record: &MetricsRecord, retention_days: u32) -> Result<u64> {
        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::Pool { reason: "simulated outage".into() });
        }

        let policy = RetentionPolicy::new(retention_days);
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        let before = records.len();
        records.retain(|r| !policy.is_expired(r.timestamp, now));
        Ok((before - records.len()) as u64)
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<MetricsRecord>> {
        let records = self.sorted_where(|_| true);
        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).collect())
    }

    async fn query_range(&self, start: &str, end: &str) -> Result<Vec<MetricsRecord>> {
        let (start, end) = parse_range(start, end)?;
        Ok(self.sorted_where(|r| start <= r.timestamp && r.timestamp <= end))
    }

    async fn query_since(&self, since: &str) -> Result<Vec<MetricsRecord>> {
        let since = parse_since(since)?;
        Ok(self.sorted_where(|r| r.timestamp > since))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.lock().unwrap().len() as u64)
    }
}
