use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::{
    domain::{Record, RecordId, ResultSet},
    protocol::{Page, PageQuery},
};

use crate::{error::ControllerError, Collection, PagingApi, RecordSource};

#[derive(Default)]
struct AppliedSearch {
    sequence: u64,
    items: ResultSet,
}

/// In-process record store; serves as both collection and record source.
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
    issued: AtomicU64,
    current: RwLock<AppliedSearch>,
    latency: Option<Duration>,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            issued: AtomicU64::new(0),
            current: RwLock::new(AppliedSearch::default()),
            latency: None,
            search_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    /// Inserts or replaces a record; the current result set is left alone
    /// until the next search.
    pub fn upsert(&self, record: Record) {
        let mut records = self.records.write();
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn remove(&self, id: RecordId) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|record| record.id != id);
        records.len() != before
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Collection for MemoryStore {
    async fn search(&self, query: &str) -> Result<ResultSet, ControllerError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.simulate_latency().await;
        let matched = ResultSet::new(
            self.records
                .read()
                .iter()
                .filter(|record| {
                    record
                        .profile
                        .as_ref()
                        .is_some_and(|profile| profile.matches(query))
                })
                .cloned()
                .collect::<Vec<_>>(),
        );
        let mut current = self.current.write();
        if sequence > current.sequence {
            current.sequence = sequence;
            current.items = matched.clone();
        }
        Ok(matched)
    }

    fn contains(&self, id: RecordId) -> bool {
        self.current.read().items.contains(id)
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    async fn fetch(&self, id: RecordId) -> Result<Record, ControllerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.records
            .read()
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(ControllerError::NotFound(id))
    }
}

/// Fixed item list served in pages of `page_size`.
pub struct MemoryPages<T> {
    items: Vec<T>,
    page_size: usize,
}

impl<T> MemoryPages<T> {
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> PagingApi<T> for MemoryPages<T> {
    async fn get_page_after(
        &self,
        _context_key: &str,
        query: PageQuery,
    ) -> Result<Page<T>, ControllerError> {
        let start = query.offset.min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        Ok(Page {
            items: self.items[start..end].to_vec(),
            has_more_items: end < self.items.len(),
        })
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
