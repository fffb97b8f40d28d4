use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use corral_common::config::Config;
use corral_common::error::LockerError;
use corral_common::job::JobId;
use corral_common::locker::{LockRequest, Locker};
use corral_common::logging;
use corral_common::target::{RawRecord, Target};
use corral_core::TargetManager;
use corral_plugins::catalogs::StaticCatalog;
use corral_plugins::lockers::InMemoryLocker;

/// Wraps an [`InMemoryLocker`], counting try-lock calls and failing the
/// unlock of selected targets.
pub struct ObservedLocker {
    pub inner: InMemoryLocker,
    pub try_lock_calls: AtomicUsize,
    pub failing_unlocks: HashSet<String>,
}

impl ObservedLocker {
    pub fn new() -> Arc<Self> {
        Self::failing_on(&[])
    }

    pub fn failing_on(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryLocker::new(Duration::from_secs(600)),
            try_lock_calls: AtomicUsize::new(0),
            failing_unlocks: ids.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn calls(&self) -> usize {
        self.try_lock_calls.load(Ordering::SeqCst)
    }

    pub fn holder(&self, id: &str) -> Option<JobId> {
        self.inner.holder(id)
    }
}

#[async_trait]
impl Locker for ObservedLocker {
    async fn try_lock(&self, request: LockRequest<'_>) -> Result<Vec<String>, LockerError> {
        self.try_lock_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.try_lock(request).await
    }

    async fn unlock(&self, job: JobId, targets: &[Target]) -> Result<(), LockerError> {
        if let Some(stuck) = targets.iter().find(|t| self.failing_unlocks.contains(&t.id)) {
            return Err(LockerError::Backend(format!("{} is stuck", stuck.id)));
        }
        self.inner.unlock(job, targets).await
    }
}

pub fn init_logging() {
    // Several tests race to install the subscriber; only the first wins.
    let _ = logging::init("debug");
}

/// `T1..=Tn` named `web01.example.com`, `web02.example.com`, ...
pub fn web_records(n: usize) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| {
            RawRecord::new(
                format!("T{i}"),
                format!("web{i:02}.example.com"),
                format!("10.0.0.{i}"),
                "",
            )
        })
        .collect()
}

pub fn manager(records: Vec<RawRecord>, locker: Arc<dyn Locker>) -> TargetManager {
    TargetManager::new(
        Box::new(StaticCatalog::new(records)),
        locker,
        Config {
            acquire_timeout: Duration::from_secs(5),
            ..Config::default()
        },
    )
}

pub fn ids(targets: &[Target]) -> Vec<String> {
    let mut ids: Vec<String> = targets.iter().map(|t| t.id.clone()).collect();
    ids.sort();
    ids
}
