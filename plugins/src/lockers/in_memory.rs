//! A process-local locker.
//!
//! Reservations live in a table keyed by target id. Each entry is a lease that
//! expires after the configured lock timeout, so a job that dies without
//! releasing its targets does not block them forever.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use corral_common::error::LockerError;
use corral_common::job::JobId;
use corral_common::locker::{LockRequest, Locker};
use corral_common::target::Target;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Lease {
    job: JobId,
    expires_at: Instant,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub struct InMemoryLocker {
    lock_timeout: Duration,
    leases: Mutex<HashMap<String, Lease>>,
}

impl InMemoryLocker {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// The job currently holding `id`, if its lease has not expired.
    pub fn holder(&self, id: &str) -> Option<JobId> {
        let now = Instant::now();
        self.table()
            .get(id)
            .filter(|lease| lease.is_live(now))
            .map(|lease| lease.job)
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Lease>> {
        // The table holds plain data, a panic elsewhere cannot leave it half-written.
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Locker for InMemoryLocker {
    async fn try_lock(&self, request: LockRequest<'_>) -> Result<Vec<String>, LockerError> {
        if request.cancel.is_cancelled() {
            return Err(LockerError::Cancelled { granted: Vec::new() });
        }

        let now = Instant::now();
        if now >= request.deadline {
            return Err(LockerError::Timeout { granted: Vec::new() });
        }

        let expires_at = now + self.lock_timeout;
        let mut table = self.table();
        let mut granted = Vec::with_capacity(request.limit.min(request.candidates.len()));
        let mut taken = HashSet::new();

        for target in request.candidates {
            if granted.len() >= request.limit {
                break;
            }
            if !taken.insert(target.id.as_str()) {
                continue;
            }

            let available = match table.get(&target.id) {
                Some(lease) => lease.job == request.job || !lease.is_live(now),
                None => true,
            };
            if !available {
                continue;
            }

            table.insert(
                target.id.clone(),
                Lease {
                    job: request.job,
                    expires_at,
                },
            );
            granted.push(target.id.clone());
        }

        debug!(
            "Granted {} of {} requested target(s) to job {}",
            granted.len(),
            request.limit,
            request.job
        );
        Ok(granted)
    }

    async fn unlock(&self, job: JobId, targets: &[Target]) -> Result<(), LockerError> {
        let mut table = self.table();
        for target in targets {
            if table.get(&target.id).is_some_and(|lease| lease.job == job) {
                table.remove(&target.id);
            }
        }
        Ok(())
    }
}
