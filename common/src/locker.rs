//! The **locker** port.
//!
//! A locker owns the reservation table shared by every job. The acquisition
//! core only ever talks to it through [`Locker`], so the backing store
//! (process memory, a database, a coordination service) stays swappable.
//!
//! Implementations are responsible for mutual exclusion per target id. They
//! must be safe to call from several acquisitions racing over overlapping
//! candidate sets.

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::LockerError;
use crate::job::JobId;
use crate::target::Target;

/// One try-lock call.
#[derive(Debug, Clone, Copy)]
pub struct LockRequest<'a> {
    pub job: JobId,
    pub deadline: Instant,
    /// Targets to pick from, in order of preference.
    pub candidates: &'a [Target],
    /// Most ids the locker may grant.
    pub limit: usize,
    pub cancel: &'a CancellationToken,
}

#[async_trait]
pub trait Locker: Send + Sync {
    /// Reserves up to `request.limit` of the candidates for `request.job`.
    ///
    /// Best-effort: fewer ids than the limit may be granted when other jobs
    /// hold some candidates, but never more, and never a target exclusively
    /// held by a different job. Returns the granted ids.
    ///
    /// When the deadline passes or cancellation is observed, the locker reports
    /// [`LockerError::Timeout`] or [`LockerError::Cancelled`] listing what it
    /// had already granted, so the caller can release it.
    async fn try_lock(&self, request: LockRequest<'_>) -> Result<Vec<String>, LockerError>;

    /// Releases the locks `job` holds on `targets`.
    ///
    /// Targets that are free or held by another job are left untouched and
    /// are not an error.
    async fn unlock(&self, job: JobId, targets: &[Target]) -> Result<(), LockerError>;
}
