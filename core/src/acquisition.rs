//! # Acquisition Coordinator
//!
//! Reserves a bounded, quorum-checked subset of the candidate targets for one
//! job through a [`Locker`].
//!
//! The coordinator holds no state between calls; each `acquire` builds a
//! `LockSession`, runs it to a terminal stage and drops it. Any
//! number of acquisitions for different jobs may run concurrently, mutual
//! exclusion over targets is the locker's job.
//!
//! A single try-lock attempt is made per call. Retrying with a fresh deadline
//! is left to the caller.

use std::sync::Arc;
use std::time::Duration;

use corral_common::error::AcquireError;
use corral_common::job::JobId;
use corral_common::locker::Locker;
use corral_common::request::AcquisitionRequest;
use corral_common::target::Target;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

mod session;

use session::LockSession;

const DEFAULT_GRACE: Duration = Duration::from_secs(1);

pub struct AcquisitionCoordinator {
    locker: Arc<dyn Locker>,
    grace: Duration,
}

impl AcquisitionCoordinator {
    pub fn new(locker: Arc<dyn Locker>) -> Self {
        Self {
            locker,
            grace: DEFAULT_GRACE,
        }
    }

    /// Sets how long a locker that has not answered by the deadline (or after
    /// a cancellation) is waited for before its grants are released blindly.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Locks between `request.min_count` and `request.max_count` of
    /// `candidates` for `job`, or fails leaving nothing locked.
    ///
    /// `candidates` are expected to be filtered and, if requested, shuffled
    /// already. The returned targets are all drawn from `candidates`.
    pub async fn acquire(
        &self,
        job: JobId,
        deadline: Instant,
        candidates: Vec<Target>,
        request: &AcquisitionRequest,
    ) -> Result<Vec<Target>, AcquireError> {
        let cancel = CancellationToken::new();
        self.acquire_with_cancel(job, deadline, candidates, request, &cancel)
            .await
    }

    /// Same as [`acquire`](Self::acquire), aborting early once `cancel` fires.
    ///
    /// Locks granted before the cancellation was observed are released before
    /// returning [`AcquireError::Cancelled`].
    pub async fn acquire_with_cancel(
        &self,
        job: JobId,
        deadline: Instant,
        candidates: Vec<Target>,
        request: &AcquisitionRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Target>, AcquireError> {
        let session = LockSession {
            job,
            deadline,
            candidates,
            min_count: request.min_count,
            max_count: request.max_count,
            locker: self.locker.as_ref(),
            cancel,
            grace: self.grace,
        };

        session.run().await
    }
}
