//! One acquisition, driven as an explicit state machine.
//!
//! ```text
//! Collecting -> Locking -> Reconciling -> Succeeded
//!                               |
//!                               +-> Unwinding -> Failed
//!                               +-> Failed
//! ```
//!
//! Every path that may leave locks behind goes through `Unwinding`, so a
//! failed acquisition cannot return without releasing what it was granted.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use corral_common::error::{AcquireError, Inconsistency, LockerError, UnwindError};
use corral_common::job::JobId;
use corral_common::locker::{LockRequest, Locker};
use corral_common::target::Target;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What came back from the try-lock call.
#[derive(Debug)]
pub(crate) enum LockOutcome {
    Granted(Vec<String>),
    /// The locker reported an interruption along with what it had granted.
    Interrupted(Interruption, Vec<String>),
    /// The locker did not answer in time; what it granted is unknown.
    Abandoned(Interruption),
    Failed(LockerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interruption {
    Deadline,
    Cancellation,
}

/// The primary error an unwind is compensating for.
#[derive(Debug)]
pub(crate) enum Cause {
    Quorum { got: usize },
    Interrupted { kind: Interruption, granted: usize },
    Inconsistent(Inconsistency),
}

#[derive(Debug)]
pub(crate) enum Stage {
    Collecting,
    Locking,
    Reconciling(LockOutcome),
    Unwinding { release: Vec<Target>, cause: Cause },
    Succeeded(Vec<Target>),
    Failed(AcquireError),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Collecting => "collecting",
            Stage::Locking => "locking",
            Stage::Reconciling(_) => "reconciling",
            Stage::Unwinding { .. } => "unwinding",
            Stage::Succeeded(_) => "succeeded",
            Stage::Failed(_) => "failed",
        }
    }
}

/// State owned by a single `acquire` call. Dropped when the call returns.
pub(crate) struct LockSession<'a> {
    pub job: JobId,
    pub deadline: Instant,
    pub candidates: Vec<Target>,
    pub min_count: usize,
    pub max_count: usize,
    pub locker: &'a dyn Locker,
    pub cancel: &'a CancellationToken,
    /// How long a silent locker is waited for past the deadline or a
    /// cancellation, and the bound on each unlock call while unwinding.
    pub grace: Duration,
}

impl LockSession<'_> {
    pub async fn run(self) -> Result<Vec<Target>, AcquireError> {
        let mut stage = Stage::Collecting;

        loop {
            debug!(job = %self.job, stage = stage.name(), "acquisition stage");

            stage = match stage {
                Stage::Collecting => self.collect(),
                Stage::Locking => self.lock().await,
                Stage::Reconciling(outcome) => self.reconcile(outcome),
                Stage::Unwinding { release, cause } => self.unwind(release, cause).await,
                Stage::Succeeded(locked) => {
                    info!(
                        "Locked {} of {} candidate(s) for job {}",
                        locked.len(),
                        self.candidates.len(),
                        self.job
                    );
                    return Ok(locked);
                }
                Stage::Failed(err) => return Err(err),
            };
        }
    }

    fn collect(&self) -> Stage {
        if self.candidates.len() < self.min_count {
            return Stage::Failed(AcquireError::InsufficientCandidates {
                job: self.job,
                required: self.min_count,
                available: self.candidates.len(),
            });
        }
        Stage::Locking
    }

    async fn lock(&self) -> Stage {
        if self.cancel.is_cancelled() {
            return Stage::Failed(AcquireError::Cancelled {
                job: self.job,
                granted: 0,
                unwind: None,
            });
        }

        let request = LockRequest {
            job: self.job,
            deadline: self.deadline,
            candidates: &self.candidates,
            limit: self.max_count,
            cancel: self.cancel,
        };

        let outcome = tokio::select! {
            biased;

            result = self.locker.try_lock(request) => match result {
                Ok(ids) => LockOutcome::Granted(ids),
                Err(LockerError::Timeout { granted }) => {
                    LockOutcome::Interrupted(Interruption::Deadline, granted)
                }
                Err(LockerError::Cancelled { granted }) => {
                    LockOutcome::Interrupted(Interruption::Cancellation, granted)
                }
                Err(err) => LockOutcome::Failed(err),
            },

            _ = tokio::time::sleep_until(self.deadline + self.grace) => {
                LockOutcome::Abandoned(Interruption::Deadline)
            }

            _ = cancelled_then(self.cancel, self.grace) => {
                LockOutcome::Abandoned(Interruption::Cancellation)
            }
        };

        Stage::Reconciling(outcome)
    }

    fn reconcile(&self, outcome: LockOutcome) -> Stage {
        match outcome {
            LockOutcome::Granted(ids) => match self.resolve(ids) {
                Ok(locked) if locked.len() >= self.min_count => Stage::Succeeded(locked),
                Ok(locked) if locked.is_empty() => Stage::Failed(AcquireError::QuorumNotMet {
                    job: self.job,
                    required: self.min_count,
                    got: 0,
                    unwind: None,
                }),
                Ok(locked) => Stage::Unwinding {
                    cause: Cause::Quorum { got: locked.len() },
                    release: locked,
                },
                Err(violation) => self.unwind_everything(Cause::Inconsistent(violation)),
            },

            LockOutcome::Interrupted(kind, ids) => match self.resolve(ids) {
                Ok(granted) if granted.is_empty() => {
                    Stage::Failed(interrupted_error(self.job, kind, 0, None))
                }
                Ok(granted) => Stage::Unwinding {
                    cause: Cause::Interrupted {
                        kind,
                        granted: granted.len(),
                    },
                    release: granted,
                },
                Err(violation) => self.unwind_everything(Cause::Inconsistent(violation)),
            },

            LockOutcome::Abandoned(kind) => {
                warn!(
                    "Locker did not answer for job {}, releasing all {} candidate(s)",
                    self.job,
                    self.candidates.len()
                );
                self.unwind_everything(Cause::Interrupted { kind, granted: 0 })
            }

            LockOutcome::Failed(source) => Stage::Failed(AcquireError::Locker {
                job: self.job,
                source,
            }),
        }
    }

    /// Maps the locker's ids back onto candidate targets.
    fn resolve(&self, ids: Vec<String>) -> Result<Vec<Target>, Inconsistency> {
        if ids.len() > self.max_count {
            return Err(Inconsistency::ExceedsLimit {
                limit: self.max_count,
                got: ids.len(),
            });
        }

        let by_id: HashMap<&str, &Target> =
            self.candidates.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut seen: HashSet<&str> = HashSet::with_capacity(ids.len());
        let mut locked = Vec::with_capacity(ids.len());

        for id in &ids {
            let Some(target) = by_id.get(id.as_str()) else {
                return Err(Inconsistency::UnknownTarget(id.clone()));
            };
            if !seen.insert(target.id.as_str()) {
                return Err(Inconsistency::DuplicateTarget(id.clone()));
            }
            locked.push((*target).clone());
        }

        Ok(locked)
    }

    /// Used when the granted set cannot be trusted. Unlock is idempotent and
    /// only touches the job's own locks, so releasing every candidate is safe.
    fn unwind_everything(&self, cause: Cause) -> Stage {
        Stage::Unwinding {
            release: self.candidates.clone(),
            cause,
        }
    }

    async fn unwind(&self, release: Vec<Target>, cause: Cause) -> Stage {
        warn!(
            "Releasing {} lock(s) for job {} after a failed acquisition",
            release.len(),
            self.job
        );

        // One budget for the whole unwind, however many targets it covers.
        let budget = Instant::now() + self.grace;
        let mut failures = Vec::new();
        for (position, target) in release.iter().enumerate() {
            let unlocked = tokio::time::timeout_at(
                budget,
                self.locker.unlock(self.job, std::slice::from_ref(target)),
            )
            .await;

            let err = match unlocked {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(_) => {
                    let pending = &release[position..];
                    warn!(
                        "Unwind budget of {:?} spent with {} release(s) pending for job {}",
                        self.grace,
                        pending.len(),
                        self.job
                    );
                    failures.extend(pending.iter().map(|target| {
                        let err = LockerError::Backend(format!(
                            "unlock not completed within the {:?} unwind budget",
                            self.grace
                        ));
                        (target.id.clone(), err)
                    }));
                    break;
                }
            };
            warn!("Failed to release {} for job {}: {}", target.id, self.job, err);
            failures.push((target.id.clone(), err));
        }

        let unwind = (!failures.is_empty()).then(|| UnwindError {
            attempted: release.len(),
            failures,
        });

        Stage::Failed(match cause {
            Cause::Quorum { got } => AcquireError::QuorumNotMet {
                job: self.job,
                required: self.min_count,
                got,
                unwind,
            },
            Cause::Interrupted { kind, granted } => interrupted_error(self.job, kind, granted, unwind),
            Cause::Inconsistent(violation) => AcquireError::LockerInconsistency {
                job: self.job,
                violation,
                unwind,
            },
        })
    }
}

fn interrupted_error(
    job: JobId,
    kind: Interruption,
    granted: usize,
    unwind: Option<UnwindError>,
) -> AcquireError {
    match kind {
        Interruption::Deadline => AcquireError::LockTimeout {
            job,
            granted,
            unwind,
        },
        Interruption::Cancellation => AcquireError::Cancelled {
            job,
            granted,
            unwind,
        },
    }
}

/// Resolves `grace` after `cancel` fires, giving the locker a chance to
/// report what it granted before being abandoned.
async fn cancelled_then(cancel: &CancellationToken, grace: Duration) {
    cancel.cancelled().await;
    tokio::time::sleep(grace).await;
}
