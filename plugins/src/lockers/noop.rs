use async_trait::async_trait;
use corral_common::error::LockerError;
use corral_common::job::JobId;
use corral_common::locker::{LockRequest, Locker};
use corral_common::target::Target;

/// Grants every request without keeping any state.
///
/// Useful when targets are not shared between jobs, or in tests.
pub struct NoopLocker;

#[async_trait]
impl Locker for NoopLocker {
    async fn try_lock(&self, request: LockRequest<'_>) -> Result<Vec<String>, LockerError> {
        Ok(request
            .candidates
            .iter()
            .take(request.limit)
            .map(|target| target.id.clone())
            .collect())
    }

    async fn unlock(&self, _job: JobId, _targets: &[Target]) -> Result<(), LockerError> {
        Ok(())
    }
}
