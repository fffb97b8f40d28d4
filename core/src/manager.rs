//! # Target Manager
//!
//! Implements the "acquire targets for a job" use case end to end.
//!
//! Orchestrates the acquisition by:
//! 1. reading the raw records from the [`Catalog`].
//! 2. validating and prefix-filtering them ([`filter`](crate::filter)).
//! 3. shuffling them when the request asks for it ([`shuffle`](crate::shuffle)).
//! 4. handing the candidates to the [`AcquisitionCoordinator`].

use std::sync::Arc;

use anyhow::Context;
use corral_common::catalog::Catalog;
use corral_common::config::Config;
use corral_common::job::JobId;
use corral_common::locker::Locker;
use corral_common::request::AcquisitionRequest;
use corral_common::target::Target;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::acquisition::AcquisitionCoordinator;
use crate::filter::filter_targets;
use crate::shuffle::shuffle_targets;

pub struct TargetManager {
    catalog: Box<dyn Catalog>,
    locker: Arc<dyn Locker>,
    coordinator: AcquisitionCoordinator,
    config: Config,
}

impl TargetManager {
    pub fn new(catalog: Box<dyn Catalog>, locker: Arc<dyn Locker>, config: Config) -> Self {
        let coordinator =
            AcquisitionCoordinator::new(locker.clone()).with_grace(config.deadline_grace);

        Self {
            catalog,
            locker,
            coordinator,
            config,
        }
    }

    /// Acquires targets for `job` within `config.acquire_timeout`.
    ///
    /// Catalog and acquisition failures keep their typed errors
    /// ([`CatalogError`](corral_common::error::CatalogError),
    /// [`AcquireError`](corral_common::error::AcquireError)) and can be
    /// recovered with `downcast_ref`.
    pub async fn acquire(
        &self,
        job: JobId,
        request: &AcquisitionRequest,
    ) -> anyhow::Result<Vec<Target>> {
        self.acquire_with_cancel(job, request, &CancellationToken::new())
            .await
    }

    pub async fn acquire_with_cancel(
        &self,
        job: JobId,
        request: &AcquisitionRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<Target>> {
        let records = self
            .catalog
            .records()
            .await
            .context("failed to read the target catalog")?;

        let mut candidates = filter_targets(records, &request.name_prefixes)?;
        info!("Found {} candidate target(s) for job {job}", candidates.len());

        if request.shuffle {
            info!("Shuffling targets");
        }
        shuffle_targets(&mut candidates, request.shuffle);

        let deadline = Instant::now() + self.config.acquire_timeout;
        let locked = self
            .coordinator
            .acquire_with_cancel(job, deadline, candidates, request, cancel)
            .await?;

        Ok(locked)
    }

    /// Releases the locks `job` holds on `targets`. Releasing twice is harmless.
    pub async fn release(&self, job: JobId, targets: &[Target]) -> anyhow::Result<()> {
        self.locker
            .unlock(job, targets)
            .await
            .with_context(|| format!("failed to release {} target(s) for job {job}", targets.len()))?;

        info!("Released {} target(s) for job {job}", targets.len());
        Ok(())
    }
}
