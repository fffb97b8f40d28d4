use async_trait::async_trait;

use crate::target::RawRecord;

/// A source of candidate targets (a database table, a file, a static list).
///
/// Implementations return records in their natural order and leave all
/// validation to the target filter.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn records(&self) -> anyhow::Result<Vec<RawRecord>>;
}
