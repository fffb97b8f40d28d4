use async_trait::async_trait;
use corral_common::catalog::Catalog;
use corral_common::target::RawRecord;

/// A catalog backed by a fixed list of records.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<RawRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<RawRecord> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn records(&self) -> anyhow::Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}
