use crate::core::known::KnownEtfs;
use crate::core::source::{EtfDataSource, ProviderKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Last-resort source answering from the static table.
pub struct KnownEtfProvider {
    table: Arc<KnownEtfs>,
}

impl KnownEtfProvider {
    pub fn new(table: Arc<KnownEtfs>) -> Self {
        KnownEtfProvider { table }
    }
}

#[async_trait]
impl EtfDataSource for KnownEtfProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::KnownEtfs
    }

    async fn fetch(&self, symbol: &str) -> Result<Option<Value>> {
        self.table
            .get(symbol)
            .map(|entry| serde_json::to_value(entry).context("Failed to serialize known ETF"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_and_unknown_symbols() {
        let provider = KnownEtfProvider::new(Arc::new(KnownEtfs::builtin()));
        let raw = provider.fetch("ARKK").await.unwrap().unwrap();
        assert_eq!(raw["issuer"], "ARK Invest");
        assert!(provider.fetch("ZZZZ").await.unwrap().is_none());
    }
}
