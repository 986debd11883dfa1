//! Data source abstraction and the prioritized provider fallback chain.

use crate::core::normalize::normalize;
use crate::core::record::{DataSource, EtfRecord, normalize_symbol};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifies which raw schema a provider returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    AlphaVantage,
    Polygon,
    Yahoo,
    KnownEtfs,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderKind::AlphaVantage => "alpha_vantage",
                ProviderKind::Polygon => "polygon",
                ProviderKind::Yahoo => "yahoo",
                ProviderKind::KnownEtfs => "known_etfs",
            }
        )
    }
}

impl ProviderKind {
    /// Live providers talk to the network; the known table only labels a
    /// partial record.
    pub fn is_live(&self) -> bool {
        !matches!(self, ProviderKind::KnownEtfs)
    }
}

/// Fetches a provider-specific raw response for a symbol.
///
/// `Ok(None)` means the provider has nothing for this symbol.
#[async_trait]
pub trait EtfDataSource: Send + Sync {
    fn kind(&self) -> ProviderKind;
    async fn fetch(&self, symbol: &str) -> Result<Option<serde_json::Value>>;
}

/// Tries each source in priority order until one yields a usable record.
pub struct EtfSearch {
    sources: Vec<Box<dyn EtfDataSource>>,
    timeout: Duration,
    enrich: bool,
}

impl EtfSearch {
    pub fn new(sources: Vec<Box<dyn EtfDataSource>>, timeout: Duration) -> Self {
        Self {
            sources,
            timeout,
            enrich: false,
        }
    }

    /// Keep consulting later live sources to fill gaps in the first record.
    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    pub fn source_kinds(&self) -> Vec<ProviderKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Fetches and normalizes one source. Any failure is `None`.
    async fn try_source(&self, source: &dyn EtfDataSource, symbol: &str) -> Option<EtfRecord> {
        let kind = source.kind();
        match tokio::time::timeout(self.timeout, source.fetch(symbol)).await {
            Err(_) => {
                warn!(provider = %kind, symbol, "Provider timed out");
                None
            }
            Ok(Err(e)) => {
                warn!(provider = %kind, symbol, error = %e, "Provider request failed");
                None
            }
            Ok(Ok(None)) => {
                debug!(provider = %kind, symbol, "Provider has no data");
                None
            }
            Ok(Ok(Some(raw))) => normalize(kind, symbol, &raw),
        }
    }

    /// Looks up an ETF by symbol. `None` means no source knows it, which is a
    /// normal outcome rather than an error.
    pub async fn search(&self, query: &str) -> Option<EtfRecord> {
        let symbol = normalize_symbol(query)?;

        let mut found: Option<EtfRecord> = None;
        for source in &self.sources {
            let kind = source.kind();
            if let Some(record) = &found
                && (!self.enrich || !kind.is_live() || record.data_source == DataSource::from(kind))
            {
                continue;
            }

            let Some(record) = self.try_source(source.as_ref(), &symbol).await else {
                continue;
            };
            info!(provider = %kind, symbol = %symbol, "Resolved ETF data");

            found = Some(match found {
                Some(primary) => primary.merge(record),
                None => record,
            });
            if !self.enrich {
                break;
            }
        }

        if found.is_none() {
            info!(symbol = %symbol, "ETF not found in any provider");
        }
        found
    }
}

impl From<ProviderKind> for DataSource {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::AlphaVantage => DataSource::AlphaVantage,
            ProviderKind::Polygon => DataSource::Polygon,
            ProviderKind::Yahoo => DataSource::Yahoo,
            ProviderKind::KnownEtfs => DataSource::Limited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        kind: ProviderKind,
        response: Result<Option<serde_json::Value>, String>,
        delay: Duration,
        call_count: AtomicUsize,
    }

    impl MockSource {
        fn new(kind: ProviderKind, response: Result<Option<serde_json::Value>, String>) -> Self {
            Self {
                kind,
                response,
                delay: Duration::ZERO,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EtfDataSource for Arc<MockSource> {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch(&self, _symbol: &str) -> Result<Option<serde_json::Value>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.response.clone().map_err(|e| anyhow!(e))
        }
    }

    fn polygon_raw() -> serde_json::Value {
        json!({"results": {"name": "Vanguard Total Stock Market ETF", "type": "ETF", "market_cap": 1.5e12}})
    }

    fn yahoo_raw() -> serde_json::Value {
        json!({"chart": {"result": [{"meta": {"regularMarketPrice": 250.0, "chartPreviousClose": 245.0}}]}})
    }

    fn search_with(sources: Vec<Arc<MockSource>>) -> EtfSearch {
        EtfSearch::new(
            sources
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn EtfDataSource>)
                .collect(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_falls_through_failures_in_order() {
        let failing = Arc::new(MockSource::new(
            ProviderKind::AlphaVantage,
            Err("HTTP error: 500".to_string()),
        ));
        let malformed = Arc::new(MockSource::new(
            ProviderKind::Polygon,
            Ok(Some(json!({"unexpected": true}))),
        ));
        let yahoo = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(Some(yahoo_raw()))));
        let known = Arc::new(MockSource::new(ProviderKind::KnownEtfs, Ok(None)));

        let search = search_with(vec![
            failing.clone(),
            malformed.clone(),
            yahoo.clone(),
            known.clone(),
        ]);
        let record = search.search(" vti ").await.unwrap();

        assert_eq!(record.symbol, "VTI");
        assert_eq!(record.data_source, DataSource::Yahoo);
        assert_eq!(record.current_price, Some(250.0));
        assert_eq!(failing.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(malformed.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(known.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_treated_as_no_data() {
        let mut slow = MockSource::new(ProviderKind::Polygon, Ok(Some(polygon_raw())));
        slow.delay = Duration::from_secs(5);
        let slow = Arc::new(slow);
        let yahoo = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(Some(yahoo_raw()))));

        let search = search_with(vec![slow, yahoo]);
        let record = search.search("VTI").await.unwrap();
        assert_eq!(record.data_source, DataSource::Yahoo);
    }

    #[tokio::test]
    async fn test_all_sources_fail_is_not_found() {
        let none = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(None)));
        let search = search_with(vec![none]);
        assert!(search.search("ZZZZ").await.is_none());
        assert!(search.search("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_symbol_never_reaches_sources() {
        let yahoo = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(Some(yahoo_raw()))));
        let search = search_with(vec![yahoo.clone()]);
        assert!(search.search("VTI#&apikey=x").await.is_none());
        assert_eq!(yahoo.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enrichment_merges_later_live_sources() {
        let polygon = Arc::new(MockSource::new(ProviderKind::Polygon, Ok(Some(polygon_raw()))));
        let yahoo = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(Some(yahoo_raw()))));
        let known = Arc::new(MockSource::new(
            ProviderKind::KnownEtfs,
            Ok(Some(json!({"symbol": "VTI", "name": "x", "issuer": "y", "category": "z"}))),
        ));

        let search = search_with(vec![polygon, yahoo.clone(), known.clone()]).with_enrichment(true);
        let record = search.search("VTI").await.unwrap();

        assert_eq!(record.data_source, DataSource::Polygon);
        assert_eq!(record.name.as_deref(), Some("Vanguard Total Stock Market ETF"));
        assert_eq!(record.current_price, Some(250.0));
        assert_eq!(yahoo.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(known.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_without_enrichment_stops_at_first_record() {
        let polygon = Arc::new(MockSource::new(ProviderKind::Polygon, Ok(Some(polygon_raw()))));
        let yahoo = Arc::new(MockSource::new(ProviderKind::Yahoo, Ok(Some(yahoo_raw()))));

        let search = search_with(vec![polygon, yahoo.clone()]);
        let record = search.search("VTI").await.unwrap();
        assert!(record.current_price.is_none());
        assert_eq!(yahoo.call_count.load(Ordering::SeqCst), 0);
    }
}
