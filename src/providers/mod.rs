pub mod alpha_vantage;
pub mod known;
pub mod polygon;
pub mod util;
pub mod yahoo_finance;

use crate::core::config::AppConfig;
use crate::core::known::KnownEtfs;
use crate::core::source::{EtfDataSource, EtfSearch};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

pub use alpha_vantage::AlphaVantageProvider;
pub use known::KnownEtfProvider;
pub use polygon::PolygonProvider;
pub use yahoo_finance::YahooFinanceProvider;

/// Builds the provider chain in priority order: Alpha Vantage, Polygon and
/// Yahoo Finance when configured, then the known-ETF table.
pub fn build_search(config: &AppConfig) -> Result<EtfSearch> {
    let mut sources: Vec<Box<dyn EtfDataSource>> = Vec::new();
    let providers = &config.providers;

    match (&providers.alpha_vantage, providers.alpha_vantage_key()) {
        (Some(av), Some(key)) => {
            sources.push(Box::new(AlphaVantageProvider::new(&av.base_url, &key)?));
        }
        _ => debug!("Alpha Vantage disabled: no API key"),
    }

    match (&providers.polygon, providers.polygon_key()) {
        (Some(polygon), Some(key)) => {
            sources.push(Box::new(PolygonProvider::new(&polygon.base_url, &key)?));
        }
        _ => debug!("Polygon disabled: no API key"),
    }

    if let Some(yahoo) = &providers.yahoo {
        sources.push(Box::new(YahooFinanceProvider::new(&yahoo.base_url)?));
    }

    let table = Arc::new(KnownEtfs::with_extra(&config.known_etfs));
    sources.push(Box::new(KnownEtfProvider::new(table)));

    Ok(EtfSearch::new(sources, config.timeout()).with_enrichment(config.enrich))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AlphaVantageProviderConfig, PolygonProviderConfig, ProvidersConfig};
    use crate::core::source::ProviderKind;

    #[test]
    fn test_keyed_providers_need_keys() {
        let config = AppConfig {
            providers: ProvidersConfig {
                alpha_vantage: Some(AlphaVantageProviderConfig {
                    base_url: "http://localhost".to_string(),
                    api_key: Some("av".to_string()),
                }),
                polygon: None,
                yahoo: None,
            },
            ..AppConfig::default()
        };
        let search = build_search(&config).unwrap();
        assert_eq!(
            search.source_kinds(),
            vec![ProviderKind::AlphaVantage, ProviderKind::KnownEtfs]
        );
    }

    #[test]
    fn test_full_chain_order() {
        let config = AppConfig {
            providers: ProvidersConfig {
                alpha_vantage: Some(AlphaVantageProviderConfig {
                    base_url: "http://localhost".to_string(),
                    api_key: Some("av".to_string()),
                }),
                polygon: Some(PolygonProviderConfig {
                    base_url: "http://localhost".to_string(),
                    api_key: Some("pg".to_string()),
                }),
                ..ProvidersConfig::default()
            },
            ..AppConfig::default()
        };
        let search = build_search(&config).unwrap();
        assert_eq!(
            search.source_kinds(),
            vec![
                ProviderKind::AlphaVantage,
                ProviderKind::Polygon,
                ProviderKind::Yahoo,
                ProviderKind::KnownEtfs
            ]
        );
    }
}
