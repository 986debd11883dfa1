use crate::core::source::{EtfDataSource, ProviderKind};
use crate::providers::util::{get_json, http_client};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

pub struct PolygonProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PolygonProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(PolygonProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }
}

#[async_trait]
impl EtfDataSource for PolygonProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Polygon
    }

    #[instrument(name = "PolygonFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/v3/reference/tickers/{}?apiKey={}",
            self.base_url, symbol, self.api_key
        );
        let Some(data) = get_json(&self.client, &url, symbol).await? else {
            return Ok(None);
        };

        if data.get("results").is_none() {
            debug!("Polygon response for {} has no results", symbol);
            return Ok(None);
        }
        Ok(Some(data))
    }
}
