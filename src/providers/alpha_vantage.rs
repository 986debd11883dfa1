use crate::core::source::{EtfDataSource, ProviderKind};
use crate::providers::util::{get_json, http_client};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

/// Keys Alpha Vantage uses in place of data for throttling and bad keys.
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client()?,
        })
    }

    fn query_url(&self, function: &str, symbol: &str) -> String {
        format!(
            "{}/query?function={}&symbol={}&apikey={}",
            self.base_url, function, symbol, self.api_key
        )
    }

    async fn fetch_profile(&self, symbol: &str) -> Option<Value> {
        let url = self.query_url("ETF_PROFILE", symbol);
        match get_json(&self.client, &url, symbol).await {
            Ok(Some(profile))
                if ["net_assets", "sectors", "holdings"]
                    .iter()
                    .any(|key| profile.get(key).is_some()) =>
            {
                Some(profile)
            }
            Ok(_) => {
                debug!(symbol, "No ETF profile from Alpha Vantage");
                None
            }
            Err(e) => {
                warn!(symbol, error = %e, "Alpha Vantage ETF profile request failed");
                None
            }
        }
    }
}

#[async_trait]
impl EtfDataSource for AlphaVantageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AlphaVantage
    }

    #[instrument(name = "AlphaVantageFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &str) -> Result<Option<Value>> {
        let url = self.query_url("OVERVIEW", symbol);
        let Some(overview) = get_json(&self.client, &url, symbol).await? else {
            return Ok(None);
        };

        if overview.get("Symbol").is_none() {
            if let Some(notice) = NOTICE_KEYS.iter().find_map(|k| overview.get(k)) {
                return Err(anyhow!("Alpha Vantage refused request: {}", notice));
            }
            debug!("Alpha Vantage has no overview for {}", symbol);
            return Ok(None);
        }

        let profile = self.fetch_profile(symbol).await;
        Ok(Some(json!({ "overview": overview, "profile": profile })))
    }
}
