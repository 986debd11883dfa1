use crate::core::source::{EtfDataSource, ProviderKind};
use crate::providers::util::{get_json, http_client};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Keyless quote and one year of daily history from the Yahoo chart API.
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }
}

fn has_chart_result(data: &Value) -> bool {
    data.pointer("/chart/result")
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

#[async_trait]
impl EtfDataSource for YahooFinanceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yahoo
    }

    #[instrument(name = "YahooChartFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1y",
            self.base_url, symbol
        );
        let Some(data) = get_json(&self.client, &url, symbol).await? else {
            return Ok(None);
        };

        if !has_chart_result(&data) {
            debug!("No chart data found for symbol: {}", symbol);
            return Ok(None);
        }
        Ok(Some(data))
    }
}
