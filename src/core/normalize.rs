//! Maps provider-specific raw responses onto [`EtfRecord`].
//!
//! Each provider's raw JSON is deserialized into private structs and then
//! mapped field by field. Every canonical field the provider lacks stays
//! absent. A response that doesn't fit its provider's shape yields `None` so
//! the caller can move on to the next provider.

use crate::core::known::KnownEtf;
use crate::core::magnitude::{Magnitude, parse_magnitude_str};
use crate::core::performance::derive_performance;
use crate::core::record::{DataSource, EtfRecord, Holding, finite, round_to};
use crate::core::source::ProviderKind;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct AlphaVantageResponse {
    overview: AlphaVantageOverview,
    #[serde(default)]
    profile: Option<AlphaVantageProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlphaVantageOverview {
    symbol: String,
    name: Option<String>,
    asset_type: Option<String>,
    sector: Option<String>,
    description: Option<String>,
    expense_ratio: Option<String>,
    market_capitalization: Option<String>,
    last_refreshed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlphaVantageProfile {
    net_assets: Option<String>,
    net_expense_ratio: Option<String>,
    #[serde(default)]
    sectors: Vec<AlphaVantageSector>,
    #[serde(default)]
    holdings: Vec<AlphaVantageHolding>,
}

#[derive(Debug, Deserialize)]
struct AlphaVantageSector {
    sector: String,
    weight: String,
}

#[derive(Debug, Deserialize)]
struct AlphaVantageHolding {
    symbol: Option<String>,
    description: Option<String>,
    weight: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolygonResponse {
    results: PolygonTicker,
}

#[derive(Debug, Deserialize)]
struct PolygonTicker {
    name: Option<String>,
    primary_exchange: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
    market_cap: Option<f64>,
    last_updated_utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartItem>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartItem {
    meta: YahooChartMeta,
    indicators: Option<YahooIndicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    symbol: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_time: Option<i64>,
    long_name: Option<String>,
    short_name: Option<String>,
    instrument_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
}

/// Normalizes one provider response for `symbol`.
///
/// Parse failures are logged and reported as "no data from this provider".
pub fn normalize(provider: ProviderKind, symbol: &str, raw: &serde_json::Value) -> Option<EtfRecord> {
    let result = match provider {
        ProviderKind::AlphaVantage => from_alpha_vantage(symbol, raw),
        ProviderKind::Polygon => from_polygon(symbol, raw),
        ProviderKind::Yahoo => from_yahoo(symbol, raw),
        ProviderKind::KnownEtfs => from_known_etf(symbol, raw),
    };

    match result {
        Ok(record) => {
            debug!(provider = %provider, symbol = %record.symbol, "Normalized provider response");
            Some(record)
        }
        Err(e) => {
            warn!(provider = %provider, symbol, error = %format!("{e:#}"), "Discarding provider response");
            None
        }
    }
}

fn from_alpha_vantage(symbol: &str, raw: &serde_json::Value) -> Result<EtfRecord> {
    let response =
        AlphaVantageResponse::deserialize(raw).context("Unexpected Alpha Vantage response")?;
    let overview = response.overview;

    let mut record = EtfRecord::new(symbol, DataSource::AlphaVantage)?;
    if !overview.symbol.trim().eq_ignore_ascii_case(&record.symbol) {
        bail!(
            "Alpha Vantage returned {} for requested symbol {}",
            overview.symbol,
            record.symbol
        );
    }

    record.name = text(overview.name);
    record.issuer = text(overview.asset_type);
    record.category = text(overview.sector);
    record.description = text(overview.description).unwrap_or_default();
    record.expense_ratio = overview.expense_ratio.as_deref().and_then(parse_expense_ratio);
    record.aum = overview.market_capitalization.as_deref().and_then(aum_from_text);
    record.last_updated = overview.last_refreshed.as_deref().and_then(parse_timestamp);

    if let Some(profile) = response.profile {
        if let Some(net_assets) = profile.net_assets.as_deref().and_then(aum_from_text) {
            record.aum = Some(net_assets);
        }
        if record.expense_ratio.is_none() {
            record.expense_ratio = profile
                .net_expense_ratio
                .as_deref()
                .and_then(parse_expense_ratio)
                .map(fraction_to_percent);
        }
        record.sector_allocation = profile
            .sectors
            .into_iter()
            .filter_map(|s| {
                let weight = parse_magnitude_str(&s.weight)?;
                Some((text(Some(s.sector))?, fraction_to_percent(weight)))
            })
            .collect();
        record.holdings = profile
            .holdings
            .into_iter()
            .map(|h| Holding {
                ticker: text(h.symbol).map(|t| t.to_uppercase()),
                company_name: text(h.description),
                sector: None,
                weight: h
                    .weight
                    .as_deref()
                    .and_then(parse_magnitude_str)
                    .map(fraction_to_percent)
                    .unwrap_or(0.0),
                market_value: None,
            })
            .collect();
    }

    Ok(record)
}

fn from_polygon(symbol: &str, raw: &serde_json::Value) -> Result<EtfRecord> {
    let response = PolygonResponse::deserialize(raw).context("Unexpected Polygon response")?;
    let ticker = response.results;

    let mut record = EtfRecord::new(symbol, DataSource::Polygon)?;
    record.name = text(ticker.name);
    record.issuer = text(ticker.primary_exchange);
    record.category = text(ticker.kind);
    record.description = text(ticker.description).unwrap_or_default();
    record.aum = ticker.market_cap.and_then(finite).map(Magnitude::Amount);
    record.last_updated = ticker.last_updated_utc.as_deref().and_then(parse_timestamp);
    Ok(record)
}

fn from_yahoo(symbol: &str, raw: &serde_json::Value) -> Result<EtfRecord> {
    let response = YahooChartResponse::deserialize(raw).context("Unexpected Yahoo chart response")?;
    let item = response
        .chart
        .result
        .and_then(|items| items.into_iter().next())
        .with_context(|| format!("No chart data found for symbol: {symbol}"))?;
    let meta = item.meta;

    let mut record = EtfRecord::new(symbol, DataSource::Yahoo)?;
    if let Some(reported) = &meta.symbol
        && !reported.trim().eq_ignore_ascii_case(&record.symbol)
    {
        bail!("Yahoo returned {reported} for requested symbol {}", record.symbol);
    }

    record.name = text(meta.long_name).or_else(|| text(meta.short_name));
    record.category = text(meta.instrument_type);
    record.current_price = meta.regular_market_price.and_then(finite);
    record.volume = meta.regular_market_volume.and_then(finite);
    record.last_updated = meta
        .regular_market_time
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    if let (Some(price), Some(prev_close)) = (record.current_price, meta.chart_previous_close)
        && prev_close.is_finite()
        && prev_close != 0.0
    {
        let change = price - prev_close;
        record.day_change = finite(change);
        record.day_change_percent = finite(change / prev_close * 100.0);
    }

    let quote = item
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();
    let present = |series: Vec<Option<f64>>| series.into_iter().flatten().collect::<Vec<f64>>();
    record.performance = derive_performance(
        &present(quote.close),
        &present(quote.high),
        &present(quote.low),
    );

    Ok(record)
}

fn from_known_etf(symbol: &str, raw: &serde_json::Value) -> Result<EtfRecord> {
    let known = KnownEtf::deserialize(raw).context("Unexpected known ETF entry")?;

    let mut record = EtfRecord::new(symbol, DataSource::Limited)?;
    record.description = format!(
        "Real-time data for {} is not available. Please configure API keys for live data access.",
        known.name
    );
    record.name = Some(known.name);
    record.issuer = Some(known.issuer);
    record.category = Some(known.category);
    Ok(record)
}

/// Parses an expense ratio such as `"0.03"` or `"0.03%"`.
///
/// Empty, `"None"`, `"N/A"` and malformed values are `None`.
pub fn parse_expense_ratio(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix('%').unwrap_or(value).trim_end();
    if value.is_empty() || value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("n/a")
    {
        return None;
    }
    value.parse::<f64>().ok().and_then(finite)
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Plain numeric totals become amounts; already scaled text is kept for
/// display. Anything unparseable is dropped.
fn aum_from_text(value: &str) -> Option<Magnitude> {
    let value = value.trim();
    if let Ok(amount) = value.parse::<f64>() {
        return finite(amount).map(Magnitude::Amount);
    }
    parse_magnitude_str(value).map(|_| Magnitude::Text(value.to_string()))
}

fn fraction_to_percent(value: f64) -> f64 {
    round_to(value * 100.0, 4)
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None" && !v.eq_ignore_ascii_case("N/A") && v != "-")
}
