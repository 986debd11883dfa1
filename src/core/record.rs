//! Canonical ETF record shared by every provider and by the comparison engine.

use crate::core::magnitude::Magnitude;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Named performance figures derived from a price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PerformanceMetric {
    #[serde(rename = "1_year_return")]
    OneYearReturn,
    #[serde(rename = "volatility")]
    Volatility,
    #[serde(rename = "52_week_high")]
    FiftyTwoWeekHigh,
    #[serde(rename = "52_week_low")]
    FiftyTwoWeekLow,
    #[serde(rename = "current_vs_52w_high")]
    CurrentVs52wHigh,
}

impl Display for PerformanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PerformanceMetric::OneYearReturn => "1Y Return",
                PerformanceMetric::Volatility => "Volatility",
                PerformanceMetric::FiftyTwoWeekHigh => "52W High",
                PerformanceMetric::FiftyTwoWeekLow => "52W Low",
                PerformanceMetric::CurrentVs52wHigh => "% from 52W High",
            }
        )
    }
}

/// Where a record's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    #[serde(rename = "Alpha Vantage")]
    AlphaVantage,
    Polygon,
    #[serde(rename = "Yahoo Finance")]
    Yahoo,
    Limited,
}

impl Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DataSource::AlphaVantage => "Alpha Vantage",
                DataSource::Polygon => "Polygon",
                DataSource::Yahoo => "Yahoo Finance",
                DataSource::Limited => "Limited",
            }
        )
    }
}

/// A single position within a fund.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: Option<String>,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    #[serde(default)]
    pub weight: f64,
    pub market_value: Option<f64>,
}

impl Holding {
    /// Upper-cased ticker, if the provider reported one.
    pub fn normalized_ticker(&self) -> Option<String> {
        self.ticker
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("N/A"))
            .map(str::to_uppercase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub category: Option<String>,
    pub expense_ratio: Option<f64>,
    pub aum: Option<Magnitude>,
    pub current_price: Option<f64>,
    pub day_change: Option<f64>,
    pub day_change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub description: String,
    pub holdings: Vec<Holding>,
    pub sector_allocation: BTreeMap<String, f64>,
    pub performance: BTreeMap<PerformanceMetric, f64>,
    pub data_source: DataSource,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EtfRecord {
    /// Creates an empty record for `symbol`, trimmed and upper-cased.
    pub fn new(symbol: &str, data_source: DataSource) -> Result<Self> {
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| anyhow!("Invalid ETF symbol: {:?}", symbol.trim()))?;
        Ok(Self {
            symbol,
            name: None,
            issuer: None,
            category: None,
            expense_ratio: None,
            aum: None,
            current_price: None,
            day_change: None,
            day_change_percent: None,
            volume: None,
            description: String::new(),
            holdings: Vec::new(),
            sector_allocation: BTreeMap::new(),
            performance: BTreeMap::new(),
            data_source,
            last_updated: None,
        })
    }

    /// Numeric AUM, if it can be derived.
    pub fn aum_value(&self) -> Option<f64> {
        self.aum.as_ref().and_then(Magnitude::value)
    }

    pub fn performance_metric(&self, metric: PerformanceMetric) -> Option<f64> {
        self.performance.get(&metric).copied()
    }

    /// Fills the gaps in `self` from `other`. Present values always win and
    /// records for different symbols are never combined.
    pub fn merge(mut self, other: EtfRecord) -> EtfRecord {
        if self.symbol != other.symbol {
            return self;
        }

        self.name = self.name.or(other.name);
        self.issuer = self.issuer.or(other.issuer);
        self.category = self.category.or(other.category);
        self.expense_ratio = self.expense_ratio.or(other.expense_ratio);
        self.aum = self.aum.or(other.aum);
        self.current_price = self.current_price.or(other.current_price);
        self.day_change = self.day_change.or(other.day_change);
        self.day_change_percent = self.day_change_percent.or(other.day_change_percent);
        self.volume = self.volume.or(other.volume);
        self.last_updated = self.last_updated.or(other.last_updated);
        if self.description.is_empty() {
            self.description = other.description;
        }
        if self.holdings.is_empty() {
            self.holdings = other.holdings;
        }
        if self.sector_allocation.is_empty() {
            self.sector_allocation = other.sector_allocation;
        }
        if self.performance.is_empty() {
            self.performance = other.performance;
        }
        self
    }
}

/// Trims and upper-cases a symbol. Empty input and anything outside
/// letters, digits, `.` and `-` is rejected, so a symbol is always safe to
/// place in a request URL.
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let symbol = symbol.trim();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    valid.then(|| symbol.to_ascii_uppercase())
}

/// Keeps only finite numbers.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
