//! Side-by-side comparison of two canonical ETF records.
//!
//! Every function here is pure: the same two records always produce the same
//! summary. Missing data never fails a comparison, it only leaves the affected
//! part empty, zero or `None`.
use crate::core::magnitude::Magnitude;
use crate::core::record::{EtfRecord, Holding, PerformanceMetric, round_to};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

const HIGH_OVERLAP_PCT: f64 = 70.0;
const LOW_OVERLAP_PCT: f64 = 30.0;
const VOLATILITY_GAP: f64 = 5.0;

/// A security held by both funds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapEntry {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub weight_etf1: f64,
    pub weight_etf2: f64,
    pub weight_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorDifference {
    pub etf1_weight: f64,
    pub etf2_weight: f64,
    pub difference: f64,
    pub relative_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub sector_comparison: BTreeMap<String, SectorDifference>,
    pub similarity_score: f64,
    pub total_sectors: usize,
    pub common_sectors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRatioComparison {
    pub etf1_expense_ratio: Option<f64>,
    pub etf2_expense_ratio: Option<f64>,
    pub difference: Option<f64>,
    pub cheaper_etf: Option<String>,
    pub savings_basis_points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AumComparison {
    pub etf1_aum: Option<Magnitude>,
    pub etf2_aum: Option<Magnitude>,
    pub etf1_aum_numeric: Option<f64>,
    pub etf2_aum_numeric: Option<f64>,
    pub larger_etf: Option<String>,
    pub size_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub etf1_symbol: String,
    pub etf2_symbol: String,
    pub portfolio_overlap: f64,
    pub sector_comparison: Option<SectorComparison>,
    pub expense_ratio_comparison: ExpenseRatioComparison,
    pub aum_comparison: AumComparison,
    pub overlapping_holdings: Vec<OverlapEntry>,
}

/// Upper-cased tickers in first-occurrence order, each paired with the first
/// holding that carries it.
fn index_by_ticker(holdings: &[Holding]) -> Vec<(String, &Holding)> {
    let mut seen = HashSet::new();
    holdings
        .iter()
        .filter_map(|h| h.normalized_ticker().map(|t| (t, h)))
        .filter(|(t, _)| seen.insert(t.clone()))
        .collect()
}

/// Holdings present (case-insensitively) in both funds, largest weight
/// divergence first.
///
/// Duplicate tickers within one fund resolve to their first occurrence. Ties
/// on the weight difference keep the first fund's holding order.
pub fn find_overlapping_holdings(holdings1: &[Holding], holdings2: &[Holding]) -> Vec<OverlapEntry> {
    let index1 = index_by_ticker(holdings1);
    let index2: HashMap<String, &Holding> = index_by_ticker(holdings2).into_iter().collect();
    if index1.is_empty() || index2.is_empty() {
        return Vec::new();
    }

    let mut overlaps: Vec<OverlapEntry> = index1
        .into_iter()
        .filter_map(|(ticker, h1)| {
            let h2 = index2.get(&ticker)?;
            Some(OverlapEntry {
                company_name: h1.company_name.clone().or_else(|| h2.company_name.clone()),
                sector: h1.sector.clone().or_else(|| h2.sector.clone()),
                weight_etf1: h1.weight,
                weight_etf2: h2.weight,
                weight_difference: (h1.weight - h2.weight).abs(),
                ticker,
            })
        })
        .collect();

    overlaps.sort_by(|a, b| b.weight_difference.total_cmp(&a.weight_difference));
    overlaps
}

/// Jaccard overlap of the two ticker sets as a percentage (2 decimals).
///
/// Zero when either fund has no ticker-bearing holdings.
pub fn calculate_portfolio_overlap(holdings1: &[Holding], holdings2: &[Holding]) -> f64 {
    let tickers1: HashSet<String> = holdings1.iter().filter_map(Holding::normalized_ticker).collect();
    let tickers2: HashSet<String> = holdings2.iter().filter_map(Holding::normalized_ticker).collect();
    if tickers1.is_empty() || tickers2.is_empty() {
        return 0.0;
    }

    let common = tickers1.intersection(&tickers2).count();
    let total = tickers1.union(&tickers2).count();
    round_to(common as f64 / total as f64 * 100.0, 2)
}

/// Per-sector weight differences and an overall similarity score.
///
/// Sectors missing on one side count as 0%. The score is
/// `max(0, 100 - mean absolute difference)`. `None` when both maps are empty.
pub fn compare_sector_allocations(
    sectors1: &BTreeMap<String, f64>,
    sectors2: &BTreeMap<String, f64>,
) -> Option<SectorComparison> {
    if sectors1.is_empty() && sectors2.is_empty() {
        return None;
    }

    let mut sector_comparison = BTreeMap::new();
    let mut total_difference = 0.0;

    for sector in sectors1.keys().chain(sectors2.keys()) {
        if sector_comparison.contains_key(sector) {
            continue;
        }
        let w1 = sectors1.get(sector).copied().unwrap_or(0.0);
        let w2 = sectors2.get(sector).copied().unwrap_or(0.0);
        let difference = (w1 - w2).abs();
        total_difference += difference;

        let relative_difference = if w1.max(w2) > 0.0 {
            difference / w1.max(w2).max(1.0) * 100.0
        } else {
            0.0
        };

        sector_comparison.insert(
            sector.clone(),
            SectorDifference {
                etf1_weight: w1,
                etf2_weight: w2,
                difference,
                relative_difference,
            },
        );
    }

    let total_sectors = sector_comparison.len();
    let common_sectors = sectors1.keys().filter(|s| sectors2.contains_key(*s)).count();
    let average_difference = total_difference / total_sectors as f64;

    Some(SectorComparison {
        sector_comparison,
        similarity_score: round_to((100.0 - average_difference).max(0.0), 2),
        total_sectors,
        common_sectors,
    })
}

/// Expense ratio gap. Nothing is guessed when either ratio is unknown.
pub fn compare_expense_ratios(etf1: &EtfRecord, etf2: &EtfRecord) -> ExpenseRatioComparison {
    let mut comparison = ExpenseRatioComparison {
        etf1_expense_ratio: etf1.expense_ratio,
        etf2_expense_ratio: etf2.expense_ratio,
        difference: None,
        cheaper_etf: None,
        savings_basis_points: None,
    };

    if let (Some(e1), Some(e2)) = (etf1.expense_ratio, etf2.expense_ratio) {
        let difference = (e1 - e2).abs();
        let cheaper = if e2 < e1 { etf2 } else { etf1 };
        comparison.difference = Some(round_to(difference, 4));
        comparison.cheaper_etf = Some(cheaper.symbol.clone());
        comparison.savings_basis_points = Some(round_to(difference * 100.0, 2));
    }

    comparison
}

/// Fund size comparison on the parsed AUM figures.
pub fn compare_aum(etf1: &EtfRecord, etf2: &EtfRecord) -> AumComparison {
    let aum1 = etf1.aum_value();
    let aum2 = etf2.aum_value();
    let mut comparison = AumComparison {
        etf1_aum: etf1.aum.clone(),
        etf2_aum: etf2.aum.clone(),
        etf1_aum_numeric: aum1,
        etf2_aum_numeric: aum2,
        larger_etf: None,
        size_ratio: None,
    };

    if let (Some(a1), Some(a2)) = (aum1, aum2) {
        let larger = if a2 > a1 { etf2 } else { etf1 };
        comparison.larger_etf = Some(larger.symbol.clone());
        let (max, min) = (a1.max(a2), a1.min(a2));
        if min != 0.0 {
            comparison.size_ratio = Some(round_to(max / min, 2));
        }
    }

    comparison
}

/// Full comparison of two records.
pub fn generate_comparison_summary(etf1: &EtfRecord, etf2: &EtfRecord) -> ComparisonSummary {
    ComparisonSummary {
        etf1_symbol: etf1.symbol.clone(),
        etf2_symbol: etf2.symbol.clone(),
        portfolio_overlap: calculate_portfolio_overlap(&etf1.holdings, &etf2.holdings),
        sector_comparison: compare_sector_allocations(
            &etf1.sector_allocation,
            &etf2.sector_allocation,
        ),
        expense_ratio_comparison: compare_expense_ratios(etf1, etf2),
        aum_comparison: compare_aum(etf1, etf2),
        overlapping_holdings: find_overlapping_holdings(&etf1.holdings, &etf2.holdings),
    }
}

pub use self::generate_comparison_summary as compare;

/// Plain-language notes a reader should consider when choosing between the two.
pub fn investment_considerations(
    summary: &ComparisonSummary,
    etf1: &EtfRecord,
    etf2: &EtfRecord,
) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(cheaper) = &summary.expense_ratio_comparison.cheaper_etf {
        notes.push(format!(
            "{cheaper} has a lower expense ratio, potentially saving on long-term costs"
        ));
    }
    if let Some(larger) = &summary.aum_comparison.larger_etf {
        notes.push(format!(
            "{larger} has larger assets under management, typically indicating higher liquidity"
        ));
    }

    if summary.portfolio_overlap > HIGH_OVERLAP_PCT {
        notes.push(
            "High portfolio overlap suggests similar investment exposure - consider diversification benefits"
                .to_string(),
        );
    } else if summary.portfolio_overlap < LOW_OVERLAP_PCT {
        notes.push(
            "Low portfolio overlap suggests good diversification potential when combined"
                .to_string(),
        );
    }

    if let (Some(vol1), Some(vol2)) = (
        etf1.performance_metric(PerformanceMetric::Volatility),
        etf2.performance_metric(PerformanceMetric::Volatility),
    ) && (vol1 - vol2).abs() > VOLATILITY_GAP
    {
        let lower = if vol1 < vol2 { &etf1.symbol } else { &etf2.symbol };
        notes.push(format!(
            "{lower} shows lower volatility, potentially suitable for risk-averse investors"
        ));
    }

    notes
}
