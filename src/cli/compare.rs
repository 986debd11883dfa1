use super::ui;
use crate::core::comparison::{
    ComparisonSummary, SectorComparison, compare, investment_considerations,
};
use crate::core::record::{EtfRecord, PerformanceMetric, normalize_symbol};
use crate::core::source::EtfSearch;
use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment, Table};
use futures::future::join_all;
use serde::Serialize;

/// Overlapping holdings beyond this many are not listed.
const MAX_OVERLAP_SHOWN: usize = 10;

#[derive(Serialize)]
struct ComparisonReport<'a> {
    etf1: &'a EtfRecord,
    etf2: &'a EtfRecord,
    comparison: &'a ComparisonSummary,
    considerations: &'a [String],
}

/// Fetches both ETFs concurrently. Fails if either can't be found.
async fn fetch_pair(search: &EtfSearch, first: &str, second: &str) -> Result<(EtfRecord, EtfRecord)> {
    let symbols = [first, second];
    let pb = ui::new_progress_bar(symbols.len() as u64);
    pb.set_message("Fetching ETF data");

    let futures = symbols.iter().map(|symbol| {
        let pb_clone = pb.clone();
        async move {
            let record = search.search(symbol).await;
            pb_clone.inc(1);
            record
        }
    });
    let mut results = join_all(futures).await.into_iter();
    pb.finish_and_clear();

    match (results.next().flatten(), results.next().flatten()) {
        (Some(etf1), Some(etf2)) => Ok((etf1, etf2)),
        (etf1, etf2) => {
            let missing: Vec<String> = symbols
                .iter()
                .zip([etf1.is_none(), etf2.is_none()])
                .filter(|(_, missing)| *missing)
                .map(|(symbol, _)| normalize_symbol(symbol).unwrap_or_else(|| symbol.to_string()))
                .collect();
            bail!("No data found for ETF: {}", missing.join(", "))
        }
    }
}

pub async fn run(search: &EtfSearch, first: &str, second: &str, json: bool) -> Result<()> {
    let (etf1, etf2) = fetch_pair(search, first, second).await?;
    let summary = compare(&etf1, &etf2);
    let considerations = investment_considerations(&summary, &etf1, &etf2);

    if json {
        let report = ComparisonReport {
            etf1: &etf1,
            etf2: &etf2,
            comparison: &summary,
            considerations: &considerations,
        };
        let out =
            serde_json::to_string_pretty(&report).context("Failed to serialize comparison")?;
        println!("{out}");
        return Ok(());
    }

    ui::print_title(&format!("{} vs {}", etf1.symbol, etf2.symbol));
    println!("{}", side_by_side_table(&etf1, &etf2));

    ui::print_title("Comparison Summary");
    println!("{}", summary_table(&summary));

    if !summary.overlapping_holdings.is_empty() {
        ui::print_title("Overlapping Holdings");
        println!("{}", overlap_table(&summary));
    }

    if let Some(sectors) = &summary.sector_comparison {
        ui::print_title("Sector Comparison");
        println!("{}", sector_table(&summary, sectors));
    }

    if !considerations.is_empty() {
        ui::print_separator();
        println!(
            "{}",
            ui::style_text("Investment Considerations", ui::StyleType::TotalLabel)
        );
        for note in &considerations {
            println!("  • {note}");
        }
    }

    Ok(())
}

fn side_by_side_table(etf1: &EtfRecord, etf2: &EtfRecord) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metric"),
        ui::header_cell(&etf1.symbol),
        ui::header_cell(&etf2.symbol),
    ]);

    let text = |value: &Option<String>| ui::format_optional_cell(value.clone(), |v| v);
    let percent = |value: Option<f64>| ui::format_optional_cell(value, |v| format!("{v:.2}%"));

    table.add_row(vec![ui::label_cell("Name"), text(&etf1.name), text(&etf2.name)]);
    table.add_row(vec![ui::label_cell("Issuer"), text(&etf1.issuer), text(&etf2.issuer)]);
    table.add_row(vec![
        ui::label_cell("Category"),
        text(&etf1.category),
        text(&etf2.category),
    ]);
    table.add_row(vec![
        ui::label_cell("Expense Ratio"),
        ui::format_optional_cell(etf1.expense_ratio, ui::format_expense_ratio),
        ui::format_optional_cell(etf2.expense_ratio, ui::format_expense_ratio),
    ]);
    table.add_row(vec![
        ui::label_cell("AUM"),
        ui::format_optional_cell(etf1.aum.as_ref(), |v| v.display()),
        ui::format_optional_cell(etf2.aum.as_ref(), |v| v.display()),
    ]);
    table.add_row(vec![
        ui::label_cell("Price"),
        ui::format_optional_cell(etf1.current_price, |v| format!("${v:.2}")),
        ui::format_optional_cell(etf2.current_price, |v| format!("${v:.2}")),
    ]);
    table.add_row(vec![
        ui::label_cell("1Y Return"),
        etf1.performance_metric(PerformanceMetric::OneYearReturn)
            .map_or_else(ui::na_cell, ui::change_cell),
        etf2.performance_metric(PerformanceMetric::OneYearReturn)
            .map_or_else(ui::na_cell, ui::change_cell),
    ]);
    table.add_row(vec![
        ui::label_cell("Volatility"),
        percent(etf1.performance_metric(PerformanceMetric::Volatility)),
        percent(etf2.performance_metric(PerformanceMetric::Volatility)),
    ]);
    table.add_row(vec![
        ui::label_cell("Holdings"),
        Cell::new(etf1.holdings.len()).set_alignment(CellAlignment::Right),
        Cell::new(etf2.holdings.len()).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        ui::label_cell("Data Source"),
        Cell::new(etf1.data_source),
        Cell::new(etf2.data_source),
    ]);
    table
}

fn summary_table(summary: &ComparisonSummary) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Measure"), ui::header_cell("Value")]);

    let expense = &summary.expense_ratio_comparison;
    let aum = &summary.aum_comparison;

    table.add_row(vec![
        ui::label_cell("Portfolio Overlap"),
        ui::format_percentage_cell(summary.portfolio_overlap, |v| format!("{v:.2}%")),
    ]);
    table.add_row(vec![
        ui::label_cell("Sector Similarity"),
        ui::format_optional_cell(
            summary.sector_comparison.as_ref().map(|s| s.similarity_score),
            |v| format!("{v:.2}/100"),
        ),
    ]);
    table.add_row(vec![
        ui::label_cell("Lower Expense Ratio"),
        ui::format_optional_cell(expense.cheaper_etf.clone(), |v| v),
    ]);
    table.add_row(vec![
        ui::label_cell("Expense Difference"),
        ui::format_optional_cell(
            expense.difference.zip(expense.savings_basis_points),
            |(diff, bps)| format!("{diff:.4}% ({bps:.2} bps)"),
        ),
    ]);
    table.add_row(vec![
        ui::label_cell("Larger Fund"),
        ui::format_optional_cell(aum.larger_etf.clone(), |v| v),
    ]);
    table.add_row(vec![
        ui::label_cell("Size Ratio"),
        ui::format_optional_cell(aum.size_ratio, |v| format!("{v:.2}x")),
    ]);
    table
}

fn overlap_table(summary: &ComparisonSummary) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Company"),
        ui::header_cell(&format!("{} Weight", summary.etf1_symbol)),
        ui::header_cell(&format!("{} Weight", summary.etf2_symbol)),
        ui::header_cell("Difference"),
    ]);

    for entry in summary.overlapping_holdings.iter().take(MAX_OVERLAP_SHOWN) {
        table.add_row(vec![
            Cell::new(&entry.ticker),
            Cell::new(entry.company_name.as_deref().unwrap_or("")),
            Cell::new(format!("{:.2}%", entry.weight_etf1)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", entry.weight_etf2)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", entry.weight_difference))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn sector_table(summary: &ComparisonSummary, sectors: &SectorComparison) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Sector"),
        ui::header_cell(&summary.etf1_symbol),
        ui::header_cell(&summary.etf2_symbol),
        ui::header_cell("Difference"),
    ]);

    let mut rows: Vec<_> = sectors.sector_comparison.iter().collect();
    rows.sort_by(|a, b| b.1.difference.total_cmp(&a.1.difference));
    for (sector, diff) in rows {
        table.add_row(vec![
            Cell::new(sector),
            Cell::new(format!("{:.2}%", diff.etf1_weight)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", diff.etf2_weight)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", diff.difference)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
