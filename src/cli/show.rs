use super::ui;
use crate::core::magnitude::format_volume;
use crate::core::record::{EtfRecord, PerformanceMetric};
use crate::core::source::EtfSearch;
use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment, Color, Table};

/// Holdings beyond this many are summarized in a footer line.
const MAX_HOLDINGS_SHOWN: usize = 15;

pub async fn run(search: &EtfSearch, symbol: &str, json: bool) -> Result<()> {
    let Some(record) = search.search(symbol).await else {
        bail!("No data found for ETF: {}", symbol.trim().to_uppercase());
    };

    if json {
        let out = serde_json::to_string_pretty(&record).context("Failed to serialize ETF record")?;
        println!("{out}");
        return Ok(());
    }

    display_record(&record);
    Ok(())
}

fn display_record(record: &EtfRecord) {
    let title = match &record.name {
        Some(name) => format!("{} ({})", record.symbol, name),
        None => record.symbol.clone(),
    };
    ui::print_title(&title);
    println!("{}", overview_table(record));

    if !record.description.is_empty() {
        println!("\n{}", ui::style_text(&record.description, ui::StyleType::Subtle));
    }

    if !record.performance.is_empty() {
        ui::print_title("Performance");
        println!("{}", performance_table(record));
    }

    if !record.holdings.is_empty() {
        ui::print_title("Top Holdings");
        println!("{}", holdings_table(record));
        if record.holdings.len() > MAX_HOLDINGS_SHOWN {
            println!(
                "{}",
                ui::style_text(
                    &format!("... and {} more", record.holdings.len() - MAX_HOLDINGS_SHOWN),
                    ui::StyleType::Subtle
                )
            );
        }
    }

    if !record.sector_allocation.is_empty() {
        ui::print_title("Sector Allocation");
        println!("{}", sector_table(record));
    }
}

pub(crate) fn overview_table(record: &EtfRecord) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);

    let text_cell = |value: &Option<String>| ui::format_optional_cell(value.clone(), |v| v);

    table.add_row(vec![ui::label_cell("Symbol"), Cell::new(&record.symbol)]);
    table.add_row(vec![ui::label_cell("Issuer"), text_cell(&record.issuer)]);
    table.add_row(vec![ui::label_cell("Category"), text_cell(&record.category)]);
    table.add_row(vec![
        ui::label_cell("Expense Ratio"),
        ui::format_optional_cell(record.expense_ratio, ui::format_expense_ratio),
    ]);
    table.add_row(vec![
        ui::label_cell("AUM"),
        ui::format_optional_cell(record.aum.as_ref(), |v| v.display()),
    ]);
    table.add_row(vec![
        ui::label_cell("Price"),
        ui::format_optional_cell(record.current_price, |v| format!("${v:.2}")),
    ]);
    table.add_row(vec![
        ui::label_cell("Day Change"),
        match (record.day_change, record.day_change_percent) {
            (Some(change), Some(pct)) => day_change_cell(change, pct),
            _ => ui::na_cell(),
        },
    ]);
    table.add_row(vec![
        ui::label_cell("Volume"),
        ui::format_optional_cell(record.volume, format_volume),
    ]);
    table.add_row(vec![
        ui::label_cell("Data Source"),
        Cell::new(record.data_source.to_string()),
    ]);
    table.add_row(vec![
        ui::label_cell("Last Updated"),
        ui::format_optional_cell(record.last_updated, |t| {
            t.format("%Y-%m-%d %H:%M UTC").to_string()
        }),
    ]);
    table
}

fn day_change_cell(change: f64, pct: f64) -> Cell {
    let color = if change >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(format!("{change:+.2} ({pct:+.2}%)"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

pub(crate) fn performance_table(record: &EtfRecord) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    for (metric, value) in &record.performance {
        let cell = match metric {
            PerformanceMetric::FiftyTwoWeekHigh | PerformanceMetric::FiftyTwoWeekLow => {
                Cell::new(format!("${value:.2}")).set_alignment(CellAlignment::Right)
            }
            PerformanceMetric::Volatility => {
                Cell::new(format!("{value:.2}%")).set_alignment(CellAlignment::Right)
            }
            PerformanceMetric::OneYearReturn | PerformanceMetric::CurrentVs52wHigh => {
                ui::change_cell(*value)
            }
        };
        table.add_row(vec![ui::label_cell(&metric.to_string()), cell]);
    }
    table
}

pub(crate) fn holdings_table(record: &EtfRecord) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Company"),
        ui::header_cell("Sector"),
        ui::header_cell("Weight"),
    ]);

    for holding in record.holdings.iter().take(MAX_HOLDINGS_SHOWN) {
        table.add_row(vec![
            ui::format_optional_cell(holding.normalized_ticker(), |t| t)
                .set_alignment(CellAlignment::Left),
            Cell::new(holding.company_name.as_deref().unwrap_or("")),
            Cell::new(holding.sector.as_deref().unwrap_or("")),
            Cell::new(format!("{:.2}%", holding.weight)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub(crate) fn sector_table(record: &EtfRecord) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Sector"), ui::header_cell("Weight")]);

    let mut sectors: Vec<(&String, &f64)> = record.sector_allocation.iter().collect();
    sectors.sort_by(|a, b| b.1.total_cmp(a.1));
    for (sector, weight) in sectors {
        table.add_row(vec![
            Cell::new(sector),
            Cell::new(format!("{weight:.2}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::magnitude::Magnitude;
    use crate::core::record::{DataSource, Holding};

    fn sample_record() -> EtfRecord {
        let mut record = EtfRecord::new("QQQ", DataSource::Yahoo).unwrap();
        record.name = Some("Invesco QQQ Trust".to_string());
        record.expense_ratio = Some(0.2);
        record.aum = Some(Magnitude::Amount(250e9));
        record.current_price = Some(400.5);
        record.volume = Some(1_500_000.0);
        record.holdings = vec![Holding {
            ticker: Some("AAPL".to_string()),
            company_name: Some("Apple Inc.".to_string()),
            weight: 8.5,
            ..Holding::default()
        }];
        record
            .sector_allocation
            .insert("Technology".to_string(), 50.0);
        record
            .sector_allocation
            .insert("Healthcare".to_string(), 10.0);
        record.performance.insert(PerformanceMetric::Volatility, 21.5);
        record
    }

    #[test]
    fn test_overview_table_formats_fields() {
        let rendered = overview_table(&sample_record()).to_string();
        assert!(rendered.contains("QQQ"));
        assert!(rendered.contains("0.20%"));
        assert!(rendered.contains("$250.00B"));
        assert!(rendered.contains("$400.50"));
        assert!(rendered.contains("1.5M"));
        assert!(rendered.contains("Yahoo Finance"));
        assert!(rendered.contains("N/A"));
    }

    #[test]
    fn test_overview_table_keeps_four_decimal_expense_ratio() {
        let mut record = sample_record();
        record.expense_ratio = Some(0.0945);
        let rendered = overview_table(&record).to_string();
        assert!(rendered.contains("0.0945%"));
        assert!(!rendered.contains("0.09%"));
    }

    #[test]
    fn test_detail_tables() {
        let record = sample_record();
        assert!(holdings_table(&record).to_string().contains("Apple Inc."));
        assert!(performance_table(&record).to_string().contains("21.50%"));

        let sectors = sector_table(&record).to_string();
        let tech = sectors.find("Technology").unwrap();
        let health = sectors.find("Healthcare").unwrap();
        assert!(tech < health);
    }
}
