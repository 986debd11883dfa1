use super::ui;
use crate::core::known::{KnownEtfs, POPULAR_ETFS};
use comfy_table::{Cell, Table};

pub fn run(table: &KnownEtfs) {
    ui::print_title("Popular ETFs");
    println!("{}", popular_table(table));
    println!(
        "{}",
        ui::style_text(
            "Use `etfscope show <SYMBOL>` for details or `etfscope compare <A> <B>` to compare.",
            ui::StyleType::Subtle
        )
    );
}

fn popular_table(known: &KnownEtfs) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Issuer"),
        ui::header_cell("Category"),
    ]);

    for symbol in POPULAR_ETFS {
        let entry = known.get(symbol);
        table.add_row(vec![
            ui::label_cell(symbol),
            ui::format_optional_cell(entry.map(|e| e.name.clone()), |v| v),
            ui::format_optional_cell(entry.map(|e| e.issuer.clone()), |v| v),
            entry.map_or_else(ui::na_cell, |e| Cell::new(&e.category)),
        ]);
    }
    table
}
