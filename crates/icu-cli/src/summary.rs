use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use icu_cli::pipeline::PipelineResult;

pub fn print_summary(result: &PipelineResult) {
    match &result.outputs {
        Some(paths) => {
            println!("Parquet: {}", paths.parquet.display());
            println!("CSV: {}", paths.csv.display());
        }
        None => println!("Dry run: no files written"),
    }
    println!(
        "Stays: {}  Rows: {}  Columns: {}",
        result.stays,
        result.rows,
        result.columns.len()
    );
    println!(
        "Observations: {} read, {} indexed, {} unmapped, {} unusable",
        result.index.rows, result.index.indexed, result.index.unmapped, result.index.unusable
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Signal"),
        header_cell("Item"),
        header_cell("Stays"),
        header_cell("Coverage"),
        header_cell("Observations"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for entry in &result.coverage {
        table.add_row(vec![
            Cell::new(&entry.signal.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(entry.signal.code),
            count_cell(entry.stays_with_values, Color::Green),
            Cell::new(percent(entry.stays_with_values, result.stays)),
            Cell::new(entry.observations),
        ]);
    }
    println!("{table}");

    print_label_table(result);
    print_issue_table(result);
}

fn print_label_table(result: &PipelineResult) {
    if result.labels.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label"),
        header_cell("Matched"),
        header_cell("Missing"),
        header_cell("Dropped"),
    ]);
    apply_table_style(&mut table);
    for column in 1..4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for stats in &result.labels {
        table.add_row(vec![
            Cell::new(&stats.label),
            Cell::new(stats.matched),
            count_cell(stats.missing, Color::Yellow),
            count_cell(stats.dropped, Color::Red),
        ]);
    }
    println!();
    println!("Labels:");
    println!("{table}");
}

fn print_issue_table(result: &PipelineResult) {
    if result.coercions.is_empty() && result.quality.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Issue"),
        header_cell("Count"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (source, column, entry) in result.coercions.iter() {
        table.add_row(vec![
            Cell::new(format!("{source}.{column}")),
            Cell::new("not coercible, treated as missing"),
            count_cell(entry.count, Color::Yellow),
        ]);
    }
    if !result.coercions.is_empty() {
        table.add_row(vec![
            dim_cell("all columns"),
            Cell::new("values treated as missing").add_attribute(Attribute::Bold),
            count_cell(result.coercions.total(), Color::Yellow),
        ]);
    }
    for (kind, count) in result.quality.counts() {
        table.add_row(vec![
            dim_cell("data quality"),
            Cell::new(kind),
            count_cell(count, Color::Yellow),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_empty_runs() {
        assert_eq!(percent(0, 0), "-");
        assert_eq!(percent(1, 3), "33.3%");
        assert_eq!(percent(2, 2), "100.0%");
    }
}
