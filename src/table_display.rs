use crate::config::config::DisplayConfig;
use crate::data::data_grid::DataGrid;
use crate::data::selection::SelectionMode;
use crate::data::value_accessor::resolve;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use serde_json::Value;

/// Build a table of the grid's displayed page.
///
/// Cells go through each column's formatter. Missing and null values show
/// `null_text` unless the column formats them itself.
pub fn render_page(grid: &DataGrid, display: &DisplayConfig) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let show_selection = grid.selection_mode() != SelectionMode::None;

    let mut headers: Vec<Cell> = Vec::new();
    if show_selection {
        headers.push(Cell::new(""));
    }
    if display.show_row_numbers {
        headers.push(Cell::new("#").add_attribute(Attribute::Bold));
    }
    headers.extend(
        grid.columns()
            .iter()
            .map(|c| Cell::new(&c.label).add_attribute(Attribute::Bold)),
    );
    table.set_header(headers);

    let offset = grid.pagination().offset();
    for (i, row) in grid.displayed_rows().iter().enumerate() {
        let mut cells: Vec<String> = Vec::new();
        if show_selection {
            let marker = if grid.selection().is_selected(row) { "[x]" } else { "[ ]" };
            cells.push(marker.to_string());
        }
        if display.show_row_numbers {
            cells.push((offset + i + 1).to_string());
        }
        for column in grid.columns() {
            let is_null = matches!(resolve(row, &column.key), None | Some(Value::Null));
            if is_null && column.formatter.is_none() {
                cells.push(display.null_text.clone());
            } else {
                cells.push(column.format(row));
            }
        }
        table.add_row(cells);
    }

    table
}

/// Print the displayed page followed by its range label
pub fn display_page(grid: &DataGrid, display: &DisplayConfig) {
    if grid.total() == 0 {
        println!("{}", "No rows match.".yellow());
        return;
    }

    println!("{}", render_page(grid, display));
    println!(
        "\n{}",
        format!(
            "{} (page {} of {})",
            grid.range_label(),
            grid.pagination().page + 1,
            grid.page_count()
        )
        .green()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::{ColumnDef, ColumnType};
    use crate::data::row::rows_from_values;
    use serde_json::json;

    fn grid() -> DataGrid {
        let columns = vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("price", "Price")
                .with_type(ColumnType::Number)
                .with_formatter(|v| format!("${}", crate::data::value_accessor::to_text(v))),
            ColumnDef::new("note", "Note"),
        ];
        let rows = rows_from_values(vec![
            json!({"name": "Widget", "price": 9.5, "note": null}),
            json!({"name": "Gadget", "price": 3}),
        ]);
        DataGrid::new(columns, rows).unwrap()
    }

    #[test]
    fn test_render_uses_formatter_and_null_text() {
        let display = DisplayConfig {
            null_text: "-".to_string(),
            show_row_numbers: true,
            ..DisplayConfig::default()
        };
        let rendered = render_page(&grid(), &display).to_string();

        assert!(rendered.contains("Widget"));
        assert!(rendered.contains("$9.5"));
        assert!(rendered.contains("$3"));
        assert!(rendered.contains(" - "));
        assert!(rendered.contains("#"));
    }

    #[test]
    fn test_selection_markers() {
        let mut grid = grid();
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.toggle_row_at(1);

        let rendered = render_page(&grid, &DisplayConfig::default()).to_string();
        assert!(rendered.contains("[x]"));
        assert!(rendered.contains("[ ]"));
    }
}
