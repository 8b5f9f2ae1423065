#[cfg(test)]
mod tests {
    use grid_engine::data::column::{CellValue, ColumnDef, ColumnType};
    use grid_engine::data::data_exporter::{DataExporter, ExportFormat};
    use grid_engine::data::data_grid::DataGrid;
    use grid_engine::data::edit_session::CommitOutcome;
    use grid_engine::data::filter::FilterOperator;
    use grid_engine::data::row::{rows_from_values, Row};
    use grid_engine::data::search::SearchFilter;
    use grid_engine::data::selection::SelectionMode;
    use grid_engine::data::sort::{sort_indices, SortDirection, SortState};
    use grid_engine::state::events::GridEvent;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn people_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "ID").with_type(ColumnType::Number),
            ColumnDef::new("name", "Name"),
            ColumnDef::new("age", "Age")
                .with_type(ColumnType::Number)
                .with_validator(|v: &CellValue| v.as_f64().is_some_and(|n| n >= 0.0)),
            ColumnDef::new("city", "City"),
            ColumnDef::new("joined", "Joined").with_type(ColumnType::Date),
        ]
    }

    fn people() -> Vec<Row> {
        rows_from_values(vec![
            json!({"id": 1, "name": "Bob", "age": 30, "city": "Leeds", "joined": "2021-03-01"}),
            json!({"id": 2, "name": "Ann", "age": 25, "city": "York", "joined": "2020-07-15"}),
            json!({"id": 3, "name": "cara", "age": 41, "city": "New York", "joined": "2019-01-20"}),
            json!({"id": 4, "name": "Dev", "age": 25, "city": "Leeds", "joined": "bogus"}),
            json!({"id": 5, "name": "Eve", "age": null, "city": "Bath"}),
            json!({"id": 6, "name": "Finn", "age": 52, "city": "Yorkshire", "joined": "2022-11-30"}),
            json!({"id": 7, "name": "Gus", "age": 33, "city": "Hull", "joined": "2018-05-05"}),
        ])
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn record_events(grid: &mut DataGrid) -> Rc<RefCell<Vec<GridEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        grid.subscribe_fn("test", move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn test_sort_then_filter_scenario() {
        let rows = rows_from_values(vec![
            json!({"id": 1, "name": "Bob", "age": 30}),
            json!({"id": 2, "name": "Ann", "age": 25}),
        ]);
        let mut grid = DataGrid::new(people_columns(), rows).unwrap();

        grid.toggle_sort("age").unwrap();
        assert_eq!(names(&grid.displayed_rows()), vec!["Ann", "Bob"]);

        grid.set_filter("age", FilterOperator::Gte, "28").unwrap();
        assert_eq!(names(&grid.displayed_rows()), vec!["Bob"]);
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.pagination().total, 1);
    }

    #[test]
    fn test_total_counts_search_and_filter_survivors() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_page_size(2);
        grid.set_query("york");
        grid.set_filter("age", FilterOperator::Lt, "50").unwrap();

        let expected = people()
            .iter()
            .filter(|r| SearchFilter::matches(r, "york", &people_columns()))
            .filter(|r| r["age"].as_f64().is_some_and(|a| a < 50.0))
            .count();
        assert_eq!(expected, 2);
        assert_eq!(grid.total(), expected);
        assert_eq!(grid.pagination().total, expected);
        assert_eq!(names(&grid.filtered_rows()), vec!["Ann", "cara"]);
    }

    #[test]
    fn test_malformed_numeric_operand_excludes_everything() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_filter("age", FilterOperator::Gt, "abc").unwrap();
        assert_eq!(grid.total(), 0);
        assert!(grid.displayed_rows().is_empty());
        assert_eq!(grid.range_label(), "No rows");
    }

    #[test]
    fn test_date_filter_skips_unparseable_dates() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_filter("joined", FilterOperator::Gte, "2020-01-01").unwrap();
        assert_eq!(names(&grid.filtered_rows()), vec!["Bob", "Ann", "Finn"]);
    }

    #[test]
    fn test_three_clicks_restore_natural_order() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        let natural = names(&grid.displayed_rows());

        grid.toggle_sort("name").unwrap();
        assert_eq!(grid.sort().direction, SortDirection::Asc);
        assert_eq!(
            names(&grid.displayed_rows()),
            vec!["Ann", "Bob", "cara", "Dev", "Eve", "Finn", "Gus"]
        );

        grid.toggle_sort("name").unwrap();
        assert_eq!(grid.sort().direction, SortDirection::Desc);
        assert_eq!(names(&grid.displayed_rows())[0], "Gus");

        grid.toggle_sort("name").unwrap();
        assert!(!grid.sort().is_active());
        assert_eq!(names(&grid.displayed_rows()), natural);
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let rows = people();
        let columns = people_columns();
        let sort = SortState::ascending("age");

        let once = sort_indices(&rows, (0..rows.len()).collect(), &sort, &columns);
        let twice = sort_indices(&rows, once.clone(), &sort, &columns);
        assert_eq!(once, twice);

        // Null age sorts as zero; Ann stays ahead of Dev at 25
        let ordered: Vec<i64> = once.iter().map(|&i| rows[i]["id"].as_i64().unwrap()).collect();
        assert_eq!(ordered, vec![5, 2, 4, 1, 7, 3, 6]);
    }

    #[test]
    fn test_pages_concatenate_to_sorted_sequence() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_sort(SortState::descending("joined")).unwrap();
        grid.set_page_size(3);
        assert_eq!(grid.page_count(), 3);

        let mut pages: Vec<Row> = Vec::new();
        for page in 0..grid.page_count() {
            grid.go_to_page(page);
            let shown = grid.displayed_rows();
            assert!(shown.len() <= 3);
            pages.extend(shown);
        }
        assert_eq!(names(&pages), names(&grid.sorted_rows()));
        assert_eq!(pages.len(), grid.total());
        assert!(!grid.has_next_page());
        assert_eq!(grid.range_label(), "Showing 7-7 of 7");
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_page_size(0);
        assert_eq!(grid.pagination().page_size, 1);

        grid.go_to_page(99);
        assert_eq!(grid.pagination().page, 6);
        assert!(!grid.next_page());

        grid.set_page_size(50);
        assert_eq!(grid.pagination().page, 0);
        assert!(!grid.previous_page());
    }

    #[test]
    fn test_selection_survives_search_changes() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.toggle_row_at(0);
        let bob = grid.rows()[0].clone();

        grid.set_query("ann");
        assert!(grid.displayed_rows().iter().all(|r| r["name"] != "Bob"));
        assert!(grid.selection().is_selected(&bob));

        grid.set_query("");
        assert!(grid.selection().is_selected(&bob));
        assert_eq!(names(grid.selected_rows()), vec!["Bob"]);
    }

    #[test]
    fn test_select_all_only_touches_current_page() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.set_page_size(3);

        grid.toggle_select_all();
        assert!(grid.is_all_selected());
        grid.next_page();
        assert!(!grid.is_all_selected());
        assert!(!grid.is_indeterminate());
        grid.toggle_row_at(0);
        assert!(grid.is_indeterminate());

        grid.toggle_select_all();
        assert_eq!(grid.selected_rows().len(), 6);
        grid.toggle_select_all();
        assert_eq!(names(grid.selected_rows()), vec!["Bob", "Ann", "cara"]);
    }

    #[test]
    fn test_single_mode_replaces_selection() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_selection_mode(SelectionMode::Single);
        grid.toggle_row_at(0);
        grid.toggle_row_at(1);
        assert_eq!(names(grid.selected_rows()), vec!["Ann"]);

        // Toggling the selected row again keeps it and emits nothing
        let emitted = grid.events().history().len();
        assert!(!grid.toggle_row_at(1));
        assert_eq!(names(grid.selected_rows()), vec!["Ann"]);
        assert_eq!(grid.events().history().len(), emitted);

        // Select-all is a multiple-mode feature
        grid.toggle_select_all();
        assert_eq!(names(grid.selected_rows()), vec!["Ann"]);
    }

    #[test]
    fn test_rejected_edit_leaves_data_and_emits_nothing() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_editable(true);
        let events = record_events(&mut grid);

        assert!(grid.start_edit(0, "age"));
        let outcome = grid.commit_edit("-5");

        assert_eq!(outcome, CommitOutcome::Rejected { old_value: json!(30) });
        assert_eq!(grid.rows()[0]["age"], json!(30));
        assert!(!events
            .borrow()
            .iter()
            .any(|e| matches!(e, GridEvent::CellEdited(_))));
    }

    #[test]
    fn test_committed_edit_reports_change_and_resorts() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_editable(true);
        grid.set_sort(SortState::ascending("age")).unwrap();
        let events = record_events(&mut grid);

        // Display order by age: Eve(null), Ann, Dev, Bob, ...
        assert!(grid.start_edit(1, "age"));
        let CommitOutcome::Committed(edit) = grid.commit_edit("60") else {
            panic!("edit should commit");
        };

        assert_eq!(edit.column, "age");
        assert_eq!(edit.old_value, json!(25));
        assert_eq!(edit.new_value, json!(60));
        assert_eq!(edit.row["name"], json!("Ann"));
        assert_eq!(names(&grid.sorted_rows()).last().unwrap(), "Ann");
        assert!(matches!(events.borrow()[0], GridEvent::CellEdited(_)));
    }

    #[test]
    fn test_nested_field_edit() {
        let columns = vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("address.city", "City"),
        ];
        let rows = rows_from_values(vec![json!({"name": "Ann", "address": {"city": "York"}})]);
        let mut grid = DataGrid::new(columns, rows).unwrap();
        grid.set_editable(true);

        grid.start_edit(0, "address.city");
        assert!(matches!(grid.commit_edit("Leeds"), CommitOutcome::Committed(_)));
        assert_eq!(*grid.rows()[0], json!({"name": "Ann", "address": {"city": "Leeds"}}));
    }

    #[test]
    fn test_delete_row_emits_and_reclamps() {
        let mut grid = DataGrid::new(people_columns(), people()).unwrap();
        grid.set_page_size(3);
        grid.last_page();
        let events = record_events(&mut grid);

        let removed = grid.delete_row(0).unwrap();
        assert_eq!(removed["name"], json!("Gus"));
        assert_eq!(grid.rows().len(), 6);
        assert_eq!(grid.pagination().page, 1);
        assert!(matches!(
            events.borrow().as_slice(),
            [GridEvent::RowDeleted { index: 6, .. }]
        ));
        assert!(grid.delete_row(5).is_err());
    }

    #[test]
    fn test_export_quotes_and_uses_filtered_natural_order() {
        let columns = vec![
            ColumnDef::new("id", "ID").with_type(ColumnType::Number),
            ColumnDef::new("name", "Name"),
        ];
        let rows = rows_from_values(vec![
            json!({"id": 1, "name": "O\"Brien"}),
            json!({"id": 2, "name": "Smith"}),
        ]);
        let mut grid = DataGrid::new(columns, rows).unwrap();
        grid.set_sort(SortState::descending("id")).unwrap();
        grid.set_page_size(1);

        let csv = grid.export(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "\"ID\",\"Name\"\n\"1\",\"O\"\"Brien\"\n\"2\",\"Smith\"");

        let json_text = grid.export(ExportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(
            parsed,
            json!([{"ID": 1, "Name": "O\"Brien"}, {"ID": 2, "Name": "Smith"}])
        );
    }

    #[test]
    fn test_export_selected_and_write_file() -> anyhow::Result<()> {
        let mut grid = DataGrid::new(people_columns(), people())?;
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.toggle_row_at(3);
        grid.toggle_row_at(1);

        let content = grid.export_selected(ExportFormat::Csv)?;
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().nth(1).unwrap().contains("\"Dev\""));

        let dir = tempfile::tempdir()?;
        let path = DataExporter::write_to_dir(dir.path(), "picked", ExportFormat::Csv, &content)?;
        assert_eq!(std::fs::read_to_string(path)?, content);
        Ok(())
    }
}
