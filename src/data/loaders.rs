use crate::data::column::ColumnType;
use crate::data::row::{rows_from_values, Row};
use crate::data::type_inference::{infer_from_string, merge_types};
use crate::data::value_accessor::number_to_json;
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde_json::{Map, Value as JsonValue};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Load rows from a `.json` or `.csv` file, chosen by extension
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => load_json_rows(path),
        "csv" => load_csv_rows(path),
        other => bail!("Unsupported file type '{}' for {:?}", other, path),
    }
}

/// Load a CSV file into rows keyed by header.
///
/// Column types are inferred from the first 100 records so numbers and
/// booleans arrive typed; empty fields become null.
pub fn load_csv_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    // Read all rows first to collect data
    let mut string_rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        string_rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    // Infer column types by sampling the data
    let mut column_types: Vec<Option<ColumnType>> = vec![None; headers.len()];
    for row in string_rows.iter().take(100) {
        for (col_idx, value) in row.iter().enumerate().take(headers.len()) {
            if !value.is_empty() {
                let inferred = Some(infer_from_string(value));
                column_types[col_idx] = merge_types(column_types[col_idx], inferred);
            }
        }
    }

    let values: Vec<JsonValue> = string_rows
        .into_iter()
        .map(|fields| {
            let mut obj = Map::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let raw = fields.get(col_idx).map(String::as_str).unwrap_or("");
                let column_type = column_types[col_idx].unwrap_or_default();
                obj.insert(header.clone(), typed_value(raw, column_type));
            }
            JsonValue::Object(obj)
        })
        .collect();

    info!(
        target: "grid",
        "Loaded {} rows from CSV {:?}",
        values.len(),
        path.as_ref()
    );
    Ok(rows_from_values(values))
}

fn typed_value(raw: &str, column_type: ColumnType) -> JsonValue {
    if raw.is_empty() {
        return JsonValue::Null;
    }
    match column_type {
        ColumnType::Number => match raw.trim().parse::<f64>() {
            Ok(n) => number_to_json(n),
            Err(_) => JsonValue::String(raw.to_string()),
        },
        ColumnType::Boolean => JsonValue::Bool(raw.trim().eq_ignore_ascii_case("true")),
        _ => JsonValue::String(raw.to_string()),
    }
}

/// Load a JSON file holding an array of objects
pub fn load_json_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open JSON file: {:?}", path.as_ref()))?;
    let reader = BufReader::new(file);

    // Parse JSON - expect an array of objects
    let json_data: Vec<JsonValue> =
        serde_json::from_reader(reader).with_context(|| "Failed to parse JSON file")?;

    if let Some(pos) = json_data.iter().position(|v| !v.is_object()) {
        bail!("JSON data must be an array of objects (element {} is not)", pos);
    }

    info!(
        target: "grid",
        "Loaded {} rows from JSON {:?}",
        json_data.len(),
        path.as_ref()
    );
    Ok(rows_from_values(json_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_csv() -> Result<()> {
        // Create a temporary CSV file
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(temp_file, "id,name,price,active")?;
        writeln!(temp_file, "1,Widget,9.99,true")?;
        writeln!(temp_file, "2,\"Gadget, large\",,false")?;
        temp_file.flush()?;

        let rows = load_rows(temp_file.path())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            *rows[0],
            json!({"id": 1, "name": "Widget", "price": 9.99, "active": true})
        );
        assert_eq!(rows[1]["name"], json!("Gadget, large"));
        assert!(rows[1]["price"].is_null());

        let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "name", "price", "active"]);
        Ok(())
    }

    #[test]
    fn test_load_json() -> Result<()> {
        // Create a temporary JSON file
        let mut temp_file = NamedTempFile::new()?;
        writeln!(
            temp_file,
            r#"[
            {{"id": 1, "name": "Alice", "address": {{"city": "Leeds"}}}},
            {{"id": 2, "name": "Bob", "score": null}}
        ]"#
        )?;
        temp_file.flush()?;

        let rows = load_json_rows(temp_file.path())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["address"]["city"], json!("Leeds"));
        assert!(rows[1]["score"].is_null());
        Ok(())
    }

    #[test]
    fn test_load_json_rejects_scalars() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "[1, 2]")?;
        temp_file.flush()?;

        assert!(load_json_rows(temp_file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_extension() {
        assert!(load_rows("rows.xlsx").is_err());
    }
}
