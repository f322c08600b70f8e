use crate::errors::ExportError;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

const BOM: &str = "\u{FEFF}";
pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Ordered columns plus display headers for a CSV export.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    pub columns: Vec<String>,
    pub headers: HashMap<String, String>,
}

impl ColumnMapping {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            columns: pairs.iter().map(|(key, _)| key.to_string()).collect(),
            headers: pairs
                .iter()
                .map(|(key, header)| (key.to_string(), header.to_string()))
                .collect(),
        }
    }

    pub fn header_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.headers.get(column).map(String::as_str).unwrap_or(column)
    }

    pub fn violations() -> Self {
        Self::new(&[
            ("id", "ID"),
            ("name", "Violator Name"),
            ("vehicle", "Vehicle No."),
            ("type", "Violation Type"),
            ("area", "Area"),
            ("date", "Timestamp"),
            ("fine", "Fine (INR)"),
            ("status", "Status"),
            ("speed", "Speed (km/h)"),
            ("camera", "Camera ID"),
        ])
    }

    pub fn area_summary() -> Self {
        Self::new(&[("name", "Area"), ("count", "Total Violations")])
    }

    pub fn type_summary() -> Self {
        Self::new(&[("name", "Violation Type"), ("count", "Total Violations")])
    }
}

/// Renders rows as CSV. Every cell is quoted and every row ends in CRLF.
/// An empty row set produces an empty document.
pub fn to_csv<T: Serialize>(rows: &[T], mapping: &ColumnMapping) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();
    let header: Vec<String> = mapping
        .columns
        .iter()
        .map(|column| quote(mapping.header_for(column)))
        .collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for (index, row) in rows.iter().enumerate() {
        let value = serde_json::to_value(row)?;
        let Value::Object(record) = value else {
            return Err(ExportError::NotARecord(index));
        };
        let cells: Vec<String> = mapping
            .columns
            .iter()
            .map(|column| quote(&cell_text(record.get(column))))
            .collect();
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }

    Ok(out)
}

pub fn to_json<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// A file handed to the client as an attachment.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Download {
    pub fn csv(filename: impl Into<String>, content: &str) -> Self {
        let mut body = Vec::with_capacity(BOM.len() + content.len());
        body.extend_from_slice(BOM.as_bytes());
        body.extend_from_slice(content.as_bytes());
        Self {
            filename: filename.into(),
            content_type: CSV_CONTENT_TYPE,
            body,
        }
    }

    pub fn json(filename: impl Into<String>, content: String) -> Self {
        Self {
            filename: filename.into(),
            content_type: JSON_CONTENT_TYPE,
            body: content.into_bytes(),
        }
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupCount;
    use serde_json::json;

    #[test]
    fn quotes_every_cell_and_doubles_inner_quotes() {
        let rows = vec![json!({ "id": 1, "name": "A,B\"C" })];
        let mapping = ColumnMapping {
            columns: vec!["id".to_string(), "name".to_string()],
            headers: HashMap::new(),
        };
        let csv = to_csv(&rows, &mapping).unwrap();
        let lines: Vec<&str> = csv.split_inclusive("\r\n").collect();

        assert_eq!(lines[0], "\"id\",\"name\"\r\n");
        assert_eq!(lines[1], "\"1\",\"A,B\"\"C\"\r\n");
    }

    #[test]
    fn missing_and_null_values_are_empty_cells() {
        let rows = vec![json!({ "name": null })];
        let mapping = ColumnMapping::new(&[("name", "Name"), ("speed", "Speed")]);
        let csv = to_csv(&rows, &mapping).unwrap();
        assert_eq!(csv, "\"Name\",\"Speed\"\r\n\"\",\"\"\r\n");
    }

    #[test]
    fn summary_rows_use_display_headers() {
        let rows = vec![GroupCount { name: "MG Road".to_string(), count: 3 }];
        let csv = to_csv(&rows, &ColumnMapping::area_summary()).unwrap();
        assert_eq!(csv, "\"Area\",\"Total Violations\"\r\n\"MG Road\",\"3\"\r\n");
    }

    #[test]
    fn empty_rows_give_empty_document() {
        let rows: Vec<Value> = Vec::new();
        assert_eq!(to_csv(&rows, &ColumnMapping::violations()).unwrap(), "");
    }

    #[test]
    fn scalar_rows_are_rejected() {
        let rows = vec![json!("loose")];
        assert!(matches!(
            to_csv(&rows, &ColumnMapping::violations()),
            Err(ExportError::NotARecord(0))
        ));
    }

    #[test]
    fn csv_download_starts_with_bom() {
        let download = Download::csv("report.csv", "\"a\"\r\n");
        assert_eq!(&download.body[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(download.content_type, CSV_CONTENT_TYPE);
    }

    #[test]
    fn json_export_is_pretty() {
        let text = to_json(&[json!({ "id": 1 })]).unwrap();
        assert_eq!(text, "[\n  {\n    \"id\": 1\n  }\n]");
    }
}
