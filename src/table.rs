//! Tabular input loading.
//!
//! `.csv` files use a `;` delimiter and are decoded as UTF-8, falling back
//! to Latin-1 when the bytes are not valid UTF-8. `.xlsx` files are read
//! from the first worksheet, with the first row as the header.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use serde_json::Value;

/// The column the address string is read from. The spelling is a
/// compatibility contract with existing input files.
pub const ADDRESS_COLUMN: &str = "Adress";

/// An ordered table of named columns. Rows keep their file order; a row's
/// index is its identity through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Load a table, dispatching on the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::from_csv(path),
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Self::from_xlsx(path),
            _ => bail!(
                "Unsupported file format: {}. Please provide an Excel (.xlsx) or CSV (.csv) file.",
                path.display()
            ),
        }
    }

    fn from_csv(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = decode_csv_bytes(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read the CSV header row")?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to parse CSV record")?;
            rows.push(record.iter().map(infer_value).collect());
        }

        Ok(Self { headers, rows })
    }

    fn from_xlsx(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .context("The workbook contains no worksheets")?;
        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("Failed to read worksheet {sheet:?}"))?;

        let mut file_rows = range.rows();
        let headers: Vec<String> = file_rows
            .next()
            .context("The worksheet contains no header row")?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = file_rows
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        Ok(Self { headers, rows })
    }

    /// Index of the column with the given (exact) name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// The values of one column, rendered as strings. Missing and null
    /// cells render empty.
    pub fn column_strings(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| match row.get(index) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// UTF-8 first, Latin-1 second. Latin-1 maps every byte to the code point
/// of the same value, so the fallback itself cannot fail.
fn decode_csv_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(not_utf8) => not_utf8
            .into_bytes()
            .iter()
            .map(|&byte| char::from(byte))
            .collect(),
    }
}

/// Spreadsheet-style typing for CSV cells: integers and floats surface as
/// JSON numbers, empty cells as null, everything else as text.
fn infer_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        other => Value::String(other.to_string()),
    }
}
