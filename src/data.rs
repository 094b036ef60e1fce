use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::io::Read;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

static ABSENT: Cell = Cell::Empty;

/// A single spreadsheet value. `Empty` covers nulls, blank CSV fields and
/// positions past the end of a short row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// String form used for category keys, time labels and header names
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Cell::Empty),
            Value::Bool(b) => Some(Cell::Bool(*b)),
            Value::Number(n) => Some(Cell::Number(n.clone())),
            Value::String(s) => Some(Cell::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n.into())
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n.into())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

/// Cell at `idx`, or `Cell::Empty` when the row is too short
pub fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&ABSENT)
}

/// A parsed worksheet: row 0 holds the headers, the rest are records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub data: Vec<Vec<Cell>>,
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

impl TableContent {
    pub fn new(sheet_name: impl Into<String>, data: Vec<Vec<Cell>>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            data,
        }
    }

    pub fn headers(&self) -> &[Cell] {
        self.data.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        self.data.get(1..).unwrap_or(&[])
    }

    /// Header strings; a blank header becomes ""
    pub fn header_names(&self) -> Vec<String> {
        self.headers()
            .iter()
            .map(|h| h.to_text().unwrap_or_default())
            .collect()
    }

    /// Accepts either `{"sheet_name": .., "data": [[..], ..]}` or a bare array of rows
    pub fn from_json(value: &Value) -> Result<Self> {
        let (sheet_name, data) = match value {
            Value::Object(obj) => {
                let sheet_name = match obj.get("sheet_name") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => default_sheet_name(),
                    Some(_) => return Err(AnalysisError::malformed("sheet_name must be a string")),
                };
                let data = obj
                    .get("data")
                    .ok_or_else(|| AnalysisError::malformed("missing 'data' field"))?;
                (sheet_name, data)
            }
            Value::Array(_) => (default_sheet_name(), value),
            _ => {
                return Err(AnalysisError::malformed(
                    "table must be an object with 'data' or an array of rows",
                ))
            }
        };

        let rows = data
            .as_array()
            .ok_or_else(|| AnalysisError::malformed("'data' must be an array of rows"))?;

        let mut table = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let values = row.as_array().ok_or_else(|| {
                AnalysisError::malformed(format!("row {} is not an array", row_idx))
            })?;
            let mut cells = Vec::with_capacity(values.len());
            for (col_idx, v) in values.iter().enumerate() {
                let cell = Cell::from_value(v).ok_or_else(|| {
                    AnalysisError::malformed(format!(
                        "cell ({}, {}) is not a scalar value",
                        row_idx, col_idx
                    ))
                })?;
                cells.push(cell);
            }
            table.push(cells);
        }

        Ok(Self {
            sheet_name,
            data: table,
        })
    }

    /// Read CSV where the first record is the header row. Rows may be ragged.
    pub fn from_csv<R: Read>(reader: R, sheet_name: impl Into<String>) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut data = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect();
            data.push(row);
        }

        Ok(Self {
            sheet_name: sheet_name.into(),
            data,
        })
    }
}
