//! Observation table ingestion
//!
//! One row per experiment, one column per declared parameter plus the
//! measured objective values. Parameter cells must be present for a row to
//! reach the recommender; an empty objective cell means the experiment has
//! not been measured yet, or was deemed infeasible.

use crate::error::{Error, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse a raw cell. Empty cells and non-finite numbers are missing.
    pub fn parse(raw: &str) -> Option<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(integer) = raw.parse::<i64>() {
            return Some(Value::Int(integer));
        }
        if let Ok(float) = raw.parse::<f64>() {
            if float.is_finite() {
                return Some(Value::Float(float));
            }
            // NaN/inf markers denote missing measurements
            return None;
        }
        Some(Value::Text(raw.to_string()))
    }

    fn from_sheet_cell(cell: &Data) -> Option<Value> {
        match cell {
            Data::Empty => None,
            Data::Int(integer) => Some(Value::Int(*integer)),
            Data::Float(float) if float.is_finite() => Some(Value::Float(*float)),
            Data::Float(_) => None,
            Data::String(text) => Value::parse(text),
            Data::Bool(flag) => Some(Value::Int(i64::from(*flag))),
            Data::Error(_) => None,
            other => Value::parse(&other.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(integer) => Some(*integer as f64),
            Value::Float(float) => Some(*float),
            Value::Text(_) => None,
        }
    }

    /// Integer view. Spreadsheets store integers as floats, so a float with
    /// no fractional part qualifies.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(integer) => Some(*integer),
            Value::Float(float) if float.is_finite() && float.fract() == 0.0 => {
                Some(*float as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(integer) => write!(f, "{}", integer),
            // Debug formatting keeps the decimal point, so a written float
            // reads back as a float
            Value::Float(float) => write!(f, "{:?}", float),
            Value::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One observation handed to the recommender
#[derive(Debug, Clone)]
pub struct Observation {
    /// Declared parameters, all present
    pub params: HashMap<String, Value>,
    /// Declared objectives; `None` means not yet measured / infeasible
    pub objectives: HashMap<String, Option<f64>>,
}

/// An in-memory experiment table with ordered columns
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    /// An empty table with the given columns, for a fresh campaign
    pub fn with_columns(columns: Vec<String>) -> Table {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Load a table, dispatching on the file extension.
    ///
    /// `csv` is read with the csv crate; `xls`/`xlsx` through calamine.
    /// Any other extension is an [Error::UnsupportedFormat].
    pub fn parse(path: &Path) -> Result<Table> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Table::parse_csv(path),
            "xls" | "xlsx" => Table::parse_spreadsheet(path),
            other => Err(Error::UnsupportedFormat(format!(
                "'{}' (expected csv, xls or xlsx)",
                other
            ))),
        }
    }

    fn parse_csv(path: &Path) -> Result<Table> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_owned())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = vec![None; columns.len()];
            for (index, cell) in record.iter().enumerate().take(columns.len()) {
                row[index] = Value::parse(cell);
            }
            rows.push(row);
        }
        Ok(Table { columns, rows })
    }

    fn parse_spreadsheet(path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::UnsupportedFormat("spreadsheet has no sheets".to_string()))??;

        let mut sheet_rows = range.rows();
        let columns: Vec<String> = match sheet_rows.next() {
            Some(header) => header
                .iter()
                .map(|cell| cell.to_string().trim().to_owned())
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for sheet_row in sheet_rows {
            let mut row = vec![None; columns.len()];
            for (index, cell) in sheet_row.iter().enumerate().take(columns.len()) {
                row[index] = Value::from_sheet_cell(cell);
            }
            rows.push(row);
        }
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))?.as_ref()
    }

    /// Index of the named column, appending (and padding) it if absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    pub fn set(&mut self, row: usize, column: usize, value: Value) {
        if let Some(cells) = self.rows.get_mut(row) {
            if let Some(cell) = cells.get_mut(column) {
                *cell = Some(value);
            }
        }
    }

    /// Append a row; shorter rows are padded with missing cells
    pub fn push_row(&mut self, mut row: Vec<Option<Value>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// A copy of the last `n` rows, for rendering a proposed batch
    pub fn tail(&self, n: usize) -> Table {
        let start = self.rows.len().saturating_sub(n);
        Table {
            columns: self.columns.clone(),
            rows: self.rows[start..].to_vec(),
        }
    }

    /// Drop rows with a missing value in any of the given columns.
    ///
    /// Returns the number of dropped rows. A named column absent from the
    /// header is an [Error::MissingColumn].
    pub fn drop_missing(&mut self, columns: &[String]) -> Result<usize> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|column| {
                self.column_index(column)
                    .ok_or_else(|| Error::MissingColumn(column.clone()))
            })
            .collect::<Result<_>>()?;
        let before = self.rows.len();
        self.rows
            .retain(|row| indices.iter().all(|&index| row[index].is_some()));
        Ok(before - self.rows.len())
    }

    /// Build the recommender-facing observation list.
    ///
    /// Rows with a missing parameter cell are skipped (callers drop them
    /// beforehand); a present but non-numeric objective cell is an
    /// [Error::NumericDomain].
    pub fn observations(
        &self,
        parameters: &[String],
        objectives: &[String],
    ) -> Result<Vec<Observation>> {
        let param_indices: Vec<(usize, &String)> = parameters
            .iter()
            .map(|name| {
                self.column_index(name)
                    .map(|index| (index, name))
                    .ok_or_else(|| Error::MissingColumn(name.clone()))
            })
            .collect::<Result<_>>()?;
        let objective_indices: Vec<(usize, &String)> = objectives
            .iter()
            .map(|name| {
                self.column_index(name)
                    .map(|index| (index, name))
                    .ok_or_else(|| Error::MissingColumn(name.clone()))
            })
            .collect::<Result<_>>()?;

        let mut observations = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut params = HashMap::new();
            let mut complete = true;
            for (index, name) in &param_indices {
                match &row[*index] {
                    Some(value) => {
                        params.insert((*name).clone(), value.clone());
                    }
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            let mut objective_values = HashMap::new();
            for (index, name) in &objective_indices {
                let value = match &row[*index] {
                    Some(value) => Some(value.as_f64().ok_or_else(|| {
                        Error::NumericDomain(format!(
                            "objective '{}' has non-numeric value '{}'",
                            name, value
                        ))
                    })?),
                    None => None,
                };
                objective_values.insert((*name).clone(), value);
            }
            observations.push(Observation {
                params,
                objectives: objective_values,
            });
        }
        Ok(observations)
    }

    /// Write the table as CSV, missing cells as empty fields
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().from_writer(file);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            let record: Vec<String> = row
                .iter()
                .map(|cell| cell.as_ref().map(|value| value.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
