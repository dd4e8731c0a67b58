//! ## lookout-core::table
//! **Detection result tables**
//!
//! The detection pipeline writes one CSV row per flow. Flow columns are opaque
//! to us except for `Label` (the verdict) and `Attack_Type` (set on attack
//! rows only). Cells are typed on load so missing-value sentinels never leak
//! into JSON: every `Cell` converts to a finite number, a string, or `null`.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TableError;

pub const LABEL_COLUMN: &str = "Label";
pub const ATTACK_TYPE_COLUMN: &str = "Attack_Type";

/// Cell spellings the pipeline (and the dataframe library behind it) uses for "no value".
const MISSING_SENTINELS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Verdict assigned to a flow by the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Benign,
    Anomaly,
    Attack,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Benign, Label::Anomaly, Label::Attack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Benign => "BENIGN",
            Label::Anomaly => "ANOMALY",
            Label::Attack => "ATTACK",
        }
    }

    /// Exact, case-sensitive match against the pipeline's label vocabulary.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == raw)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_SENTINELS.contains(&trimmed) {
            return Cell::Missing;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Cell::Integer(n);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Cell::Float(f);
        }
        Cell::Text(raw.to_string())
    }

    /// True for explicit missing cells and for non-finite floats.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Float(f) => !f.is_finite(),
            Cell::Integer(_) | Cell::Text(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON view of the cell. NaN and infinities become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Missing => Value::Null,
            Cell::Integer(n) => Value::from(*n),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Integer(n) => write!(f, "{n}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow {
    cells: Vec<Cell>,
}

impl ResultRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered columns plus ordered rows, as produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
    label_index: Option<usize>,
    attack_type_index: Option<usize>,
}

impl ResultTable {
    /// Builds a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<ResultRow>) -> Result<Self, TableError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(TableError::Malformed(format!(
                "row {i} has {} cells, header has {} columns",
                row.len(),
                columns.len()
            )));
        }

        let label_index = columns.iter().position(|c| c == LABEL_COLUMN);
        let attack_type_index = columns.iter().position(|c| c == ATTACK_TYPE_COLUMN);

        Ok(Self {
            columns,
            rows,
            label_index,
            attack_type_index,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(ResultRow::new(record.iter().map(Cell::parse).collect()));
        }

        Self::new(columns, rows)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TableError::NotFound(path.to_path_buf()),
            _ => TableError::Io(e),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Verdict of `row`, or `None` when the label is missing or outside the known set.
    pub fn label(&self, row: &ResultRow) -> Option<Label> {
        self.label_index
            .and_then(|i| row.get(i))
            .and_then(Cell::as_text)
            .and_then(Label::parse)
    }

    /// Attack type of `row` as a string key, skipping missing values.
    pub fn attack_type(&self, row: &ResultRow) -> Option<String> {
        let cell = self.attack_type_index.and_then(|i| row.get(i))?;
        if cell.is_missing() {
            return None;
        }
        Some(cell.to_string())
    }

    /// One row as a JSON object keyed by column name, in column order.
    pub fn record(&self, row: &ResultRow) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(row.cells())
            .map(|(column, cell)| (column.clone(), cell.to_json()))
            .collect()
    }

    pub fn records(&self) -> Vec<Value> {
        self.preview(self.rows.len())
    }

    /// The first `limit` rows as JSON objects.
    pub fn preview(&self, limit: usize) -> Vec<Value> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| Value::Object(self.record(row)))
            .collect()
    }
}
