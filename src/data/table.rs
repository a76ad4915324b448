//! In-memory column table.
//!
//! A deliberately small dataframe: named columns of a single inferred kind,
//! all of the same length. Operations return new tables and never modify
//! the receiver.

use crate::error::{EdaError, EdaResult};
use serde::Serialize;
use std::fmt;

/// Cell spellings treated as missing values when a CSV is read.
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "<NA>"];

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NA"),
        }
    }
}

/// Kind of the values stored in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Numeric and boolean columns take part in aggregation.
    pub fn is_numeric_like(&self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Boolean)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Boolean => write!(f, "boolean"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    /// Build a column from raw CSV cells, inferring its kind.
    ///
    /// Boolean wins over numeric, numeric over text. A column holding only
    /// missing cells is numeric. Infinite numbers are read as missing.
    ///
    /// Surrounding whitespace is ignored when inferring the kind but kept
    /// in text values.
    pub fn from_raw(name: impl Into<String>, cells: Vec<String>) -> Self {
        let present: Vec<&str> = cells
            .iter()
            .map(|c| c.trim())
            .filter(|c| !is_missing_marker(c))
            .collect();

        let kind = if !present.is_empty() && present.iter().all(|c| parse_bool(c).is_some()) {
            ColumnKind::Boolean
        } else if present.iter().all(|c| c.parse::<f64>().is_ok()) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        };

        let values = cells
            .into_iter()
            .map(|raw| {
                let cell = raw.trim();
                if is_missing_marker(cell) {
                    return Value::Missing;
                }
                match kind {
                    ColumnKind::Boolean => parse_bool(cell).map_or(Value::Missing, Value::Bool),
                    ColumnKind::Numeric => match cell.parse::<f64>() {
                        Ok(n) if n.is_finite() => Value::Number(n),
                        _ => Value::Missing,
                    },
                    ColumnKind::Text => Value::Text(raw),
                }
            })
            .collect();

        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Copy of this column restricted to the given row positions.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            values: rows.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
            values: values
                .into_iter()
                .map(|v| v.map_or(Value::Missing, Value::Number))
                .collect(),
        }
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Boolean,
            values: values
                .into_iter()
                .map(|v| v.map_or(Value::Missing, Value::Bool))
                .collect(),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<&str>>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
            values: values
                .into_iter()
                .map(|v| v.map_or(Value::Missing, |s| Value::Text(s.to_string())))
                .collect(),
        }
    }
}

fn is_missing_marker(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// An ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table. All columns must have the same length.
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].len() == w[1].len()),
            "columns of unequal length"
        );
        Self { columns }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`Table::column`], but a missing column is a schema error.
    pub fn require(&self, name: &str) -> EdaResult<&Column> {
        self.column(name)
            .ok_or_else(|| EdaError::missing_column(name))
    }

    /// Copy of this table without the named column. Absence is not an error.
    pub fn without_column(&self, name: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
        }
    }

    /// Copy of this table with `column` replacing the column of the same name,
    /// or appended when no such column exists.
    pub fn with_column(&self, column: Column) -> Self {
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => columns.push(column),
        }
        Self::new(columns)
    }

    /// Copy of this table holding only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// Cells of one row, in column order.
    #[cfg(test)]
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }
}
