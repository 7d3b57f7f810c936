//! In-memory tabular data model consumed by the profiling core.
//!
//! A [`Table`] is an ordered list of uniquely named [`Column`]s that all share
//! one row count. Construction validates both invariants, so every `Table`
//! handed to the profiler is structurally sound.

use std::collections::HashSet;

use crate::{
    data::Value,
    error::{ProfilingError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a column from raw text cells, mapping blanks and placeholder
    /// tokens to missing.
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, raw: &[S]) -> Self {
        Self::new(
            name,
            raw.iter().map(|cell| Value::from_raw(cell.as_ref())).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_missing()).count()
    }

    pub fn non_missing(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|value| !value.is_missing())
    }

    /// Whether any text cell holds a character outside ASCII.
    pub fn has_non_ascii(&self) -> bool {
        self.values
            .iter()
            .any(|value| matches!(value, Value::String(text) if !text.is_ascii()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(ProfilingError::MalformedTable(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(ragged) = columns.iter().find(|column| column.len() != row_count) {
            return Err(ProfilingError::MalformedTable(format!(
                "column '{}' has {} row(s) but the table has {row_count}",
                ragged.name(),
                ragged.len()
            )));
        }
        Ok(Self { columns, row_count })
    }

    /// A table with named columns and no rows.
    pub fn with_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        Self::new(
            headers
                .iter()
                .map(|name| Column::new(name.as_ref(), Vec::new()))
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }
}
