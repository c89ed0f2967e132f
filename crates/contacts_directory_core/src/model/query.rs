//! Contact query request and tabular result shapes.
//!
//! # Invariants
//! - Query parameters are carried verbatim; nothing here interprets
//!   selection syntax.
//! - Every `ResultSet` row has exactly one cell per column.

use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which contacts collection a query addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// All contacts of the directory.
    Contacts,
    /// Contacts matching a free-text name filter.
    Filter(String),
}

/// Contact query parameters forwarded to the backing source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsQuery {
    pub target: QueryTarget,
    pub projection: Option<Vec<String>>,
    pub selection: Option<String>,
    pub selection_args: Option<Vec<String>>,
    pub sort_order: Option<String>,
    /// Maximum number of rows the source should return.
    pub limit: Option<u32>,
}

impl ContactsQuery {
    /// Creates an unfiltered query with no projection or selection.
    pub fn contacts() -> Self {
        Self::for_target(QueryTarget::Contacts)
    }

    /// Creates a name-filter query.
    pub fn filter(text: impl Into<String>) -> Self {
        Self::for_target(QueryTarget::Filter(text.into()))
    }

    pub fn for_target(target: QueryTarget) -> Self {
        Self {
            target,
            projection: None,
            selection: None,
            selection_args: None,
            sort_order: None,
            limit: None,
        }
    }

    pub fn with_projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_selection<I, S>(mut self, selection: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = Some(selection.into());
        self.selection_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort_order(mut self, sort_order: impl Into<String>) -> Self {
        self.sort_order = Some(sort_order.into());
        self
    }
}

/// Partition of local contacts a local query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Contacts belonging to at least one visible group.
    Visible,
    /// Complement of the visible set.
    Hidden,
}

/// Tabular query result: named columns and value rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends one row after checking its width against the columns.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), RowShapeError> {
        if row.len() != self.columns.len() {
            return Err(RowShapeError {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the cell at `row` in column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let column = self.column_index(name)?;
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Returns the text cell at `row` in column `name`, if it holds text.
    pub fn text(&self, row: usize, name: &str) -> Option<&str> {
        match self.value(row, name)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the integer cell at `row` in column `name`, if it holds one.
    pub fn integer(&self, row: usize, name: &str) -> Option<i64> {
        match self.value(row, name)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

/// A row did not match the column count of its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowShapeError {
    pub expected: usize,
    pub actual: usize,
}

impl Display for RowShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row has {} cells but result set has {} columns",
            self.actual, self.expected
        )
    }
}

impl Error for RowShapeError {}
