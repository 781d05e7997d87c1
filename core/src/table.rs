//! In-memory result tables

use crate::errors::{LodesError, Result};
pub use rusqlite::types::Value;

/// Rows materialized from a result set, columns in result-set order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// An empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(LodesError::input(format!(
                "row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
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

    /// Position of the first column named `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [String] {
        &mut self.columns
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    /// Append the rows of another result with identical columns.
    pub(crate) fn extend(&mut self, other: Table) -> Result<()> {
        if other.columns != self.columns {
            return Err(LodesError::input(
                "cannot append a result with different columns",
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }
}

/// Render a value the way it would read in a CSV cell.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(format!("<{} bytes>", b.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let mut table = Table::new(vec!["geocode".into(), "total".into()]);
        table
            .push_row(vec![Value::Text("4800".into()), Value::Integer(3)])
            .expect("row");
        assert!(table.push_row(vec![Value::Integer(1)]).is_err());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "total"), Some(&Value::Integer(3)));
        assert_eq!(table.get(0, "missing"), None);
    }
}
