//! Query execution and result materialization

use crate::connection::{DbSource, LodesDb};
use crate::errors::{LodesError, Result};
use crate::query::LodesQuery;
use crate::remap;
use crate::table::{Table, Value};
use regex_lite::Regex;
use rusqlite::params_from_iter;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static FROM_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+([A-Za-z0-9_]+)").unwrap());

/// First table named after `FROM` in raw SQL.
pub fn referenced_table(sql: &str) -> Option<String> {
    FROM_TABLE_RE
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl LodesDb {
    /// Execute a generated query, binding its geocodes as parameters.
    pub fn fetch(&self, query: &LodesQuery, rename: bool) -> Result<Table> {
        let table_name = query.table_name();
        let mut result: Option<Table> = None;
        for (sql, params) in query.statements() {
            let chunk = self.select(&sql, &params, Some(&table_name))?;
            match result.as_mut() {
                Some(acc) => acc.extend(chunk)?,
                None => result = Some(chunk),
            }
        }
        let table = result.unwrap_or_default();
        tracing::info!(table = %table_name, rows = table.len(), "Fetched LODES rows");
        Ok(finish(table, rename))
    }

    /// Execute raw SQL.
    pub fn fetch_sql(&self, sql: &str, rename: bool) -> Result<Table> {
        let table = self.select(sql, &[], None)?;
        tracing::info!(rows = table.len(), "Fetched rows for raw SQL");
        Ok(finish(table, rename))
    }

    /// Run one statement and collect every row in result-set column order.
    /// `table` names the table the statement reads, for failure diagnostics.
    pub(crate) fn select(&self, sql: &str, params: &[Value], table: Option<&str>) -> Result<Table> {
        tracing::debug!(sql, params = params.len(), "Executing query");
        let fail = |e: rusqlite::Error| self.diagnose(e, sql, table);

        let mut stmt = self.conn().prepare(sql).map_err(&fail)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut out = Table::new(columns);

        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(&fail)?;
        while let Some(row) = rows.next().map_err(&fail)? {
            let values = (0..width)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(&fail)?;
            out.push_row(values)?;
        }
        Ok(out)
    }

    /// Turn an engine failure into `TableNotFound` when the table it reads is
    /// absent from the schema, `QueryExecution` otherwise.
    fn diagnose(&self, err: rusqlite::Error, sql: &str, table: Option<&str>) -> LodesError {
        let table = table.map(str::to_string).or_else(|| referenced_table(sql));
        if let Some(table) = table {
            match self.table_exists(&table) {
                Ok(false) => {
                    tracing::warn!(table = %table, error = %err, "Query references a missing table");
                    return LodesError::table_not_found(table, sql);
                }
                Ok(true) => {}
                Err(check) => {
                    tracing::debug!(table = %table, error = %check, "Table existence check failed");
                }
            }
        }
        tracing::warn!(error = %err, "Query execution failed");
        LodesError::query_with_source(sql, err)
    }
}

fn finish(table: Table, rename: bool) -> Table {
    if rename { remap::retype(table) } else { table }
}

/// Execute `query` against `source`. With `rename`, LODES short codes are
/// replaced by readable names and count columns are made numeric.
pub fn pull_data(query: &LodesQuery, source: DbSource<'_>, rename: bool) -> Result<Table> {
    source.with_db(|db| db.fetch(query, rename))
}

/// Execute raw SQL against `source`, with the same diagnostics as `pull_data`.
pub fn pull_sql(sql: &str, source: DbSource<'_>, rename: bool) -> Result<Table> {
    source.with_db(|db| db.fetch_sql(sql, rename))
}
