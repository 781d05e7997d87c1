//! Schema catalog lookups

use crate::connection::LodesDb;
use crate::errors::{LodesError, Result};
use crate::naming::LodesTableName;
use rusqlite::params;

const TABLE_EXISTS_SQL: &str = "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";
const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name";

impl LodesDb {
    /// Whether a table named `name` exists in the schema.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn()
            .query_row(TABLE_EXISTS_SQL, params![name], |row| row.get(0))
            .map_err(|e| LodesError::query_with_source(TABLE_EXISTS_SQL, e))?;
        Ok(count > 0)
    }

    /// Every table whose name follows the LODES fact-table grammar, sorted.
    pub fn list_lodes_tables(&self) -> Result<Vec<LodesTableName>> {
        let mut stmt = self
            .conn()
            .prepare(LIST_TABLES_SQL)
            .map_err(|e| LodesError::query_with_source(LIST_TABLES_SQL, e))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| LodesError::query_with_source(LIST_TABLES_SQL, e))?;

        let mut tables = Vec::new();
        for name in names {
            let name = name.map_err(|e| LodesError::query_with_source(LIST_TABLES_SQL, e))?;
            if let Some(parsed) = LodesTableName::parse(&name) {
                tables.push(parsed);
            }
        }
        tables.sort_by_cached_key(ToString::to_string);
        Ok(tables)
    }
}
