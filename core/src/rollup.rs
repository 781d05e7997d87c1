//! Aggregation of block-level rows to coarser census geographies
//!
//! A 15-digit block geocode nests every coarser level as a prefix:
//! state (2), county (5), tract (11), block group (12).

use crate::errors::{LodesError, Result};
use crate::remap::to_numeric;
use crate::table::{Table, Value, value_to_text};
use std::collections::HashMap;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};

/// Census geography level reachable by truncating a block geocode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum GeoLevel {
    State,
    County,
    Tract,
    BlockGroup,
    Block,
}

impl GeoLevel {
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            LodesError::input(format!(
                "invalid level '{s}'; expected state, county, tract, block-group or block"
            ))
        })
    }

    /// Geocode prefix length for this level
    pub fn prefix_len(&self) -> usize {
        match self {
            Self::State => 2,
            Self::County => 5,
            Self::Tract => 11,
            Self::BlockGroup => 12,
            Self::Block => 15,
        }
    }

    /// Truncate a block geocode to this level.
    pub fn truncate<'a>(&self, geocode: &'a str) -> Result<&'a str> {
        geocode.get(..self.prefix_len()).ok_or_else(|| {
            LodesError::input(format!(
                "geocode '{geocode}' is too short for {self} level ({} digits)",
                self.prefix_len()
            ))
        })
    }
}

#[derive(Clone, Copy)]
enum Sum {
    Int(i64),
    Real(f64),
}

impl Sum {
    fn add(self, value: Value) -> Self {
        match (self, to_numeric(value)) {
            (Self::Int(acc), Value::Integer(i)) => match acc.checked_add(i) {
                Some(total) => Self::Int(total),
                None => Self::Real(acc as f64 + i as f64),
            },
            (Self::Int(acc), Value::Real(r)) => Self::Real(acc as f64 + r),
            (Self::Real(acc), Value::Integer(i)) => Self::Real(acc + i as f64),
            (Self::Real(acc), Value::Real(r)) => Self::Real(acc + r),
            (sum, _) => sum,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Integer(i),
            Self::Real(r) => Value::Real(r),
        }
    }
}

/// Sum `value_columns` per `key_column` geocode truncated to `level`.
///
/// The result has the key column followed by the value columns, one row per
/// truncated key in first-seen order. Values are coerced the way the column
/// retype does, so nulls and unparseable text count as zero.
pub fn sum_by(
    table: &Table,
    key_column: &str,
    level: GeoLevel,
    value_columns: &[&str],
) -> Result<Table> {
    let column_index = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| LodesError::input(format!("table has no column named '{name}'")))
    };
    let key_idx = column_index(key_column)?;
    let value_idxs = value_columns
        .iter()
        .map(|name| column_index(name))
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, Vec<Sum>> = HashMap::new();
    for row in table.rows() {
        let geocode = value_to_text(&row[key_idx]).ok_or_else(|| {
            LodesError::input(format!("null value in key column '{key_column}'"))
        })?;
        let key = level.truncate(&geocode)?.to_string();
        let acc = sums.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            vec![Sum::Int(0); value_idxs.len()]
        });
        for (slot, &idx) in acc.iter_mut().zip(&value_idxs) {
            *slot = slot.add(row[idx].clone());
        }
    }

    let mut columns = Vec::with_capacity(value_columns.len() + 1);
    columns.push(key_column.to_string());
    columns.extend(value_columns.iter().map(ToString::to_string));

    let mut out = Table::new(columns);
    for key in order {
        let totals = sums.remove(&key).unwrap_or_default();
        let mut row = Vec::with_capacity(totals.len() + 1);
        row.push(Value::Text(key));
        row.extend(totals.into_iter().map(Sum::into_value));
        out.push_row(row)?;
    }
    tracing::debug!(level = %level, groups = out.len(), "Rolled up rows");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn blocks() -> Table {
        Table::from_rows(
            vec!["h_geocode".into(), "total".into(), "ratio".into()],
            vec![
                vec![
                    Value::Text("482011000001001".into()),
                    Value::Integer(3),
                    Value::Real(0.5),
                ],
                vec![
                    Value::Text("482019999001002".into()),
                    Value::Integer(7),
                    Value::Null,
                ],
                vec![
                    Value::Text("482011000001003".into()),
                    Value::Text("4".into()),
                    Value::Real(0.25),
                ],
            ],
        )
        .expect("table")
    }

    #[test]
    fn sums_per_tract_in_first_seen_order() {
        let out = sum_by(&blocks(), "h_geocode", GeoLevel::Tract, &["total", "ratio"]).expect("sum");
        assert_eq!(out.columns(), ["h_geocode", "total", "ratio"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0, "h_geocode"), Some(&Value::Text("48201100000".into())));
        assert_eq!(out.get(0, "total"), Some(&Value::Integer(7)));
        assert_eq!(out.get(0, "ratio"), Some(&Value::Real(0.75)));
        assert_eq!(out.get(1, "h_geocode"), Some(&Value::Text("48201999900".into())));
        assert_eq!(out.get(1, "ratio"), Some(&Value::Integer(0)));
    }

    #[test]
    fn county_collapses_everything() {
        let out = sum_by(&blocks(), "h_geocode", GeoLevel::County, &["total"]).expect("sum");
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "total"), Some(&Value::Integer(14)));
    }

    #[test]
    fn missing_columns_and_short_keys_are_input_errors() {
        assert!(sum_by(&blocks(), "w_geocode", GeoLevel::Tract, &["total"]).is_err());
        assert!(sum_by(&blocks(), "h_geocode", GeoLevel::Tract, &["jobs"]).is_err());

        let short = Table::from_rows(
            vec!["geocode".into(), "total".into()],
            vec![vec![Value::Text("4820".into()), Value::Integer(1)]],
        )
        .expect("table");
        assert!(sum_by(&short, "geocode", GeoLevel::County, &["total"]).is_err());
        assert_eq!(GeoLevel::parse("block-group").expect("level").prefix_len(), 12);
    }
}
