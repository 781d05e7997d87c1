//! Geocode input normalization
//!
//! Callers hand over geocodes as a table column, a list, or a single string;
//! all three become a `GeocodeSet` that renders either as a literal SQL list
//! `('a', 'b')` or as bound placeholders `(?1, ?2)`.

use crate::errors::{LodesError, Result};
use crate::geometry::GeoTable;
use crate::table::{Table, Value};
use std::collections::HashSet;

/// Column a table must carry to be used as a geocode source
pub const GEOCODE_COLUMN: &str = "geocode";

/// A geocode specification, one variant per accepted input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeSpec {
    /// Values taken from a `geocode` column; duplicates are dropped.
    Column(Vec<String>),
    /// Values in caller order.
    List(Vec<String>),
    /// One geocode, or a parenthesized SQL list passed through verbatim.
    Literal(String),
    /// No filter. Only geometry fetch accepts this.
    All,
}

impl GeocodeSpec {
    /// Read the `geocode` column of a result table.
    pub fn from_table(table: &Table) -> Result<Self> {
        let column = table.column(GEOCODE_COLUMN).ok_or_else(|| {
            LodesError::input("table has no column named 'geocode'")
        })?;
        let values = column
            .map(|value| match value {
                Value::Text(s) => Ok(s.clone()),
                Value::Integer(i) => Ok(i.to_string()),
                other => Err(LodesError::input(format!(
                    "geocode column holds a non-text value: {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Column(dedup(values)))
    }

    /// Use the geocodes of a spatial result.
    pub fn from_geo_table(table: &GeoTable) -> Self {
        Self::Column(dedup(
            table.records().iter().map(|r| r.geocode.clone()).collect(),
        ))
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Resolve to a concrete set. `Ok(None)` means "no filter".
    pub fn normalize(&self) -> Result<Option<GeocodeSet>> {
        match self {
            Self::All => Ok(None),
            Self::Column(values) => Ok(Some(GeocodeSet::new(dedup(values.clone())))),
            Self::List(values) => Ok(Some(GeocodeSet::new(values.clone()))),
            Self::Literal(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(LodesError::input("geocode string is empty"));
                }
                if trimmed.starts_with('(') {
                    let values = parse_sql_list(trimmed)?;
                    Ok(Some(GeocodeSet {
                        values,
                        verbatim: Some(trimmed.to_string()),
                    }))
                } else {
                    Ok(Some(GeocodeSet::new(vec![trimmed.to_string()])))
                }
            }
        }
    }
}

/// A normalized, non-`All` geocode set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeSet {
    values: Vec<String>,
    verbatim: Option<String>,
}

impl GeocodeSet {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            verbatim: None,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values with duplicates removed, for binding. `IN` has set semantics
    /// so this never changes which rows match.
    pub fn distinct_values(&self) -> Vec<String> {
        dedup(self.values.clone())
    }

    /// Literal list, e.g. `('480019501001010', '480019501001011')`.
    pub fn to_sql_literal(&self) -> String {
        if let Some(verbatim) = &self.verbatim {
            return verbatim.clone();
        }
        let quoted: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect();
        format!("({})", quoted.join(", "))
    }
}

/// Placeholder list `(?{first}, ?{first+1}, ...)` for `count` values.
pub fn placeholders(first: usize, count: usize) -> String {
    let marks: Vec<String> = (first..first + count).map(|i| format!("?{i}")).collect();
    format!("({})", marks.join(", "))
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Split `('a', 'b', 123)` into its values.
fn parse_sql_list(text: &str) -> Result<Vec<String>> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| LodesError::input(format!("unbalanced geocode list: {text}")))?;

    let mut values = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };
        let value = if first == '\'' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        value.push('\'');
                    }
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(LodesError::input(format!(
                            "unterminated quote in geocode list: {text}"
                        )));
                    }
                }
            }
            value
        } else {
            let mut value = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',' && !c.is_whitespace()) {
                value.push(c);
            }
            if !crate::naming::is_token(&value) {
                return Err(LodesError::input(format!(
                    "unquoted geocode must be alphanumeric in list: {text}"
                )));
            }
            value
        };
        values.push(value);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => {
                return Err(LodesError::input(format!(
                    "unexpected '{c}' in geocode list: {text}"
                )));
            }
        }
    }
    Ok(values)
}
