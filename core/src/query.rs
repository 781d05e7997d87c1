//! Query generation for LODES fact tables
//!
//! Pure string construction: nothing here touches a database.

use crate::errors::{LodesError, Result};
use crate::geocodes::{GeocodeSet, GeocodeSpec, placeholders};
use crate::naming::{DataType, JobType, LodesTableName, Perspective, Year, is_token};
use crate::table::Value;
use std::fmt;

/// Subset used when the request leaves `subset_type` empty
pub const DEFAULT_SUBSET: &str = "S000";

/// Largest number of geocodes bound to one statement. SQLite caps host
/// parameters at 32766; bigger sets run as several statements.
pub const MAX_BOUND_GEOCODES: usize = 30_000;

/// A semantic request for LODES rows
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub data_type: DataType,
    /// Only consulted for `od`
    pub perspective: Perspective,
    pub job_type: JobType,
    /// Empty means `S000`
    pub subset_type: String,
    pub state_code: String,
    pub year: Year,
    pub geocodes: GeocodeSpec,
}

impl QueryRequest {
    /// A request for all jobs, home perspective, default subset, Texas.
    pub fn new(data_type: DataType, year: Year, geocodes: GeocodeSpec) -> Self {
        Self {
            data_type,
            perspective: Perspective::default(),
            job_type: JobType::default(),
            subset_type: String::new(),
            state_code: "tx".to_string(),
            year,
            geocodes,
        }
    }

    pub fn perspective(mut self, perspective: Perspective) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn job_type(mut self, job_type: JobType) -> Self {
        self.job_type = job_type;
        self
    }

    pub fn subset_type(mut self, subset_type: impl Into<String>) -> Self {
        self.subset_type = subset_type.into();
        self
    }

    pub fn state_code(mut self, state_code: impl Into<String>) -> Self {
        self.state_code = state_code.into();
        self
    }
}

/// Column that carries the geocode a request filters on.
pub fn geocode_column(data_type: DataType, perspective: Perspective) -> &'static str {
    match (data_type, perspective) {
        (DataType::Wac, _) | (DataType::Od, Perspective::Work) => "w_geocode",
        (DataType::Rac, _) | (DataType::Od, Perspective::Home) => "h_geocode",
    }
}

/// A resolved query against one indexed fact table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodesQuery {
    table: LodesTableName,
    index: String,
    geocode_column: &'static str,
    geocodes: GeocodeSet,
}

impl LodesQuery {
    pub fn table(&self) -> &LodesTableName {
        &self.table
    }

    pub fn table_name(&self) -> String {
        self.table.to_string()
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn geocode_column(&self) -> &'static str {
        self.geocode_column
    }

    pub fn geocodes(&self) -> &GeocodeSet {
        &self.geocodes
    }

    /// The query as SQL with the geocodes inlined as literals.
    pub fn to_sql(&self) -> String {
        format!(
            "SELECT * from {} indexed by {} WHERE {} IN {};",
            self.table,
            self.index,
            self.geocode_column,
            self.geocodes.to_sql_literal()
        )
    }

    /// Executable statements with the geocodes bound as parameters, split so
    /// no statement binds more than `MAX_BOUND_GEOCODES` values. Always at
    /// least one statement, so an empty set still hits the table.
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        let values = self.geocodes.distinct_values();
        if values.is_empty() {
            return vec![(self.parameterized_sql(0), Vec::new())];
        }
        values
            .chunks(MAX_BOUND_GEOCODES)
            .map(|chunk| {
                (
                    self.parameterized_sql(chunk.len()),
                    chunk.iter().cloned().map(Value::Text).collect(),
                )
            })
            .collect()
    }

    fn parameterized_sql(&self, count: usize) -> String {
        format!(
            "SELECT * FROM {} INDEXED BY {} WHERE {} IN {};",
            self.table,
            self.index,
            self.geocode_column,
            placeholders(1, count)
        )
    }
}

impl fmt::Display for LodesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Map a semantic request onto a query against the matching indexed table.
pub fn generate_query(request: &QueryRequest) -> Result<LodesQuery> {
    let geocodes = request.geocodes.normalize()?.ok_or_else(|| {
        LodesError::input("'all' geocodes are only accepted when fetching geometries")
    })?;

    let job_code = request.job_type.code();
    if let JobType::Other(code) = &request.job_type {
        tracing::warn!(job_type = %code, "Building query with non-standard job_type");
    }
    if !is_token(job_code) {
        return Err(LodesError::input(format!("invalid job_type '{job_code}'")));
    }

    let subset = request.subset_type.trim();
    if !subset.is_empty() {
        if !is_token(subset) {
            return Err(LodesError::input(format!(
                "invalid subset_type '{subset}'; expected an alphanumeric code such as SA01"
            )));
        }
        if request.data_type == DataType::Od {
            tracing::warn!(
                subset_type = %subset,
                "od tables have no workforce subsets; using the main segment"
            );
        } else {
            tracing::warn!(subset_type = %subset, "Building query with explicit subset_type");
        }
    }
    let segment = match (request.data_type, subset) {
        (DataType::Od, _) => "main",
        (_, "") => DEFAULT_SUBSET,
        (_, subset) => subset,
    };

    let table = LodesTableName::new(
        &request.state_code,
        request.data_type,
        segment,
        job_code,
        request.year,
    )?;
    let geocode_column = geocode_column(request.data_type, request.perspective);
    let index = table.index_name(geocode_column);

    let query = LodesQuery {
        table,
        index,
        geocode_column,
        geocodes,
    };
    tracing::debug!(
        table = %query.table,
        index = %query.index,
        geocodes = query.geocodes.len(),
        "Generated LODES query"
    );
    Ok(query)
}
