//! LODES error types
//!
//! Every failure is returned to the caller as a `LodesError`; a zero-row
//! result is a valid `Table`, never an error.

use thiserror::Error;

/// Error category for structured logging and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid parameter value or geocode shape
    InputError,
    /// Database file missing, spatial extension failed to load
    ConnectionError,
    /// Generated query names a table absent from the schema
    TableNotFoundError,
    /// Execution failed for a reason other than a missing table
    QueryExecutionError,
    /// Stored or projected geometry could not be handled
    GeometryError,
    /// `lodes.toml` or env misconfigured
    ConfigError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputError => "INPUT_ERROR",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::TableNotFoundError => "TABLE_NOT_FOUND",
            Self::QueryExecutionError => "QUERY_EXECUTION_ERROR",
            Self::GeometryError => "GEOMETRY_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Whether the caller can fix this by changing its parameters
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self,
            Self::InputError | Self::ConfigError | Self::TableNotFoundError
        )
    }
}

/// LODES error with category and context
#[derive(Debug, Error)]
pub enum LodesError {
    #[error("input error: {message}")]
    Input { message: String },

    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("table `{table}` does not exist in database; check year, state and job type (query: {query})")]
    TableNotFound { table: String, query: String },

    #[error("query execution failed: {message} (query: {query})")]
    QueryExecution {
        message: String,
        query: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("geometry error: {message}")]
    Geometry { message: String },

    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LodesError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input { .. } => ErrorCategory::InputError,
            Self::Connection { .. } => ErrorCategory::ConnectionError,
            Self::TableNotFound { .. } => ErrorCategory::TableNotFoundError,
            Self::QueryExecution { .. } => ErrorCategory::QueryExecutionError,
            Self::Geometry { .. } => ErrorCategory::GeometryError,
            Self::Config { .. } => ErrorCategory::ConfigError,
        }
    }

    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a table-not-found error
    pub fn table_not_found(table: impl Into<String>, query: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
            query: query.into(),
        }
    }

    /// Create a query execution error with source
    pub fn query_with_source(
        query: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::QueryExecution {
            message: source.to_string(),
            query: query.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a geometry error
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The table an error refers to, when known
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::TableNotFound { table, .. } => Some(table),
            _ => None,
        }
    }

    /// The SQL text an error refers to, when known
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::TableNotFound { query, .. } | Self::QueryExecution { query, .. } => Some(query),
            _ => None,
        }
    }
}

/// Result type for LODES operations
pub type Result<T> = std::result::Result<T, LodesError>;
