//! LODES query generation and spatial joins
//!
//! Maps semantic requests (data type, perspective, job type, subset, state,
//! year, geocodes) onto indexed queries against a partitioned LODES SQLite
//! database, and resolves arbitrary EPSG:4326 polygons into census geocodes
//! through the database's spatial index so they can feed those queries.
//!
//! Typical flow: reproject a polygon with [`transform_to_wkt`], resolve it
//! with [`id_intersections`], turn the result into a [`GeocodeSpec`], build a
//! query with [`generate_query`] and run it with [`pull_data`].

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod catalog;
pub mod config;
pub mod connection;
pub mod errors;
pub mod fetch;
pub mod geocodes;
pub mod geometries;
pub mod geometry;
pub mod intersect;
pub mod naming;
pub mod projection;
pub mod query;
pub mod remap;
pub mod rollup;
pub mod spatial_functions;
pub mod table;

pub use config::{LodesConfig, SpatialBackend};
pub use connection::{ConnectOptions, DbSource, LodesDb};
pub use errors::{ErrorCategory, LodesError, Result};
pub use fetch::{pull_data, pull_sql};
pub use geocodes::{GeocodeSet, GeocodeSpec};
pub use geometries::pull_geometries;
pub use geometry::{GeoRecord, GeoTable, transform_to_wkt};
pub use intersect::{IntersectionOptions, id_intersections};
pub use naming::{
    DataType, GeometryTable, GeometryType, JobType, LodesTableName, Perspective, Year,
};
pub use projection::{Crs, Transformer};
pub use query::{LodesQuery, QueryRequest, generate_query};
pub use remap::retype;
pub use rollup::{GeoLevel, sum_by};
pub use table::{Table, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
