//! Portable spatial SQL functions
//!
//! Registers the slice of the SpatiaLite function surface the resolver and
//! geometry fetch use, backed by `geo`. Geometry columns hold WKT text under
//! this backend. Results follow SpatiaLite conventions: constructors return
//! NULL for unparseable input and `ST_Intersects` returns -1 when either
//! argument is not a geometry.

use crate::geometry::{parse_wkt, to_wkt};
use geo::{Centroid, Intersects};
use geo_types::Geometry;
use rusqlite::Connection;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;

/// Register every builtin spatial function on `conn`.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function("ST_GeomFromText", 1, flags, geom_from_text)?;
    conn.create_scalar_function("ST_GeomFromText", 2, flags, geom_from_text)?;
    conn.create_scalar_function("GeomFromText", 1, flags, geom_from_text)?;
    conn.create_scalar_function("GeomFromText", 2, flags, geom_from_text)?;
    conn.create_scalar_function("ST_Intersects", 2, flags, intersects)?;
    conn.create_scalar_function("Intersects", 2, flags, intersects)?;
    conn.create_scalar_function("ST_Centroid", 1, flags, centroid)?;
    conn.create_scalar_function("Centroid", 1, flags, centroid)?;
    conn.create_scalar_function("ST_AsText", 1, flags, as_text)?;
    conn.create_scalar_function("AsText", 1, flags, as_text)?;
    tracing::debug!("Registered builtin spatial functions");
    Ok(())
}

/// Argument `idx` as a geometry; `Ok(None)` for NULL or unparseable text.
fn geometry_arg(ctx: &Context<'_>, idx: usize) -> rusqlite::Result<Option<Geometry<f64>>> {
    match ctx.get_raw(idx) {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            Ok(parse_wkt(text).ok())
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::UserFunctionError(
            "builtin spatial backend expects WKT text geometries, found a blob; \
             open SpatiaLite-built databases with the spatialite backend"
                .into(),
        )),
        ValueRef::Integer(_) | ValueRef::Real(_) => Ok(None),
    }
}

fn geom_from_text(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    Ok(geometry_arg(ctx, 0)?.map(|g| to_wkt(&g)))
}

fn intersects(ctx: &Context<'_>) -> rusqlite::Result<i64> {
    match (geometry_arg(ctx, 0)?, geometry_arg(ctx, 1)?) {
        (Some(a), Some(b)) => Ok(i64::from(a.intersects(&b))),
        _ => Ok(-1),
    }
}

fn centroid(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    Ok(geometry_arg(ctx, 0)?
        .and_then(|g| g.centroid())
        .map(|p| to_wkt(&Geometry::Point(p))))
}

fn as_text(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    Ok(geometry_arg(ctx, 0)?.map(|g| to_wkt(&g)))
}
