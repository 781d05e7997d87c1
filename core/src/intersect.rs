//! Polygon to geography resolution through the spatial index
//!
//! Two stages: the R*Tree narrows candidates to rows whose bounding box
//! overlaps the polygon's, then `ST_Intersects` tests each candidate exactly.
//! The prefilter always uses full-geometry boxes; in centroid mode the exact
//! test runs against `ST_Centroid(geom)`, which always lies inside that box.

use crate::config::SpatialBackend;
use crate::connection::{DbSource, LodesDb};
use crate::errors::{LodesError, Result};
use crate::geometry::{GeoRecord, GeoTable, parse_wkt};
use crate::naming::{GeometryTable, GeometryType, Year};
use crate::table::{Table, Value, value_to_text};
use geo::BoundingRect;
use geo_types::Rect;

/// Options for `id_intersections`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionOptions {
    /// Test each geography's centroid instead of its polygon
    pub centroid: bool,
    /// Carry the stored geometry on each record
    pub return_geometry: bool,
    pub geometry_type: GeometryType,
    pub year: Year,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self {
            centroid: false,
            return_geometry: false,
            geometry_type: GeometryType::Blocks,
            year: Year::CENSUS_2020,
        }
    }
}

impl IntersectionOptions {
    pub fn centroid(mut self, centroid: bool) -> Self {
        self.centroid = centroid;
        self
    }

    pub fn return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }

    pub fn geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = geometry_type;
        self
    }

    pub fn year(mut self, year: Year) -> Self {
        self.year = year;
        self
    }
}

impl LodesDb {
    /// Geographies intersecting `polygon_wkt` (EPSG:4326).
    pub fn intersections(&self, polygon_wkt: &str, options: &IntersectionOptions) -> Result<GeoTable> {
        let polygon = parse_wkt(polygon_wkt)?;
        let Some(bbox) = polygon.bounding_rect() else {
            tracing::debug!("Empty polygon; no intersections");
            return Ok(GeoTable::interchange(Vec::new()));
        };

        let geo_table = GeometryTable::new(options.geometry_type, options.year);
        let sql = intersection_sql(&geo_table, self.backend(), options);
        let params = prefilter_params(polygon_wkt, &geo_table, self.backend(), &bbox);

        let rows = self.select(&sql, &params, Some(&geo_table.name()))?;
        let result = GeoTable::interchange(records_from_rows(&rows, options.return_geometry)?);
        tracing::info!(
            table = %geo_table.name(),
            centroid = options.centroid,
            matches = result.len(),
            "Resolved polygon intersections"
        );
        Ok(result)
    }
}

/// Resolve a polygon into the geographies of one geometry table that
/// intersect it. No matches is an empty `GeoTable`.
pub fn id_intersections(
    polygon_wkt: &str,
    source: DbSource<'_>,
    options: &IntersectionOptions,
) -> Result<GeoTable> {
    source.with_db(|db| db.intersections(polygon_wkt, options))
}

fn intersection_sql(
    table: &GeometryTable,
    backend: SpatialBackend,
    options: &IntersectionOptions,
) -> String {
    let geom = GeometryTable::GEOMETRY_COLUMN;
    let target = if options.centroid {
        format!("ST_Centroid({geom})")
    } else {
        geom.to_string()
    };
    let select_geometry = if options.return_geometry {
        format!(", ST_AsText({geom}) AS wkt_geom")
    } else {
        String::new()
    };
    let prefilter = match backend {
        SpatialBackend::Spatialite => format!(
            "SELECT ROWID FROM SpatialIndex WHERE f_table_name = ?2 \
             AND f_geometry_column = '{geom}' AND search_frame = ST_GeomFromText(?1, 4326)"
        ),
        SpatialBackend::Builtin => format!(
            "SELECT pkid FROM {} WHERE xmin <= ?2 AND xmax >= ?3 AND ymin <= ?4 AND ymax >= ?5",
            table.spatial_index_name()
        ),
    };
    format!(
        "SELECT {col} AS geocode{select_geometry} FROM {name} \
         WHERE ST_Intersects({target}, ST_GeomFromText(?1, 4326)) = 1 \
         AND ROWID IN ({prefilter});",
        col = table.geocode_column(),
        name = table.name(),
    )
}

fn prefilter_params(
    polygon_wkt: &str,
    table: &GeometryTable,
    backend: SpatialBackend,
    bbox: &Rect<f64>,
) -> Vec<Value> {
    let polygon = Value::Text(polygon_wkt.to_string());
    match backend {
        SpatialBackend::Spatialite => vec![polygon, Value::Text(table.name())],
        SpatialBackend::Builtin => vec![
            polygon,
            Value::Real(bbox.max().x),
            Value::Real(bbox.min().x),
            Value::Real(bbox.max().y),
            Value::Real(bbox.min().y),
        ],
    }
}

/// Build records from a `geocode[, wkt_geom]` result.
pub(crate) fn records_from_rows(rows: &Table, with_geometry: bool) -> Result<Vec<GeoRecord>> {
    rows.rows()
        .iter()
        .map(|row| {
            let geocode = value_to_text(&row[0])
                .ok_or_else(|| LodesError::geometry("geography row has a null geocode"))?;
            if !with_geometry {
                return Ok(GeoRecord::without_geometry(geocode));
            }
            let wkt = match &row[1] {
                Value::Text(text) => text,
                other => {
                    return Err(LodesError::geometry(format!(
                        "geometry for '{geocode}' is not WKT text: {other:?}"
                    )));
                }
            };
            let geometry = parse_wkt(wkt).map_err(|e| {
                LodesError::geometry(format!("stored geometry for '{geocode}' is invalid: {e}"))
            })?;
            Ok(GeoRecord::new(geocode, geometry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_sql_reads_the_rtree_directly() {
        let options = IntersectionOptions::default().centroid(true);
        let table = GeometryTable::new(options.geometry_type, options.year);
        assert_eq!(
            intersection_sql(&table, SpatialBackend::Builtin, &options),
            "SELECT geocode AS geocode FROM blocks_2020_geom \
             WHERE ST_Intersects(ST_Centroid(geom), ST_GeomFromText(?1, 4326)) = 1 \
             AND ROWID IN (SELECT pkid FROM idx_blocks_2020_geom_geom \
             WHERE xmin <= ?2 AND xmax >= ?3 AND ymin <= ?4 AND ymax >= ?5);"
        );
    }

    #[test]
    fn spatialite_sql_uses_spatial_index_table() {
        let options = IntersectionOptions::default()
            .return_geometry(true)
            .geometry_type(GeometryType::Zcta);
        let table = GeometryTable::new(options.geometry_type, options.year);
        let sql = intersection_sql(&table, SpatialBackend::Spatialite, &options);
        assert!(sql.starts_with("SELECT GEOID20 AS geocode, ST_AsText(geom) AS wkt_geom FROM zcta_2020_geom"));
        assert!(sql.contains("ST_Intersects(geom, ST_GeomFromText(?1, 4326)) = 1"));
        assert!(sql.contains("FROM SpatialIndex WHERE f_table_name = ?2"));
    }

    #[test]
    fn invalid_polygon_is_input_error_before_touching_the_db() {
        let db = LodesDb::connect_in_memory().expect("db");
        let err = db
            .intersections("POLYGON((0 0, 1 1", &IntersectionOptions::default())
            .expect_err("invalid wkt");
        assert_eq!(err.category(), crate::ErrorCategory::InputError);
    }

    #[test]
    fn missing_geometry_table_is_table_not_found() {
        let db = LodesDb::connect_in_memory().expect("db");
        let err = db
            .intersections(
                "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
                &IntersectionOptions::default(),
            )
            .expect_err("no table");
        assert_eq!(err.table(), Some("blocks_2020_geom"));
    }

    #[test]
    fn corrupt_stored_geometry_is_geometry_error() {
        let rows = Table::from_rows(
            vec!["geocode".into(), "wkt_geom".into()],
            vec![vec![Value::Text("1".into()), Value::Text("POLYGON((".into())]],
        )
        .expect("rows");
        let err = records_from_rows(&rows, true).expect_err("corrupt");
        assert_eq!(err.category(), crate::ErrorCategory::GeometryError);
    }
}
