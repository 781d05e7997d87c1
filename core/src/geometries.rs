//! Stored geometry lookup by geocode

use crate::connection::{DbSource, LodesDb};
use crate::errors::Result;
use crate::geocodes::{GeocodeSpec, placeholders};
use crate::geometry::GeoTable;
use crate::intersect::records_from_rows;
use crate::naming::{GeometryTable, GeometryType, Year};
use crate::query::MAX_BOUND_GEOCODES;
use crate::table::Value;

impl LodesDb {
    /// Geometries for `geocodes` from the `{geometry_type}_{year}_geom` table.
    pub fn geometries(
        &self,
        geocodes: &GeocodeSpec,
        geometry_type: GeometryType,
        year: Year,
    ) -> Result<GeoTable> {
        let table = GeometryTable::new(geometry_type, year);
        let name = table.name();
        let select = format!(
            "SELECT {col} AS geocode, AsText({geom}) AS wkt_geom FROM {name}",
            col = table.geocode_column(),
            geom = GeometryTable::GEOMETRY_COLUMN,
        );

        let mut records = Vec::new();
        match geocodes.normalize()? {
            None => {
                // Full scan; an index cannot serve a query with no predicate.
                let rows = self.select(&format!("{select};"), &[], Some(&name))?;
                records.extend(records_from_rows(&rows, true)?);
            }
            Some(set) => {
                let values = set.distinct_values();
                let chunks: Vec<&[String]> = if values.is_empty() {
                    vec![&[] as &[String]]
                } else {
                    values.chunks(MAX_BOUND_GEOCODES).collect()
                };
                for chunk in chunks {
                    let sql = format!(
                        "{select} INDEXED BY {index} WHERE {col} IN {marks};",
                        index = table.index_name(),
                        col = table.geocode_column(),
                        marks = placeholders(1, chunk.len()),
                    );
                    let params: Vec<Value> = chunk.iter().cloned().map(Value::Text).collect();
                    let rows = self.select(&sql, &params, Some(&name))?;
                    records.extend(records_from_rows(&rows, true)?);
                }
            }
        }

        tracing::info!(table = %name, records = records.len(), "Fetched geometries");
        Ok(GeoTable::interchange(records))
    }
}

/// Fetch stored geometries for a geocode set, or for every geography with
/// `GeocodeSpec::All`. Geometries come back in EPSG:4326.
pub fn pull_geometries(
    geocodes: &GeocodeSpec,
    source: DbSource<'_>,
    geometry_type: GeometryType,
    year: Year,
) -> Result<GeoTable> {
    source.with_db(|db| db.geometries(geocodes, geometry_type, year))
}
