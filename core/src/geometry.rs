//! Spatial record sets and the WKT projection helper

use crate::errors::{LodesError, Result};
use crate::projection::{Crs, Transformer};
use geo::MapCoords;
use geo_types::{Coord, Geometry};
use std::str::FromStr;
use wkt::ToWkt;

/// Parse WKT into a geo-types geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::<f64>::from_str(text)
        .map_err(|e| LodesError::input(format!("invalid WKT: {e}")))
        .and_then(|w| {
            Geometry::try_from(w).map_err(|e: wkt::conversion::Error| {
                LodesError::input(format!("unsupported WKT geometry: {e:?}"))
            })
        })
}

/// Serialize a geometry as WKT.
pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

/// Reproject a single geometry.
pub fn reproject(geometry: &Geometry<f64>, from: Crs, to: Crs) -> Result<Geometry<f64>> {
    reproject_with(geometry, &from.transformer(to)?)
}

fn reproject_with(geometry: &Geometry<f64>, transformer: &Transformer) -> Result<Geometry<f64>> {
    if transformer.source() == transformer.target() {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|c| {
        let (x, y) = transformer.apply(c.x, c.y)?;
        Ok(Coord { x, y })
    })
}

/// One geography: its geocode and, when requested, its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub geocode: String,
    pub geometry: Option<Geometry<f64>>,
}

impl GeoRecord {
    pub fn new(geocode: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self {
            geocode: geocode.into(),
            geometry: Some(geometry),
        }
    }

    pub fn without_geometry(geocode: impl Into<String>) -> Self {
        Self {
            geocode: geocode.into(),
            geometry: None,
        }
    }
}

/// Spatial record set with an explicit CRS
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    crs: Crs,
    records: Vec<GeoRecord>,
}

impl GeoTable {
    pub fn new(crs: Crs, records: Vec<GeoRecord>) -> Self {
        Self { crs, records }
    }

    /// Records read back from the database, always EPSG:4326.
    pub fn interchange(records: Vec<GeoRecord>) -> Self {
        Self::new(Crs::INTERCHANGE, records)
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn records(&self) -> &[GeoRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<GeoRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn geocodes(&self) -> Vec<String> {
        self.records.iter().map(|r| r.geocode.clone()).collect()
    }

    /// Reproject every geometry into `target`.
    pub fn to_crs(&self, target: Crs) -> Result<Self> {
        let transformer = self.crs.transformer(target)?;
        let records = self
            .records
            .iter()
            .map(|r| {
                Ok(GeoRecord {
                    geocode: r.geocode.clone(),
                    geometry: r
                        .geometry
                        .as_ref()
                        .map(|g| reproject_with(g, &transformer))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(target, records))
    }
}

/// Reproject every geometry of `table` into `target` and serialize each as
/// WKT, one string per record in record order.
pub fn transform_to_wkt(table: &GeoTable, target: Crs) -> Result<Vec<String>> {
    let transformer = table.crs().transformer(target)?;
    table
        .records()
        .iter()
        .map(|record| {
            let geometry = record.geometry.as_ref().ok_or_else(|| {
                LodesError::input(format!("record '{}' has no geometry", record.geocode))
            })?;
            Ok(to_wkt(&reproject_with(geometry, &transformer)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::BoundingRect;
    use geo_types::polygon;

    #[test]
    fn transform_preserves_order_and_reprojects() {
        let (x0, y0) = Crs::WEB_MERCATOR.project(-95.40, 29.70).expect("project");
        let (x1, y1) = Crs::WEB_MERCATOR.project(-95.38, 29.72).expect("project");
        let square: Geometry<f64> = polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]
        .into();
        let table = GeoTable::new(
            Crs::WEB_MERCATOR,
            vec![
                GeoRecord::new("a", square.clone()),
                GeoRecord::new("b", geo_types::Point::new(x0, y0).into()),
            ],
        );

        let wkts = transform_to_wkt(&table, Crs::WGS84).expect("transform");
        assert_eq!(wkts.len(), 2);
        assert!(wkts[0].starts_with("POLYGON"));
        assert!(wkts[1].starts_with("POINT"));

        let rect = parse_wkt(&wkts[0])
            .expect("parse")
            .bounding_rect()
            .expect("rect");
        assert!((rect.min().x - -95.40).abs() < 1e-8);
        assert!((rect.max().y - 29.72).abs() < 1e-8);
    }

    #[test]
    fn record_without_geometry_is_input_error() {
        let table = GeoTable::interchange(vec![GeoRecord::without_geometry("480019501001010")]);
        let err = transform_to_wkt(&table, Crs::WGS84).expect_err("no geometry");
        assert_eq!(err.category(), crate::ErrorCategory::InputError);
    }

    #[test]
    fn utm_polygon_lands_in_degrees() {
        let utm = Crs::from_epsg(32615).expect("utm");
        let (x0, y0) = utm.project(-95.40, 29.70).expect("project");
        let (x1, y1) = utm.project(-95.38, 29.72).expect("project");
        let table = GeoTable::new(
            utm,
            vec![GeoRecord::new(
                "aoi",
                polygon![
                    (x: x0, y: y0),
                    (x: x1, y: y0),
                    (x: x1, y: y1),
                    (x: x0, y: y1),
                    (x: x0, y: y0),
                ]
                .into(),
            )],
        );

        let back = table.to_crs(Crs::INTERCHANGE).expect("to_crs");
        assert_eq!(back.crs(), Crs::WGS84);
        let rect = back.records()[0]
            .geometry
            .as_ref()
            .and_then(BoundingRect::bounding_rect)
            .expect("rect");
        assert!(rect.min().x > -95.41 && rect.max().x < -95.37, "{rect:?}");
        assert!(rect.min().y > 29.69 && rect.max().y < 29.73, "{rect:?}");
    }

    #[test]
    fn invalid_wkt_is_input_error() {
        assert!(parse_wkt("POLYGON((0 0, 1 0").is_err());
        assert!(parse_wkt("MULTIPOLYGON(((0 0,1 0,1 1,0 0)))").is_ok());
    }
}
