//! Coordinate reference systems
//!
//! A [`Crs`] is an EPSG code known to the bundled EPSG registry. Transforms
//! are built from the registry's proj4 definitions and run through
//! `proj4rs`, so any projected or geographic system the registry carries can
//! be read or written.

use crate::errors::{LodesError, Result};
use proj4rs::Proj;
use std::fmt;

/// Coordinate reference system, identified by EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// EPSG:4326, longitude/latitude degrees
    pub const WGS84: Crs = Crs { epsg: 4326 };
    /// EPSG:4269, NAD83 longitude/latitude degrees
    pub const NAD83: Crs = Crs { epsg: 4269 };
    /// EPSG:3857
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };
    /// The interchange CRS for every stored and returned geometry.
    pub const INTERCHANGE: Crs = Crs::WGS84;

    pub fn from_epsg(code: u32) -> Result<Self> {
        u16::try_from(code)
            .ok()
            .filter(|epsg| crs_definitions::from_code(*epsg).is_some())
            .map(|epsg| Self { epsg })
            .ok_or_else(|| LodesError::input(format!("unknown CRS EPSG:{code}")))
    }

    pub fn epsg(self) -> u32 {
        u32::from(self.epsg)
    }

    fn proj4(self) -> Result<&'static str> {
        crs_definitions::from_code(self.epsg)
            .map(|def| def.proj4)
            .ok_or_else(|| LodesError::input(format!("unknown CRS {self}")))
    }

    /// Whether coordinates are longitude/latitude degrees.
    pub fn is_geographic(self) -> Result<bool> {
        Ok(self.proj4()?.contains("+proj=longlat"))
    }

    /// Build a reusable transform from `self` into `target`.
    pub fn transformer(self, target: Crs) -> Result<Transformer> {
        if self == target {
            return Ok(Transformer {
                from: self,
                to: target,
                steps: None,
            });
        }
        Ok(Transformer {
            from: self,
            to: target,
            steps: Some(Steps {
                source: Endpoint::new(self)?,
                target: Endpoint::new(target)?,
            }),
        })
    }

    /// (longitude, latitude) degrees → coordinates in `self`.
    pub fn project(self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        Crs::WGS84.transformer(self)?.apply(lon, lat)
    }

    /// Coordinates in `self` → (longitude, latitude) degrees.
    pub fn unproject(self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.transformer(Crs::WGS84)?.apply(x, y)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::INTERCHANGE
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

struct Endpoint {
    proj: Proj,
    /// proj4rs works in radians for geographic systems
    geographic: bool,
}

impl Endpoint {
    fn new(crs: Crs) -> Result<Self> {
        let definition = crs.proj4()?;
        let proj = Proj::from_proj_string(definition)
            .map_err(|e| LodesError::input(format!("cannot use {crs}: {e}")))?;
        Ok(Self {
            proj,
            geographic: definition.contains("+proj=longlat"),
        })
    }
}

struct Steps {
    source: Endpoint,
    target: Endpoint,
}

/// A prepared transform between two systems
pub struct Transformer {
    from: Crs,
    to: Crs,
    steps: Option<Steps>,
}

impl Transformer {
    pub fn source(&self) -> Crs {
        self.from
    }

    pub fn target(&self) -> Crs {
        self.to
    }

    /// Move one coordinate. Positions with no finite image are errors.
    pub fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let Some(steps) = &self.steps else {
            return Ok((x, y));
        };
        let mut point = if steps.source.geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        proj4rs::transform::transform(&steps.source.proj, &steps.target.proj, &mut point)
            .map_err(|e| {
                LodesError::geometry(format!(
                    "cannot move ({x}, {y}) from {} to {}: {e}",
                    self.from, self.to
                ))
            })?;
        let (out_x, out_y) = if steps.target.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        if out_x.is_finite() && out_y.is_finite() {
            Ok((out_x, out_y))
        } else {
            Err(LodesError::geometry(format!(
                "coordinate ({x}, {y}) has no finite position in {}",
                self.to
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn crs(code: u32) -> Crs {
        Crs::from_epsg(code).expect("known epsg")
    }

    #[test]
    fn state_plane_origin_maps_to_false_origin() {
        let (x, y) = crs(2278).project(-99.0, 27.0 + 50.0 / 60.0).expect("project");
        assert!(close(x, 1_968_500.0, 1e-2), "x = {x}");
        assert!(close(y, 13_123_333.333, 1e-2), "y = {y}");
    }

    #[test]
    fn state_plane_inverts_near_houston() {
        let south_central = crs(2278);
        let (x, y) = south_central.project(-95.3698, 29.7604).expect("project");
        // Downtown Houston sits around 3.12M ftE, 13.84M ftN in 2278.
        assert!(close(x, 3_120_000.0, 20_000.0), "x = {x}");
        assert!(close(y, 13_840_000.0, 20_000.0), "y = {y}");
        let (lon, lat) = south_central.unproject(x, y).expect("unproject");
        assert!(close(lon, -95.3698, 1e-7), "lon = {lon}");
        assert!(close(lat, 29.7604, 1e-7), "lat = {lat}");
    }

    #[test]
    fn web_mercator_known_point() {
        let (x, y) = Crs::WEB_MERCATOR.project(90.0, 0.0).expect("project");
        assert!(close(x, 10_018_754.171_394_622, 1e-3), "x = {x}");
        assert!(close(y, 0.0, 1e-3), "y = {y}");
        let (lon, lat) = Crs::WEB_MERCATOR
            .unproject(-10_616_000.0, 3_470_000.0)
            .expect("unproject");
        let (x2, y2) = Crs::WEB_MERCATOR.project(lon, lat).expect("project");
        assert!(close(x2, -10_616_000.0, 1e-3) && close(y2, 3_470_000.0, 1e-3));
    }

    #[test]
    fn utm_and_albers_round_trip() {
        let utm = crs(32615);
        let (x, y) = utm.project(-95.3698, 29.7604).expect("utm");
        // West of the zone 15 central meridian (-93).
        assert!((200_000.0..300_000.0).contains(&x), "x = {x}");
        assert!((3_250_000.0..3_350_000.0).contains(&y), "y = {y}");

        for code in [32614, 32615, 5070] {
            let system = crs(code);
            let (x, y) = system.project(-95.3698, 29.7604).expect("project");
            let (lon, lat) = system.unproject(x, y).expect("unproject");
            assert!(close(lon, -95.3698, 1e-7), "EPSG:{code} lon = {lon}");
            assert!(close(lat, 29.7604, 1e-7), "EPSG:{code} lat = {lat}");
        }
    }

    #[test]
    fn prepared_transform_between_projected_systems() {
        let to_utm = crs(2278).transformer(crs(32615)).expect("transformer");
        assert_eq!(to_utm.source().epsg(), 2278);
        assert_eq!(to_utm.target().to_string(), "EPSG:32615");
        let (x, y) = crs(2278).project(-95.3698, 29.7604).expect("2278");
        let (ux, uy) = to_utm.apply(x, y).expect("apply");
        let (lon, lat) = crs(32615).unproject(ux, uy).expect("utm");
        assert!(close(lon, -95.3698, 1e-7) && close(lat, 29.7604, 1e-7));
    }

    #[test]
    fn geographic_systems_are_flagged() {
        assert!(Crs::WGS84.is_geographic().expect("4326"));
        assert!(Crs::NAD83.is_geographic().expect("4269"));
        assert!(!Crs::WEB_MERCATOR.is_geographic().expect("3857"));
    }

    #[test]
    fn unknown_epsg_is_input_error() {
        for code in [1, 99_999, 70_000] {
            let err = Crs::from_epsg(code).expect_err("unknown code");
            assert_eq!(err.category(), crate::ErrorCategory::InputError);
        }
        assert_eq!(Crs::default().to_string(), "EPSG:4326");
    }
}
