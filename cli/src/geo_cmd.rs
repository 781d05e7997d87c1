//! `lodes intersect` and `lodes geometries`

use crate::Session;
use crate::output::{OutputFormat, render_geo_table};
use crate::query_cmd::geocode_spec;
use clap::Parser;
use lodes_core::geometry::parse_wkt;
use lodes_core::{
    Crs, GeoRecord, GeoTable, GeocodeSpec, GeometryType, IntersectionOptions, Year,
    id_intersections, pull_geometries, transform_to_wkt,
};

/// Arguments for `lodes intersect`
#[derive(Debug, Parser)]
pub struct IntersectArgs {
    /// Polygon of interest as WKT
    #[arg(long, value_name = "WKT")]
    pub wkt: String,

    /// EPSG code of the input polygon; reprojected to 4326 before the lookup
    #[arg(long, value_name = "EPSG", default_value_t = 4326)]
    pub crs: u32,

    /// Match geographies whose centroid falls in the polygon
    #[arg(long)]
    pub centroid: bool,

    /// Include each geography's geometry as WKT
    #[arg(long = "with-geometry")]
    pub with_geometry: bool,

    /// blocks, zcta or tracts
    #[arg(long = "geometry-type", default_value = "blocks")]
    pub geometry_type: String,

    /// Geometry vintage (default from config)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,
}

/// Arguments for `lodes geometries`
#[derive(Debug, Parser)]
pub struct GeometriesArgs {
    /// Geocode to fetch; repeat for several. A lone `all` means every geometry.
    #[arg(
        long = "geocode",
        value_name = "GEOCODE",
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub geocodes: Vec<String>,

    /// Fetch every geometry in the table
    #[arg(long)]
    pub all: bool,

    /// blocks, zcta or tracts
    #[arg(long = "geometry-type", default_value = "blocks")]
    pub geometry_type: String,

    /// Geometry vintage (default from config)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    /// EPSG code for the returned geometries
    #[arg(long = "out-crs", value_name = "EPSG", default_value_t = 4326)]
    pub out_crs: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,
}

fn geometry_year(year: Option<&str>, session: &Session) -> lodes_core::Result<Year> {
    match year {
        Some(year) => Year::coerce(year),
        None => session.cfg.geometry_year(),
    }
}

/// Input polygon as EPSG:4326 WKT.
fn interchange_wkt(wkt: &str, crs: Crs) -> lodes_core::Result<String> {
    if crs == Crs::INTERCHANGE {
        return Ok(wkt.to_string());
    }
    let input = GeoTable::new(crs, vec![GeoRecord::new("input", parse_wkt(wkt)?)]);
    let mut wkts = transform_to_wkt(&input, Crs::INTERCHANGE)?;
    Ok(wkts.pop().unwrap_or_default())
}

pub fn run_intersect(args: IntersectArgs, session: &Session) -> lodes_core::Result<String> {
    let options = IntersectionOptions::default()
        .centroid(args.centroid)
        .return_geometry(args.with_geometry)
        .geometry_type(GeometryType::parse(&args.geometry_type)?)
        .year(geometry_year(args.year.as_deref(), session)?);
    let polygon = interchange_wkt(&args.wkt, Crs::from_epsg(args.crs)?)?;

    let result = id_intersections(&polygon, session.source()?, &options)?;
    Ok(render_geo_table(&result, args.format))
}

/// `--all`, or a lone `--geocode all`, lifts the geocode filter.
fn geometry_spec(all: bool, geocodes: &[String]) -> GeocodeSpec {
    match geocodes {
        _ if all => GeocodeSpec::All,
        [single] if single.trim().eq_ignore_ascii_case("all") => GeocodeSpec::All,
        values => geocode_spec(values),
    }
}

pub fn run_geometries(args: GeometriesArgs, session: &Session) -> lodes_core::Result<String> {
    let spec = geometry_spec(args.all, &args.geocodes);
    let geometry_type = GeometryType::parse(&args.geometry_type)?;
    let year = geometry_year(args.year.as_deref(), session)?;
    let target = Crs::from_epsg(args.out_crs)?;

    let result = pull_geometries(&spec, session.source()?, geometry_type, year)?.to_crs(target)?;
    Ok(render_geo_table(&result, args.format))
}
