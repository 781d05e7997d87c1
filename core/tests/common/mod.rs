//! Fixture database for integration tests
//!
//! Geometry columns hold WKT text and each geometry table carries an R*Tree
//! `idx_{table}_geom`, which is what the builtin backend reads.
//!
//! Block layout (EPSG:4326), three adjacent 0.01° squares in a row plus one
//! far away:
//!
//! ```text
//!  B1 [-95.40,-95.39]  B2 [-95.39,-95.38]  B3 [-95.38,-95.37]   x 29.70..29.71
//!  B4 [-96.00,-95.99] x [30.00,30.01]
//! ```

#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use lodes_core::{ConnectOptions, LodesDb};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const B1: &str = "482011000001001";
pub const B2: &str = "482011000001002";
pub const B3: &str = "482011000001003";
pub const B4: &str = "482011000002001";
pub const TRACT: &str = "48201100000";

/// Fully contains B1 and clips the western edge of B2, missing B2's centroid.
pub const CLIP_POLYGON: (f64, f64, f64, f64) = (-95.405, 29.695, -95.388, 29.715);

pub struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> LodesDb {
        LodesDb::open(&self.path, &ConnectOptions::builtin()).expect("open fixture")
    }
}

/// WKT for an axis-aligned rectangle.
pub fn rect_wkt(minx: f64, miny: f64, maxx: f64, maxy: f64) -> String {
    format!(
        "POLYGON(({minx} {miny},{maxx} {miny},{maxx} {maxy},{minx} {maxy},{minx} {miny}))"
    )
}

fn insert_geometry(
    conn: &Connection,
    table: &str,
    columns: &str,
    geocode: &str,
    extra: &[&str],
    bbox: (f64, f64, f64, f64),
) {
    let (minx, miny, maxx, maxy) = bbox;
    let mut values = vec![geocode.to_string()];
    values.extend(extra.iter().map(|v| v.to_string()));
    values.push(rect_wkt(minx, miny, maxx, maxy));
    let marks = (1..=values.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!("INSERT INTO {table} ({columns}) VALUES ({marks})"),
        rusqlite::params_from_iter(values.iter()),
    )
    .expect("insert geometry");
    let rowid = conn.last_insert_rowid();
    conn.execute(
        &format!("INSERT INTO idx_{table}_geom (pkid, xmin, xmax, ymin, ymax) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![rowid, minx, maxx, miny, maxy],
    )
    .expect("insert rtree");
}

pub fn build() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lodes_tx.db");
    let conn = Connection::open(&path).expect("create fixture db");

    conn.execute_batch(
        "CREATE TABLE blocks_2020_geom (
             geocode TEXT, STATEFP20 TEXT, COUNTYFP20 TEXT, TRACTCE20 TEXT, geom TEXT
         );
         CREATE INDEX blocks_index ON blocks_2020_geom (geocode);
         CREATE VIRTUAL TABLE idx_blocks_2020_geom_geom USING rtree(pkid, xmin, xmax, ymin, ymax);

         CREATE TABLE tracts_2020_geom (GEOID TEXT, geom TEXT);
         CREATE INDEX tracts_index ON tracts_2020_geom (GEOID);
         CREATE VIRTUAL TABLE idx_tracts_2020_geom_geom USING rtree(pkid, xmin, xmax, ymin, ymax);

         CREATE TABLE tx_rac_S000_JT01_2019 (
             h_geocode TEXT, C000 INTEGER, CA01 INTEGER, CA02 INTEGER, CNS05 TEXT, createdate TEXT
         );
         CREATE INDEX tx_rac_S000_JT01_2019_main_index ON tx_rac_S000_JT01_2019 (h_geocode);

         CREATE TABLE tx_wac_S000_JT00_2020 (w_geocode TEXT, C000 INTEGER, CNS16 INTEGER);
         CREATE INDEX tx_wac_S000_JT00_2020_main_index ON tx_wac_S000_JT00_2020 (w_geocode);

         CREATE TABLE tx_od_main_JT00_2019 (
             w_geocode TEXT, h_geocode TEXT, S000 INTEGER, SA01 INTEGER, SE03 INTEGER
         );
         CREATE INDEX tx_od_main_JT00_2019_od_hgeocode_index ON tx_od_main_JT00_2019 (h_geocode);
         CREATE INDEX tx_od_main_JT00_2019_od_wgeocode_index ON tx_od_main_JT00_2019 (w_geocode);",
    )
    .expect("schema");

    let block_columns = "geocode, STATEFP20, COUNTYFP20, TRACTCE20, geom";
    let county = ["48", "201", "100000"];
    insert_geometry(&conn, "blocks_2020_geom", block_columns, B1, &county, (-95.40, 29.70, -95.39, 29.71));
    insert_geometry(&conn, "blocks_2020_geom", block_columns, B2, &county, (-95.39, 29.70, -95.38, 29.71));
    insert_geometry(&conn, "blocks_2020_geom", block_columns, B3, &county, (-95.38, 29.70, -95.37, 29.71));
    insert_geometry(
        &conn,
        "blocks_2020_geom",
        block_columns,
        B4,
        &["48", "201", "100000"],
        (-96.00, 30.00, -95.99, 30.01),
    );
    insert_geometry(&conn, "tracts_2020_geom", "GEOID, geom", TRACT, &[], (-95.40, 29.70, -95.37, 29.71));

    for (geocode, total, young, mid, mfrg) in [
        (B1, 30, 12, 10, "n/a"),
        (B2, 20, 5, 9, "3"),
        (B3, 10, 1, 2, "0"),
        (B4, 99, 40, 40, "7"),
    ] {
        conn.execute(
            "INSERT INTO tx_rac_S000_JT01_2019 VALUES (?1, ?2, ?3, ?4, ?5, '20230321')",
            params![geocode, total, young, mid, mfrg],
        )
        .expect("insert rac");
    }
    for (geocode, total, health) in [(B1, 100, 40), (B3, 7, 0)] {
        conn.execute(
            "INSERT INTO tx_wac_S000_JT00_2020 VALUES (?1, ?2, ?3)",
            params![geocode, total, health],
        )
        .expect("insert wac");
    }
    for (work, home, total) in [(B1, B2, 4), (B1, B3, 2), (B3, B1, 1)] {
        conn.execute(
            "INSERT INTO tx_od_main_JT00_2019 VALUES (?1, ?2, ?3, ?3, 0)",
            params![work, home, total],
        )
        .expect("insert od");
    }

    conn.close().map_err(|(_, e)| e).expect("close fixture db");
    Fixture { _dir: dir, path }
}
