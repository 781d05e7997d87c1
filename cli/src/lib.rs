//! `lodes` command-line interface
//!
//! ## Commands
//!
//! - `lodes query --data-type rac --year 2019 --geocode <GEOCODE>...`
//! - `lodes intersect --wkt <WKT> [--centroid] [--with-geometry]`
//! - `lodes geometries --geocode <GEOCODE>... | --all`
//! - `lodes tables`
//!
//! ## Exit Codes
//!
//! - 0: Success (including empty results)
//! - 1: Invalid arguments or configuration
//! - 2: Database errors (missing file or table, failed query, bad stored geometry)

pub mod geo_cmd;
pub mod output;
pub mod query_cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lodes_core::{
    ConnectOptions, DbSource, ErrorCategory, LodesConfig, LodesDb, LodesError, SpatialBackend,
};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

pub use output::OutputFormat;

/// Query LODES employment tables and resolve polygons to census geocodes
#[derive(Debug, Parser)]
#[command(name = "lodes", version)]
pub struct LodesCli {
    /// LODES SQLite database (defaults to `db_path` from the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Spatial backend: spatialite or builtin
    #[arg(long, global = true, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Config file (defaults to $LODES_CONFIG, then ~/.config/lodes/lodes.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: LodesSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum LodesSubcommand {
    /// Generate and run a query against one LODES fact table
    Query(query_cmd::QueryArgs),

    /// Resolve a polygon into intersecting geographies
    Intersect(geo_cmd::IntersectArgs),

    /// Fetch stored geometries by geocode
    Geometries(geo_cmd::GeometriesArgs),

    /// List LODES fact tables in the database
    Tables(TablesArgs),
}

/// Arguments for `lodes tables`
#[derive(Debug, Parser)]
pub struct TablesArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,
}

/// Resolved config plus the database the command runs against
pub struct Session {
    pub cfg: LodesConfig,
    db_path: Option<PathBuf>,
    options: ConnectOptions,
}

impl Session {
    fn resolve(cli: &LodesCli) -> lodes_core::Result<Self> {
        let cfg = match &cli.config {
            Some(path) => LodesConfig::load_from_path(path)?,
            None => LodesConfig::load()?,
        };
        let mut options = ConnectOptions::from(&cfg);
        if let Some(backend) = &cli.backend {
            options.backend = SpatialBackend::from_str(backend.trim()).map_err(|_| {
                LodesError::input(format!(
                    "invalid backend '{backend}'; expected 'spatialite' or 'builtin'"
                ))
            })?;
        }
        let db_path = cli.db.clone().or_else(|| cfg.resolved_db_path());
        Ok(Self {
            cfg,
            db_path,
            options,
        })
    }

    /// Connection source for one operation.
    pub fn source(&self) -> lodes_core::Result<DbSource<'_>> {
        let path = self.db_path.as_deref().ok_or_else(|| {
            LodesError::config("no database given; pass --db or set db_path in lodes.toml")
        })?;
        Ok(DbSource::path(path, self.options.clone()))
    }
}

impl LodesCli {
    /// Run the command, writing results to stdout. Returns the exit code.
    pub fn run(self) -> i32 {
        let mut stdout = std::io::stdout().lock();
        match self.execute(&mut stdout) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("error: {err}");
                exit_code(&err)
            }
        }
    }

    pub fn execute(self, out: &mut impl Write) -> anyhow::Result<()> {
        let session = Session::resolve(&self)?;
        let rendered = match self.command {
            LodesSubcommand::Query(args) => query_cmd::run(args, &session)?,
            LodesSubcommand::Intersect(args) => geo_cmd::run_intersect(args, &session)?,
            LodesSubcommand::Geometries(args) => geo_cmd::run_geometries(args, &session)?,
            LodesSubcommand::Tables(args) => {
                let tables = session.source()?.with_db(LodesDb::list_lodes_tables)?;
                output::render_table_names(&tables, args.format)
            }
        };
        out.write_all(rendered.as_bytes())
            .context("failed to write output")?;
        Ok(())
    }
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LodesError>().map(LodesError::category) {
        Some(ErrorCategory::InputError | ErrorCategory::ConfigError) => 1,
        _ => 2,
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `-v` is given.
pub fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(exit_code(&LodesError::input("bad year").into()), 1);
        assert_eq!(exit_code(&LodesError::config("no db").into()), 1);
        assert_eq!(exit_code(&LodesError::table_not_found("t", "q").into()), 2);
        assert_eq!(exit_code(&LodesError::connection("gone").into()), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("broken pipe")), 2);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = LodesCli::try_parse_from([
            "lodes", "tables", "--db", "/tmp/x.db", "--backend", "builtin", "-v",
        ])
        .expect("parse");
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.backend.as_deref(), Some("builtin"));
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, LodesSubcommand::Tables(_)));
    }
}
