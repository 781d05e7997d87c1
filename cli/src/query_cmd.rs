//! `lodes query`

use crate::Session;
use crate::output::{OutputFormat, render_table};
use clap::Parser;
use lodes_core::{
    DataType, GeoLevel, GeocodeSpec, JobType, Perspective, QueryRequest, Table, Year,
    generate_query, pull_data, sum_by,
};

/// Arguments for `lodes query`
#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// wac, rac or od
    #[arg(long = "data-type", value_name = "TYPE")]
    pub data_type: String,

    /// Data year, e.g. 2019
    #[arg(long, value_name = "YEAR")]
    pub year: String,

    /// Geocode to filter on; repeat for several. A single value starting
    /// with `(` is taken as a literal SQL list.
    #[arg(long = "geocode", value_name = "GEOCODE", required = true)]
    pub geocodes: Vec<String>,

    /// home or work (od only)
    #[arg(long, default_value = "home")]
    pub perspective: String,

    /// all, primary, or a raw JT code
    #[arg(long = "job-type", default_value = "all")]
    pub job_type: String,

    /// Workforce subset such as SA01 (wac/rac only; default S000)
    #[arg(long, default_value = "")]
    pub subset: String,

    /// Two-letter state code (default from config)
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,

    /// Replace LODES codes with readable column names and make counts numeric
    #[arg(long)]
    pub rename: bool,

    /// Sum counts up to state, county, tract or block-group (implies --rename)
    #[arg(long, value_name = "LEVEL")]
    pub rollup: Option<String>,

    /// Print the generated SQL instead of running it
    #[arg(long = "print-sql")]
    pub print_sql: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,
}

/// Geocode arguments as a spec: one value is a literal, several a list.
pub fn geocode_spec(values: &[String]) -> GeocodeSpec {
    match values {
        [single] => GeocodeSpec::literal(single.as_str()),
        many => GeocodeSpec::list(many.iter().cloned()),
    }
}

/// Columns that hold job counts: everything but geocodes and `createdate`.
fn count_columns(table: &Table) -> Vec<&str> {
    table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !c.contains("geocode") && *c != "createdate")
        .collect()
}

pub fn run(args: QueryArgs, session: &Session) -> lodes_core::Result<String> {
    let request = QueryRequest::new(
        DataType::parse(&args.data_type)?,
        Year::coerce(&args.year)?,
        geocode_spec(&args.geocodes),
    )
    .perspective(Perspective::parse(&args.perspective)?)
    .job_type(JobType::parse(&args.job_type)?)
    .subset_type(args.subset.as_str())
    .state_code(args.state.unwrap_or_else(|| session.cfg.default_state.clone()));
    let rollup = args.rollup.as_deref().map(GeoLevel::parse).transpose()?;

    let query = generate_query(&request)?;
    if args.print_sql {
        return Ok(format!("{query}\n"));
    }

    let table = pull_data(&query, session.source()?, args.rename || rollup.is_some())?;
    let table = match rollup {
        Some(level) => sum_by(&table, query.geocode_column(), level, &count_columns(&table))?,
        None => table,
    };
    Ok(render_table(&table, args.format))
}
