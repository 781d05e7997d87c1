//! Result rendering for stdout

use clap::ValueEnum;
use lodes_core::geometry::to_wkt;
use lodes_core::table::value_to_text;
use lodes_core::{GeoTable, LodesTableName, Table, Value};
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated, header first
    #[default]
    Tsv,
    /// One JSON document
    Json,
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => json!(i),
        Value::Real(r) => json!(r),
        Value::Text(s) => json!(s),
        Value::Blob(b) => json!(format!("<{} bytes>", b.len())),
    }
}

fn tsv_line<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = cells
        .into_iter()
        .map(|c| c.as_ref().replace(['\t', '\n'], " "))
        .collect::<Vec<_>>()
        .join("\t");
    line.push('\n');
    line
}

fn pretty(value: &serde_json::Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    text
}

/// Render a fact-table result.
pub fn render_table(table: &Table, format: OutputFormat) -> String {
    match format {
        OutputFormat::Tsv => {
            let mut out = tsv_line(table.columns());
            for row in table.rows() {
                out.push_str(&tsv_line(
                    row.iter().map(|v| value_to_text(v).unwrap_or_default()),
                ));
            }
            out
        }
        OutputFormat::Json => pretty(&json!({
            "columns": table.columns(),
            "rows": table
                .rows()
                .iter()
                .map(|row| row.iter().map(value_to_json).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        })),
    }
}

/// Render geography records; the WKT column appears only when any record
/// carries a geometry.
pub fn render_geo_table(table: &GeoTable, format: OutputFormat) -> String {
    let with_geometry = table.records().iter().any(|r| r.geometry.is_some());
    match format {
        OutputFormat::Tsv => {
            let mut out = if with_geometry {
                tsv_line(["geocode", "wkt"])
            } else {
                tsv_line(["geocode"])
            };
            for record in table.records() {
                out.push_str(&if with_geometry {
                    let wkt = record.geometry.as_ref().map(to_wkt).unwrap_or_default();
                    tsv_line([record.geocode.as_str(), wkt.as_str()])
                } else {
                    tsv_line([record.geocode.as_str()])
                });
            }
            out
        }
        OutputFormat::Json => pretty(&json!({
            "crs": table.crs().to_string(),
            "records": table
                .records()
                .iter()
                .map(|r| json!({
                    "geocode": r.geocode,
                    "wkt": r.geometry.as_ref().map(to_wkt),
                }))
                .collect::<Vec<_>>(),
        })),
    }
}

/// Render the fact-table catalog.
pub fn render_table_names(tables: &[LodesTableName], format: OutputFormat) -> String {
    match format {
        OutputFormat::Tsv => {
            let mut out = tsv_line(["table", "data_type", "segment", "job_type", "year"]);
            for t in tables {
                out.push_str(&tsv_line([
                    t.to_string(),
                    t.data_type.to_string(),
                    t.segment.clone(),
                    t.job_code.clone(),
                    t.year.to_string(),
                ]));
            }
            out
        }
        OutputFormat::Json => pretty(&json!(
            tables
                .iter()
                .map(|t| json!({
                    "table": t.to_string(),
                    "data_type": t.data_type.to_string(),
                    "segment": t.segment,
                    "job_type": t.job_code,
                    "year": t.year.value(),
                }))
                .collect::<Vec<_>>()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodes_core::GeoRecord;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            vec!["h_geocode".into(), "tot".into()],
            vec![
                vec![Value::Text("480019501001010".into()), Value::Integer(30)],
                vec![Value::Text("480019501001011".into()), Value::Null],
            ],
        )
        .expect("table")
    }

    #[test]
    fn tsv_has_header_and_blank_nulls() {
        assert_eq!(
            render_table(&sample(), OutputFormat::Tsv),
            "h_geocode\ttot\n480019501001010\t30\n480019501001011\t\n"
        );
    }

    #[test]
    fn json_keeps_column_order_and_types() {
        let rendered = render_table(&sample(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(parsed["columns"], json!(["h_geocode", "tot"]));
        assert_eq!(parsed["rows"][0], json!(["480019501001010", 30]));
        assert_eq!(parsed["rows"][1][1], serde_json::Value::Null);
    }

    #[test]
    fn geo_table_without_geometry_lists_geocodes() {
        let table = GeoTable::interchange(vec![GeoRecord::without_geometry("48201")]);
        assert_eq!(render_geo_table(&table, OutputFormat::Tsv), "geocode\n48201\n");
        let parsed: serde_json::Value =
            serde_json::from_str(&render_geo_table(&table, OutputFormat::Json)).expect("json");
        assert_eq!(parsed["crs"], json!("EPSG:4326"));
        assert_eq!(parsed["records"][0]["wkt"], serde_json::Value::Null);
    }
}
