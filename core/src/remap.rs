//! Column remap and retype for LODES result tables
//!
//! LODES ships count columns under short codes (`SA01`, `CNS05`, ...). The
//! remap gives them readable names; the retype makes every non-geocode
//! column numeric, zero-filling anything that does not parse.

use crate::table::{Table, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

/// LODES short code → readable column name.
pub const COLUMN_REMAP: &[(&str, &str)] = &[
    // OD segments
    ("S000", "total"),
    ("SA01", "Age_un_29"),
    ("SA02", "Age_30_54"),
    ("SA03", "Age_55up"),
    ("SE01", "un1250"),
    ("SE02", "un3333"),
    ("SE03", "ov3333"),
    ("SI01", "goods"),
    ("SI02", "transp"),
    ("SI03", "other"),
    // WAC/RAC totals, age and earnings
    ("C000", "tot"),
    ("CA01", "Age_un_29"),
    ("CA02", "Age_30_54"),
    ("CA03", "Age_55up"),
    ("CE01", "Under1250"),
    ("CE02", "Ov1250Un3333"),
    ("CE03", "Over3333"),
    // NAICS sectors
    ("CNS01", "Ag_11"),
    ("CNS02", "OilExt_21"),
    ("CNS03", "Utilit_22"),
    ("CNS04", "Constr_23"),
    ("CNS05", "Mfrg_31_33"),
    ("CNS06", "Whlesle_42"),
    ("CNS07", "Retail_44_45"),
    ("CNS08", "TransWrh_48_49"),
    ("CNS09", "Info_51"),
    ("CNS10", "FIRE_52"),
    ("CNS11", "RealEst_53"),
    ("CNS12", "ProfSci_54"),
    ("CNS13", "Mgmt_55"),
    ("CNS14", "AdminWaste_56"),
    ("CNS15", "Edu_61"),
    ("CNS16", "Health_62"),
    ("CNS17", "ArtsRec_71"),
    ("CNS18", "AccomFood_72"),
    ("CNS19", "Other_81"),
    ("CNS20", "PubAdm_92"),
    // Race and ethnicity
    ("CR01", "WhiteAl"),
    ("CR02", "BlackAl"),
    ("CR03", "AmIndAl"),
    ("CR04", "AsianAl"),
    ("CR05", "NatHawAl"),
    ("CR07", "TwoOrMoreAl"),
    ("CT01", "NotHisp"),
    ("CT02", "Hisp"),
    // Education
    ("CD01", "LessThanHS"),
    ("CD02", "HSNoCol"),
    ("CD03", "AsSomeCol"),
    ("CD04", "BaAb"),
    // Sex
    ("CS01", "Male"),
    ("CS02", "Female"),
    // Firm age
    ("CFA01", "BizAge0_1"),
    ("CFA02", "BizAge2_3"),
    ("CFA03", "BizAge4_5"),
    ("CFA04", "BizAge6_10"),
    ("CFA05", "BizAgeOv11"),
    // Firm size
    ("CFS01", "BizSize0_19"),
    ("CFS02", "BizSize20_49"),
    ("CFS03", "BizSize50_249"),
    ("CFS04", "BizSize250_499"),
    ("CFS05", "BizSizeOv500"),
];

static REMAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| COLUMN_REMAP.iter().copied().collect());

/// Readable name for a LODES short code, if it has one.
pub fn semantic_name(code: &str) -> Option<&'static str> {
    REMAP.get(code).copied()
}

/// Rename LODES short codes, then cast every column whose name does not
/// contain `geocode` to a number. Unparseable and null values become 0.
pub fn retype(mut table: Table) -> Table {
    for column in table.columns_mut() {
        if let Some(name) = semantic_name(column) {
            *column = name.to_string();
        }
    }

    let numeric: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.contains("geocode"))
        .map(|(idx, _)| idx)
        .collect();

    for row in table.rows_mut() {
        for &idx in &numeric {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = to_numeric(cell);
        }
    }
    table
}

pub(crate) fn to_numeric(value: Value) -> Value {
    match value {
        Value::Integer(_) => value,
        Value::Real(r) if r.is_finite() => Value::Real(r),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::Integer(i)
            } else {
                match s.parse::<f64>() {
                    Ok(r) if r.is_finite() => Value::Real(r),
                    _ => Value::Integer(0),
                }
            }
        }
        Value::Real(_) | Value::Null | Value::Blob(_) => Value::Integer(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renames_and_zero_fills_unparseable_counts() {
        let table = Table::from_rows(
            vec!["h_geocode".into(), "SA01".into(), "CNS05".into()],
            vec![vec![
                Value::Text("480019501001010".into()),
                Value::Integer(12),
                Value::Text("n/a".into()),
            ]],
        )
        .expect("table");

        let out = retype(table);
        assert_eq!(out.columns(), ["h_geocode", "Age_un_29", "Mfrg_31_33"]);
        assert_eq!(out.get(0, "Age_un_29"), Some(&Value::Integer(12)));
        assert_eq!(out.get(0, "Mfrg_31_33"), Some(&Value::Integer(0)));
        assert_eq!(
            out.get(0, "h_geocode"),
            Some(&Value::Text("480019501001010".into()))
        );
    }

    #[test]
    fn text_numbers_are_cast_and_unknown_columns_kept() {
        let table = Table::from_rows(
            vec![
                "w_geocode".into(),
                "C000".into(),
                "createdate".into(),
                "ratio".into(),
                "CR06".into(),
            ],
            vec![vec![
                Value::Text("480019501001010".into()),
                Value::Text(" 42 ".into()),
                Value::Text("20230321".into()),
                Value::Text("0.5".into()),
                Value::Null,
            ]],
        )
        .expect("table");

        let out = retype(table);
        assert_eq!(out.columns()[1], "tot");
        assert_eq!(out.columns()[4], "CR06");
        assert_eq!(out.get(0, "tot"), Some(&Value::Integer(42)));
        assert_eq!(out.get(0, "createdate"), Some(&Value::Integer(20_230_321)));
        assert_eq!(out.get(0, "ratio"), Some(&Value::Real(0.5)));
        assert_eq!(out.get(0, "CR06"), Some(&Value::Integer(0)));
    }

    #[test]
    fn remap_table_has_unique_codes() {
        let mut codes: Vec<&str> = COLUMN_REMAP.iter().map(|(code, _)| *code).collect();
        let before = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), before);
        assert_eq!(semantic_name("CFS05"), Some("BizSizeOv500"));
    }
}
