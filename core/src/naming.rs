//! Table and index naming for the LODES schema
//!
//! Fact tables are named `{state}_{data_type}_{segment}_{job}_{year}`, where
//! `segment` is the workforce subset (`S000`, `SA01`, ...) for wac/rac and
//! `main` for od. Geometry tables are named `{geom_type}_{year}_geom`. Every
//! identifier built here is checked against that grammar before it reaches
//! SQL text.

use crate::errors::{LodesError, Result};
use regex_lite::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use strum_macros::{AsRefStr, Display, EnumString};

#[allow(clippy::unwrap_used)]
static FACT_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]{2})_(wac|rac|od)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_([0-9]{4})$").unwrap()
});

/// LODES table family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    /// Workplace Area Characteristics
    Wac,
    /// Residence Area Characteristics
    Rac,
    /// Origin-Destination
    Od,
}

impl DataType {
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            LodesError::input(format!(
                "invalid data_type '{s}'; must be 'wac', 'rac' or 'od'"
            ))
        })
    }
}

/// Which side of an origin-destination pair a query filters on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Perspective {
    #[default]
    Home,
    Work,
}

impl Perspective {
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            LodesError::input(format!(
                "'{s}' passed as perspective; must pass 'home' or 'work'"
            ))
        })
    }
}

/// LODES job type (`JT` code)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum JobType {
    /// All jobs (`JT00`)
    #[default]
    All,
    /// Primary jobs (`JT01`)
    Primary,
    /// Any other code, passed through verbatim
    Other(String),
}

impl JobType {
    /// Parse `all`, `primary`, or a raw code such as `JT02`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "all" => Ok(Self::All),
            "primary" => Ok(Self::Primary),
            other if is_token(other) => Ok(Self::Other(other.to_string())),
            other => Err(LodesError::input(format!(
                "invalid job_type '{other}'; expected 'all', 'primary' or an alphanumeric JT code"
            ))),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::All => "JT00",
            Self::Primary => "JT01",
            Self::Other(code) => code,
        }
    }
}

/// Four-digit data year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Year(u16);

impl Year {
    /// Vintage of the 2020 census geometry tables
    pub const CENSUS_2020: Year = Year(2020);

    /// Coerce anything with a textual form into a year by keeping its first
    /// four characters, so `2019`, `"2019"`, `2019.0` and `"2019-06"` all
    /// resolve to 2019.
    pub fn coerce(value: impl fmt::Display) -> Result<Self> {
        let text = value.to_string();
        let head: String = text.trim().chars().take(4).collect();
        if head.len() != 4 || !head.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LodesError::input(format!("error with year '{text}'")));
        }
        head.parse::<u16>()
            .map(Self)
            .map_err(|_| LodesError::input(format!("error with year '{text}'")))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for Year {
    type Err = LodesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::coerce(s)
    }
}

/// Normalize a two-letter postal state code (`TX` → `tx`).
pub fn state_code(s: &str) -> Result<String> {
    let code = s.trim().to_ascii_lowercase();
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase()) {
        Ok(code)
    } else {
        Err(LodesError::input(format!(
            "invalid state_code '{s}'; expected a two-letter postal code such as 'tx'"
        )))
    }
}

/// A non-empty run of ASCII letters and digits.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Resolved name of a LODES fact table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LodesTableName {
    pub state: String,
    pub data_type: DataType,
    /// Workforce subset for wac/rac, `main` (or `aux`) for od
    pub segment: String,
    /// `JT00`, `JT01`, ...
    pub job_code: String,
    pub year: Year,
}

impl LodesTableName {
    /// Parse a table name; `None` if it does not follow the fact-table grammar.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = FACT_TABLE_RE.captures(name)?;
        Some(Self {
            state: caps.get(1)?.as_str().to_string(),
            data_type: DataType::from_str(caps.get(2)?.as_str()).ok()?,
            segment: caps.get(3)?.as_str().to_string(),
            job_code: caps.get(4)?.as_str().to_string(),
            year: Year::coerce(caps.get(5)?.as_str()).ok()?,
        })
    }

    /// Build a name and check it against the fact-table grammar.
    pub fn new(
        state: &str,
        data_type: DataType,
        segment: &str,
        job_code: &str,
        year: Year,
    ) -> Result<Self> {
        let candidate = Self {
            state: state_code(state)?,
            data_type,
            segment: segment.to_string(),
            job_code: job_code.to_string(),
            year,
        };
        let name = candidate.to_string();
        if FACT_TABLE_RE.is_match(&name) {
            Ok(candidate)
        } else {
            Err(LodesError::input(format!(
                "could not create a coherent table name from '{name}'"
            )))
        }
    }

    /// Name of the b-tree index covering `geocode_column`.
    pub fn index_name(&self, geocode_column: &str) -> String {
        match self.data_type {
            DataType::Od => format!("{self}_od_{}_index", geocode_column.replace('_', "")),
            DataType::Wac | DataType::Rac => format!("{self}_main_index"),
        }
    }
}

impl fmt::Display for LodesTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.state, self.data_type, self.segment, self.job_code, self.year
        )
    }
}

/// Census geography layer stored in a geometry table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum GeometryType {
    #[default]
    Blocks,
    Zcta,
    Tracts,
}

impl GeometryType {
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            LodesError::input(format!(
                "{s} is not a valid geom_type; expected 'blocks', 'zcta' or 'tracts'"
            ))
        })
    }

    /// Column holding the geocode in this layer's table
    pub fn geocode_column(&self) -> &'static str {
        match self {
            Self::Blocks => "geocode",
            Self::Zcta => "GEOID20",
            Self::Tracts => "GEOID",
        }
    }
}

/// A `{geom_type}_{year}_geom` table and its indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryTable {
    pub geometry_type: GeometryType,
    pub year: Year,
}

impl GeometryTable {
    pub const GEOMETRY_COLUMN: &'static str = "geom";

    pub fn new(geometry_type: GeometryType, year: Year) -> Self {
        Self {
            geometry_type,
            year,
        }
    }

    pub fn name(&self) -> String {
        format!("{}_{}_geom", self.geometry_type, self.year)
    }

    /// Non-spatial index on the geocode column
    pub fn index_name(&self) -> String {
        format!("{}_index", self.geometry_type)
    }

    /// R*Tree table backing the spatial index on `geom`
    pub fn spatial_index_name(&self) -> String {
        format!("idx_{}_{}", self.name(), Self::GEOMETRY_COLUMN)
    }

    pub fn geocode_column(&self) -> &'static str {
        self.geometry_type.geocode_column()
    }
}
