//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the row loaders and joined into lookup tables
//! - carried through the transform pipeline
//! - exported to JSON/CSV as part of a view model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Family of upstream tables a dataset is parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFamily {
    /// Johns Hopkins CSSE time series (wide format, one CSV per kind).
    Jh,
    /// Our World in Data `full_data.csv` (long format, all kinds in one file).
    Owid,
}

/// Identifier of a single time-series dataset, e.g. `owid_total_cases`.
///
/// The string form is what appears in exports and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DatasetId {
    JhDeaths,
    JhConfirmed,
    JhRecovered,
    OwidTotalCases,
    OwidTotalDeaths,
}

impl DatasetId {
    /// Every known dataset, in cycling order.
    pub const ALL: [DatasetId; 5] = [
        DatasetId::JhDeaths,
        DatasetId::JhConfirmed,
        DatasetId::JhRecovered,
        DatasetId::OwidTotalCases,
        DatasetId::OwidTotalDeaths,
    ];

    pub const DEFAULT: DatasetId = DatasetId::OwidTotalDeaths;

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetId::JhDeaths => "jh_Deaths",
            DatasetId::JhConfirmed => "jh_Confirmed",
            DatasetId::JhRecovered => "jh_Recovered",
            DatasetId::OwidTotalCases => "owid_total_cases",
            DatasetId::OwidTotalDeaths => "owid_total_deaths",
        }
    }

    pub fn family(self) -> SourceFamily {
        match self {
            DatasetId::JhDeaths | DatasetId::JhConfirmed | DatasetId::JhRecovered => SourceFamily::Jh,
            DatasetId::OwidTotalCases | DatasetId::OwidTotalDeaths => SourceFamily::Owid,
        }
    }

    /// Human-readable description used for the y-axis label.
    pub fn describe(self) -> &'static str {
        match self {
            DatasetId::JhConfirmed | DatasetId::OwidTotalCases => "Confirmed Infections",
            DatasetId::JhDeaths | DatasetId::OwidTotalDeaths => "Confirmed Deaths",
            DatasetId::JhRecovered => "Confirmed Recovered",
        }
    }

    /// Step through `ALL` with wrap-around (negative steps go backwards).
    pub fn cycle(self, step: isize) -> DatasetId {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0) as isize;
        Self::ALL[(idx + step).rem_euclid(len) as usize]
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetId::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = DatasetId::ALL.iter().map(|d| d.as_str()).collect();
                format!("unknown dataset '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

impl TryFrom<String> for DatasetId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetId> for String {
    fn from(value: DatasetId) -> Self {
        value.as_str().to_string()
    }
}

/// A single loaded value: one country, one date, one dataset.
///
/// `value` is `None` when the source cell was blank or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub source: DatasetId,
}

/// Static per-country metadata used for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub country: String,
    pub code: String,
    pub population: u64,
}

/// Chronologically ordered values for one (dataset, country) pair.
///
/// Dates are strictly increasing; construction sorts and keeps the last value
/// for any repeated date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub dataset: DatasetId,
    pub country: String,
    entries: Vec<(NaiveDate, Option<f64>)>,
}

impl Series {
    pub fn from_unsorted(
        dataset: DatasetId,
        country: impl Into<String>,
        mut entries: Vec<(NaiveDate, Option<f64>)>,
    ) -> Self {
        // Stable sort keeps insertion order among equal dates, so the last one wins below.
        entries.sort_by_key(|(d, _)| *d);
        let mut deduped: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(entries.len());
        for (date, value) in entries {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => deduped.push((date, value)),
            }
        }
        Self {
            dataset,
            country: country.into(),
            entries: deduped,
        }
    }

    pub fn entries(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seed points for the transform pipeline (`x`/`y` unset).
    pub fn points(&self) -> Vec<Point> {
        self.entries
            .iter()
            .map(|&(date, value)| Point::new(date, value))
            .collect()
    }
}

/// Horizontal coordinate of a pipeline point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum XCoord {
    /// Calendar date.
    Date(NaiveDate),
    /// Elapsed days since an alignment anchor.
    Days(i64),
    /// A data value (trajectory plots use the cumulative total).
    Value(f64),
}

impl XCoord {
    /// Numeric position for scale computations (dates map to day numbers).
    pub fn position(self) -> f64 {
        match self {
            XCoord::Date(d) => f64::from(chrono::Datelike::num_days_from_ce(&d)),
            XCoord::Days(n) => n as f64,
            XCoord::Value(v) => v,
        }
    }
}

impl fmt::Display for XCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XCoord::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            XCoord::Days(n) => write!(f, "{n}"),
            XCoord::Value(v) => write!(f, "{v}"),
        }
    }
}

/// A record flowing through the transform pipeline.
///
/// Stages never modify a point in place; they return new points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub x: Option<XCoord>,
    pub y: Option<f64>,
}

impl Point {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value,
            x: None,
            y: None,
        }
    }

    pub fn with_y(self, y: Option<f64>) -> Self {
        Self { y, ..self }
    }

    pub fn with_x(self, x: Option<XCoord>) -> Self {
        Self { x, ..self }
    }

    /// `y` if it is a usable, finite number.
    pub fn valid_y(&self) -> Option<f64> {
        self.y.filter(|v| v.is_finite())
    }
}
