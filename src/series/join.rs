//! Series joiner: flat observations -> `source -> country -> date -> value`.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{DatasetId, Observation, Series};

type CountryTable = HashMap<String, HashMap<NaiveDate, Option<f64>>>;

/// Nested lookup table of joined observations.
///
/// Map iteration order is unspecified; use `series` for date-ordered access.
#[derive(Debug, Clone, Default)]
pub struct JoinedTable {
    sources: HashMap<DatasetId, CountryTable>,
}

/// A repeated `(source, country, date)` triple. The later value replaced the earlier one.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateObservation {
    pub source: DatasetId,
    pub country: String,
    pub date: NaiveDate,
    pub replaced: Option<f64>,
    pub kept: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub table: JoinedTable,
    pub duplicates: Vec<DuplicateObservation>,
}

/// Group observations by source, then country, then date.
pub fn join(rows: impl IntoIterator<Item = Observation>) -> JoinOutput {
    let mut out = JoinOutput::default();
    for row in rows {
        if let Some(dup) = out.table.insert(row) {
            warn!(
                source = %dup.source,
                country = %dup.country,
                date = %dup.date,
                "duplicate observation; keeping the later value"
            );
            out.duplicates.push(dup);
        }
    }
    out
}

impl JoinedTable {
    fn insert(&mut self, row: Observation) -> Option<DuplicateObservation> {
        let Observation {
            country,
            date,
            value,
            source,
        } = row;
        let dates = self
            .sources
            .entry(source)
            .or_default()
            .entry(country.clone())
            .or_default();
        dates.insert(date, value).map(|replaced| DuplicateObservation {
            source,
            country,
            date,
            replaced,
            kept: value,
        })
    }

    /// Fold another table into this one (values from `other` win).
    pub fn merge(&mut self, other: JoinedTable) {
        for (source, countries) in other.sources {
            let target = self.sources.entry(source).or_default();
            for (country, dates) in countries {
                target.entry(country).or_default().extend(dates);
            }
        }
    }

    pub fn contains(&self, dataset: DatasetId) -> bool {
        self.sources.contains_key(&dataset)
    }

    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut out: Vec<DatasetId> = self.sources.keys().copied().collect();
        out.sort();
        out
    }

    /// Countries present in `dataset`, sorted by name.
    pub fn countries(&self, dataset: DatasetId) -> Vec<String> {
        let mut out: Vec<String> = self
            .sources
            .get(&dataset)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    pub fn has_country(&self, dataset: DatasetId, country: &str) -> bool {
        self.sources
            .get(&dataset)
            .is_some_and(|c| c.contains_key(country))
    }

    /// Date-ordered series for one country; empty if unknown.
    pub fn series(&self, dataset: DatasetId, country: &str) -> Series {
        let entries = self
            .sources
            .get(&dataset)
            .and_then(|c| c.get(country))
            .map(|dates| dates.iter().map(|(d, v)| (*d, *v)).collect())
            .unwrap_or_default();
        Series::from_unsorted(dataset, country, entries)
    }

    /// Number of stored values across all sources.
    pub fn len(&self) -> usize {
        self.sources
            .values()
            .flat_map(|c| c.values())
            .map(|dates| dates.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(source: DatasetId, country: &str, day: u32, value: f64) -> Observation {
        Observation {
            country: country.to_string(),
            date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
            value: Some(value),
            source,
        }
    }

    #[test]
    fn join_groups_by_source_country_date() {
        let out = join(vec![
            obs(DatasetId::OwidTotalCases, "Italy", 2, 20.0),
            obs(DatasetId::OwidTotalDeaths, "Italy", 1, 1.0),
            obs(DatasetId::OwidTotalCases, "Italy", 1, 10.0),
            obs(DatasetId::OwidTotalCases, "Spain", 1, 5.0),
        ]);
        assert!(out.duplicates.is_empty());
        assert_eq!(out.table.len(), 4);
        assert_eq!(out.table.countries(DatasetId::OwidTotalCases), vec!["Italy", "Spain"]);

        let series = out.table.series(DatasetId::OwidTotalCases, "Italy");
        let values: Vec<Option<f64>> = series.entries().iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![Some(10.0), Some(20.0)]);
    }

    #[test]
    fn duplicates_keep_last_and_are_reported() {
        let out = join(vec![
            obs(DatasetId::JhConfirmed, "Chile", 3, 1.0),
            obs(DatasetId::JhConfirmed, "Chile", 3, 2.0),
        ]);
        assert_eq!(out.duplicates.len(), 1);
        assert_eq!(out.duplicates[0].replaced, Some(1.0));
        assert_eq!(out.duplicates[0].kept, Some(2.0));
        let date = NaiveDate::from_ymd_opt(2020, 4, 3).unwrap();
        let series = out.table.series(DatasetId::JhConfirmed, "Chile");
        assert_eq!(series.entries(), &[(date, Some(2.0))]);
    }

    #[test]
    fn unknown_country_gives_empty_series() {
        let out = join(vec![obs(DatasetId::JhDeaths, "Peru", 1, 1.0)]);
        assert!(out.table.series(DatasetId::JhDeaths, "Atlantis").is_empty());
        assert!(out.table.series(DatasetId::JhConfirmed, "Peru").is_empty());
    }

    #[test]
    fn merge_overlays_later_table() {
        let mut a = join(vec![obs(DatasetId::JhDeaths, "Peru", 1, 1.0)]).table;
        let b = join(vec![
            obs(DatasetId::JhDeaths, "Peru", 1, 3.0),
            obs(DatasetId::JhConfirmed, "Peru", 1, 9.0),
        ])
        .table;
        a.merge(b);
        assert_eq!(a.datasets(), vec![DatasetId::JhDeaths, DatasetId::JhConfirmed]);
        let date = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        assert_eq!(a.series(DatasetId::JhDeaths, "Peru").entries(), &[(date, Some(3.0))]);
    }
}
