//! Synthetic epidemic curves for offline use.
//!
//! Each country follows a logistic cumulative curve with multiplicative
//! log-normal noise on the daily increments. Output is deterministic for a
//! given seed, so demos and tests are reproducible.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::countries::{CountryTable, WORLD, canonical_country_name};
use crate::data::loader::RowLoader;
use crate::domain::{CountryInfo, DatasetId, Observation, SourceFamily};
use crate::error::AppError;

/// Log-volatility of the daily increments.
const NOISE_SIGMA: f64 = 0.15;
/// Days from case report to death report.
const DEATH_LAG_DAYS: usize = 10;
/// Days from case report to recovery report.
const RECOVERY_LAG_DAYS: usize = 14;
const RECOVERY_SHARE: f64 = 0.9;
/// Upper bound on generated days; longer requests are clamped.
pub const MAX_SAMPLE_DAYS: usize = 3_650;

/// Shape of one synthetic country.
#[derive(Debug, Clone, Copy)]
pub struct SampleProfile {
    /// Name as spelled by the upstream sources (canonicalized on load).
    pub name: &'static str,
    pub code: &'static str,
    pub population: u64,
    /// Share of the population infected once the curve flattens.
    pub attack_rate: f64,
    /// Logistic growth rate per day.
    pub growth: f64,
    /// Day (from the start) of the inflection point.
    pub midpoint: f64,
    pub fatality: f64,
}

pub const PROFILES: [SampleProfile; 9] = [
    SampleProfile { name: "China", code: "CHN", population: 1_392_730_000, attack_rate: 0.000_06, growth: 0.25, midpoint: 20.0, fatality: 0.040 },
    SampleProfile { name: "Italy", code: "ITA", population: 60_421_760, attack_rate: 0.004, growth: 0.18, midpoint: 55.0, fatality: 0.120 },
    SampleProfile { name: "Denmark", code: "DNK", population: 5_793_636, attack_rate: 0.002, growth: 0.16, midpoint: 60.0, fatality: 0.045 },
    SampleProfile { name: "Germany", code: "DEU", population: 82_905_782, attack_rate: 0.002_2, growth: 0.20, midpoint: 58.0, fatality: 0.040 },
    SampleProfile { name: "Sweden", code: "SWE", population: 10_183_175, attack_rate: 0.006, growth: 0.09, midpoint: 80.0, fatality: 0.080 },
    SampleProfile { name: "Greece", code: "GRC", population: 10_731_726, attack_rate: 0.000_3, growth: 0.14, midpoint: 62.0, fatality: 0.050 },
    SampleProfile { name: "France", code: "FRA", population: 66_977_107, attack_rate: 0.002_5, growth: 0.17, midpoint: 60.0, fatality: 0.150 },
    SampleProfile { name: "US", code: "USA", population: 327_167_434, attack_rate: 0.006, growth: 0.15, midpoint: 75.0, fatality: 0.055 },
    SampleProfile { name: "Korea, South", code: "KOR", population: 51_635_256, attack_rate: 0.000_2, growth: 0.30, midpoint: 40.0, fatality: 0.020 },
];

/// Row loader that generates data instead of reading it.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    seed: u64,
    start: NaiveDate,
    days: usize,
}

impl SampleLoader {
    pub fn new(seed: u64, start: NaiveDate, days: usize) -> Self {
        Self {
            seed,
            start,
            days: days.min(MAX_SAMPLE_DAYS),
        }
    }

    /// Cumulative case counts for one profile, one value per day.
    pub fn cumulative_cases(&self, profile: &SampleProfile) -> Result<Vec<f64>, AppError> {
        let mut rng = StdRng::seed_from_u64(country_seed(self.seed, profile.name));
        let normal = Normal::new(0.0, NOISE_SIGMA)
            .map_err(|e| AppError::data_source(format!("Noise distribution error: {e}")))?;

        let capacity = profile.population as f64 * profile.attack_rate;
        let logistic = |t: f64| capacity / (1.0 + (-profile.growth * (t - profile.midpoint)).exp());

        let mut out = Vec::with_capacity(self.days);
        let mut total = 0.0;
        for day in 0..self.days {
            let t = day as f64;
            let expected = logistic(t) - if day == 0 { 0.0 } else { logistic(t - 1.0) };
            let z: f64 = normal.sample(&mut rng);
            // Mean-corrected so the noisy curve tracks the logistic on average.
            let noisy = expected * (z - NOISE_SIGMA * NOISE_SIGMA / 2.0).exp();
            total += noisy.max(0.0);
            out.push(total.floor());
        }
        Ok(out)
    }

    fn date(&self, day: usize) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(day as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    fn series_for(&self, profile: &SampleProfile, dataset: DatasetId) -> Result<Vec<f64>, AppError> {
        let cases = self.cumulative_cases(profile)?;
        let lagged = |lag: usize, share: f64| -> Vec<f64> {
            (0..cases.len())
                .map(|day| day.checked_sub(lag).map_or(0.0, |d| (cases[d] * share).floor()))
                .collect()
        };
        Ok(match dataset {
            DatasetId::JhConfirmed | DatasetId::OwidTotalCases => cases.clone(),
            DatasetId::JhDeaths | DatasetId::OwidTotalDeaths => lagged(DEATH_LAG_DAYS, profile.fatality),
            DatasetId::JhRecovered => lagged(RECOVERY_LAG_DAYS, RECOVERY_SHARE),
        })
    }
}

impl RowLoader for SampleLoader {
    fn load_rows(&self, dataset: DatasetId) -> Result<Vec<Observation>, AppError> {
        let datasets: Vec<DatasetId> = match dataset.family() {
            SourceFamily::Owid => vec![DatasetId::OwidTotalCases, DatasetId::OwidTotalDeaths],
            SourceFamily::Jh => vec![dataset],
        };

        let mut rows = Vec::new();
        for ds in datasets {
            let mut world: BTreeMap<usize, f64> = BTreeMap::new();
            for profile in &PROFILES {
                let country = canonical_country_name(profile.name);
                for (day, value) in self.series_for(profile, ds)?.into_iter().enumerate() {
                    *world.entry(day).or_default() += value;
                    rows.push(Observation {
                        country: country.clone(),
                        date: self.date(day),
                        value: Some(value),
                        source: ds,
                    });
                }
            }
            if ds.family() == SourceFamily::Jh {
                for (day, value) in world {
                    rows.push(Observation {
                        country: WORLD.to_string(),
                        date: self.date(day),
                        value: Some(value),
                        source: ds,
                    });
                }
            }
        }
        Ok(rows)
    }

    fn load_countries(&self) -> Result<CountryTable, AppError> {
        let mut infos: Vec<CountryInfo> = PROFILES
            .iter()
            .map(|p| CountryInfo {
                country: canonical_country_name(p.name),
                code: p.code.to_string(),
                population: p.population,
            })
            .collect();
        infos.push(CountryInfo {
            country: WORLD.to_string(),
            code: "WLD".to_string(),
            population: PROFILES.iter().map(|p| p.population).sum(),
        });
        Ok(CountryTable::from_infos(infos))
    }

    fn describe(&self) -> String {
        format!("synthetic sample (seed {}, {} days from {})", self.seed, self.days, self.start)
    }
}

fn country_seed(seed: u64, country: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    country.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> SampleLoader {
        SampleLoader::new(42, NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(), 120)
    }

    #[test]
    fn cumulative_cases_never_decrease() {
        let cases = loader().cumulative_cases(&PROFILES[1]).unwrap();
        assert_eq!(cases.len(), 120);
        assert!(cases.windows(2).all(|w| w[1] >= w[0]));
        assert!(*cases.last().unwrap() > 100.0);
    }

    #[test]
    fn oversized_day_counts_are_clamped() {
        let loader = SampleLoader::new(1, NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(), usize::MAX);
        assert_eq!(loader.cumulative_cases(&PROFILES[0]).unwrap().len(), MAX_SAMPLE_DAYS);
    }

    #[test]
    fn same_seed_same_data() {
        let a = loader().load_rows(DatasetId::JhConfirmed).unwrap();
        let b = loader().load_rows(DatasetId::JhConfirmed).unwrap();
        assert_eq!(a, b);
        let other = SampleLoader::new(7, NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(), 120)
            .load_rows(DatasetId::JhConfirmed)
            .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn owid_rows_cover_both_kinds_with_canonical_names() {
        let rows = loader().load_rows(DatasetId::OwidTotalDeaths).unwrap();
        assert!(rows.iter().any(|o| o.source == DatasetId::OwidTotalCases));
        assert!(rows.iter().any(|o| o.source == DatasetId::OwidTotalDeaths));
        assert!(rows.iter().any(|o| o.country == "United States"));
        assert!(rows.iter().all(|o| o.country != "US"));
    }

    #[test]
    fn population_covers_every_sample_country() {
        let table = loader().load_countries().unwrap();
        for p in &PROFILES {
            assert!(table.population(&canonical_country_name(p.name)).is_some());
        }
        assert!(table.population(WORLD).is_some());
    }
}
