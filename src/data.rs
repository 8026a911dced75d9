use anyhow::{Context, Result};
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// One observed concentration: long-format record of variable name, time
/// and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub name: String,
    pub time: f64,
    pub value: f64,
}

/// A long-format degradation dataset. Missing values are dropped on
/// construction, so every stored observation carries a finite value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    name: String,
    time: f64,
    value: Option<f64>,
}

impl Dataset {
    /// Builds a dataset from `(name, time, value)` records; `None` or
    /// non-finite values are treated as missing and dropped.
    pub fn new<S: Into<String>>(records: impl IntoIterator<Item = (S, f64, Option<f64>)>) -> Self {
        let observations = records
            .into_iter()
            .filter_map(|(name, time, value)| {
                let value = value?;
                if !value.is_finite() || !time.is_finite() {
                    return None;
                }
                Some(Observation {
                    name: name.into(),
                    time,
                    value,
                })
            })
            .collect();
        Dataset { observations }
    }

    /// Convenience constructor for a single observed variable.
    pub fn from_series(name: &str, times: &[f64], values: &[f64]) -> Self {
        Self::new(
            times
                .iter()
                .zip(values.iter())
                .map(|(&t, &v)| (name, t, Some(v))),
        )
    }

    /// Reads a long-format CSV with `name,time,value` columns. An empty
    /// value field is treated as missing.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())
            .with_context(|| format!("failed to open {}", path.as_ref().display()))?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.context("malformed dataset record")?;
            records.push((record.name, record.time, record.value));
        }
        Ok(Self::new(records))
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observed variable names in order of first appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for obs in &self.observations {
            if !names.contains(&obs.name.as_str()) {
                names.push(&obs.name);
            }
        }
        names
    }

    /// Observations of one variable, in dataset order.
    pub fn of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations.iter().filter(move |o| o.name == name)
    }
}
