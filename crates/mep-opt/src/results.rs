//! Solution export.
//!
//! [`ExportableResults`] pairs every variable of a solved model with its
//! identity in network terms. Values are stored per decision year; use
//! [`ExportableResults::expand_years`] to replicate them onto the physical
//! years each decision year represents.

use crate::indices::Indices;
use crate::model::{LinearModel, VarKind};
use crate::solver::{SolveOutcome, SolveStatus};
use mep_core::ElementKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub element: ElementKind,
    pub entity: String,
    pub kind: VarKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qualifier: Option<String>,
    /// Decision year, or physical year after expansion
    pub year: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hour: Option<usize>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportableResults {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub records: Vec<ResultRecord>,
}

impl ExportableResults {
    /// Records follow variable creation order; empty when the solve failed.
    pub fn from_outcome(model: &LinearModel, outcome: &SolveOutcome) -> Self {
        let records = match &outcome.values {
            Some(values) => model
                .variables()
                .iter()
                .zip(values)
                .map(|(variable, &value)| ResultRecord {
                    element: variable.key.element,
                    entity: variable.key.entity.clone(),
                    kind: variable.key.kind,
                    qualifier: variable.key.qualifier.clone(),
                    year: variable.key.year,
                    hour: variable.key.hour,
                    value,
                })
                .collect(),
            None => Vec::new(),
        };
        Self {
            status: outcome.status,
            objective: outcome.objective,
            records,
        }
    }

    pub fn get(
        &self,
        entity: &str,
        kind: VarKind,
        qualifier: Option<&str>,
        year: usize,
        hour: Option<usize>,
    ) -> Option<f64> {
        self.records
            .iter()
            .find(|r| {
                r.entity == entity
                    && r.kind == kind
                    && r.qualifier.as_deref() == qualifier
                    && r.year == year
                    && r.hour == hour
            })
            .map(|r| r.value)
    }

    /// All records of one entity and kind.
    pub fn series<'a>(
        &'a self,
        entity: &'a str,
        kind: VarKind,
    ) -> impl Iterator<Item = &'a ResultRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.entity == entity && r.kind == kind)
    }

    /// Replicate decision-year records onto every physical year they cover.
    pub fn expand_years(&self, indices: &Indices) -> Self {
        let records = self
            .records
            .iter()
            .flat_map(|record| {
                let years = indices
                    .buckets
                    .get(record.year)
                    .map(|bucket| bucket.physical_years())
                    .unwrap_or(record.year..=record.year);
                years.map(move |year| ResultRecord {
                    year,
                    ..record.clone()
                })
            })
            .collect();
        Self {
            status: self.status,
            objective: self.objective,
            records,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::YearBucket;

    fn results() -> ExportableResults {
        ExportableResults {
            status: SolveStatus::Optimal,
            objective: Some(12.5),
            records: vec![ResultRecord {
                element: ElementKind::Generator,
                entity: "PP_1".into(),
                kind: VarKind::Capacity,
                qualifier: None,
                year: 1,
                hour: None,
                value: 4.0,
            }],
        }
    }

    #[test]
    fn lookup_by_identity() {
        let results = results();
        assert_eq!(results.get("PP_1", VarKind::Capacity, None, 1, None), Some(4.0));
        assert_eq!(results.get("PP_1", VarKind::Capacity, None, 0, None), None);
    }

    #[test]
    fn expansion_covers_bucket_years() {
        let indices = Indices {
            n_years: 6,
            n_hours: 1,
            hours: vec![0],
            hour_weights: vec![1.0],
            years: vec![0, 3],
            year_weights: vec![3.0, 3.0],
            buckets: vec![
                YearBucket {
                    sampled_years: vec![0],
                    start: 0,
                    end: 2,
                    discount_weight: 3.0,
                },
                YearBucket {
                    sampled_years: vec![3],
                    start: 3,
                    end: 5,
                    discount_weight: 3.0,
                },
            ],
            discount_factors: vec![1.0; 6],
            tables: Default::default(),
        };
        let expanded = results().expand_years(&indices);
        let years: Vec<usize> = expanded.records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![3, 4, 5]);
    }

    #[test]
    fn json_uses_short_kind_names() {
        let json = results().to_json().unwrap();
        assert!(json.contains("\"status\": \"OPTIMAL\""));
        assert!(json.contains("\"kind\": \"capacity\""));
        assert!(!json.contains("qualifier"));
    }
}
