// src/summary.rs

//! Batch-level statistics over extraction results.

use serde::Serialize;

use crate::orchestrator::DocumentOutcome;
use crate::validation::format_amount;

/// Average, median, min and max of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub average: f64,
    /// Upper-middle element for even counts.
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        Some(Self {
            count,
            average: values.iter().sum::<f64>() / count as f64,
            median: values[count / 2],
            min: values[0],
            max: values[count - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_parsed: usize,
    /// Parsed documents with no Error findings.
    pub valid: usize,
    pub with_errors: usize,
    pub failed: usize,
    pub combined_cost: Option<Stats>,
    pub cost_per_unit: Option<Stats>,
    pub cost_per_sf: Option<Stats>,
}

impl BatchSummary {
    /// Statistics are taken over valid applications only.
    pub fn from_outcomes(outcomes: &[DocumentOutcome]) -> Self {
        let parsed: Vec<_> = outcomes.iter().filter_map(DocumentOutcome::result).collect();
        let valid: Vec<_> = parsed.iter().filter(|r| !r.has_errors()).collect();

        Self {
            total_parsed: parsed.len(),
            valid: valid.len(),
            with_errors: parsed.len() - valid.len(),
            failed: outcomes.len() - parsed.len(),
            combined_cost: Stats::from_values(valid.iter().filter_map(|r| r.combined_financing_cost)),
            cost_per_unit: Stats::from_values(valid.iter().filter_map(|r| r.cost_per_unit)),
            cost_per_sf: Stats::from_values(valid.iter().filter_map(|r| r.cost_per_sf)),
        }
    }

    pub fn log(&self) {
        tracing::info!("SUMMARY STATISTICS");
        tracing::info!("Total applications parsed: {}", self.total_parsed);
        tracing::info!("Valid applications (no errors): {}", self.valid);
        tracing::info!("Applications with errors: {}", self.with_errors);
        if self.failed > 0 {
            tracing::warn!("Applications that could not be read: {}", self.failed);
        }

        if let Some(stats) = &self.combined_cost {
            tracing::info!(
                "Combined Financing Costs: average ${}, median ${}, min ${}, max ${}",
                format_amount(stats.average),
                format_amount(stats.median),
                format_amount(stats.min),
                format_amount(stats.max)
            );
        }
        if let Some(stats) = &self.cost_per_unit {
            tracing::info!(
                "Financing Costs per Unit: average ${}, median ${}",
                format_amount(stats.average),
                format_amount(stats.median)
            );
        }
        if let Some(stats) = &self.cost_per_sf {
            tracing::info!(
                "Financing Costs per SF: average ${}, median ${}",
                format_amount(stats.average),
                format_amount(stats.median)
            );
        }
    }
}
