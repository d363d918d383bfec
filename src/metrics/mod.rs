// src/metrics/mod.rs

use crate::models::{FinancingMetrics, ProjectFacts};

/// Combined financing cost and its ratios.
///
/// A missing section total leaves the combined cost absent rather than treating it as
/// zero, and every ratio needs both operands and a strictly positive denominator.
pub fn compute(
    construction_total: Option<f64>,
    permanent_total: Option<f64>,
    facts: &ProjectFacts,
) -> FinancingMetrics {
    let combined = match (construction_total, permanent_total) {
        (Some(c), Some(p)) => finite(c + p),
        _ => None,
    };

    FinancingMetrics {
        combined_financing_cost: combined,
        cost_per_unit: ratio(combined, facts.unit_count.map(f64::from)),
        cost_per_sf: ratio(combined, facts.square_footage),
        cost_pct_hard_costs: ratio(combined, facts.new_construction_total),
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d > 0.0)?;
    finite(numerator? / denominator)
}

fn finite(value: f64) -> Option<f64> {
    Some(value).filter(|v| v.is_finite())
}
