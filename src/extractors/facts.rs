// src/extractors/facts.rs

use crate::document::resolver::normalize_label;
use crate::document::{CellResolver, Document, LabelQuery, SheetRole};
use crate::extractors::layout::{
    APPLICATION_LABEL_COLUMNS, APPLICATION_VALUE_COLUMNS, BUDGET_VALUE_COLUMNS,
    NEW_CONSTRUCTION_HEADER, NEW_CONSTRUCTION_LABEL, SQUARE_FOOTAGE_LABEL, UNIT_COUNT_EXCLUDE,
    UNIT_COUNT_LABEL,
};
use crate::models::ProjectFacts;

/// Rows below the "NEW CONSTRUCTION" heading scanned for its total row.
const NEW_CONSTRUCTION_SCAN_ROWS: usize = 20;

/// Reads unit count, square footage and the hard-cost total. Each fact is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectFactsExtractor;

impl ProjectFactsExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &Document) -> ProjectFacts {
        let application = CellResolver::for_document(document, SheetRole::Application);

        let unit_count = application
            .resolve_number(
                &LabelQuery::new(UNIT_COUNT_LABEL, APPLICATION_VALUE_COLUMNS)
                    .in_columns(APPLICATION_LABEL_COLUMNS)
                    .excluding(UNIT_COUNT_EXCLUDE),
            )
            .and_then(to_unit_count);

        let square_footage = application
            .resolve_number(
                &LabelQuery::new(SQUARE_FOOTAGE_LABEL, APPLICATION_VALUE_COLUMNS)
                    .in_columns(APPLICATION_LABEL_COLUMNS),
            )
            .filter(|sf| *sf >= 0.0);

        let new_construction_total = application
            .resolve_number(
                &LabelQuery::new(NEW_CONSTRUCTION_LABEL, APPLICATION_VALUE_COLUMNS)
                    .in_columns(APPLICATION_LABEL_COLUMNS),
            )
            .or_else(|| new_construction_from_budget(document));

        let facts = ProjectFacts { unit_count, square_footage, new_construction_total };
        tracing::debug!("Extracted project facts: {:?}", facts);
        facts
    }
}

/// Unit counts must be whole, non-negative numbers.
fn to_unit_count(value: f64) -> Option<u32> {
    let rounded = value.round();
    if value < 0.0 || (value - rounded).abs() > 1e-9 || rounded > u32::MAX as f64 {
        tracing::warn!("Ignoring implausible unit count {}", value);
        return None;
    }
    Some(rounded as u32)
}

/// The budget sheet prints hard costs as "Total New Construction Costs"; older forms only
/// have a "NEW CONSTRUCTION" block ending in some "Total ... Construction ..." row.
fn new_construction_from_budget(document: &Document) -> Option<f64> {
    let budget = CellResolver::for_document(document, SheetRole::Budget);

    if let Some(total) = budget.resolve_number(&LabelQuery::new(NEW_CONSTRUCTION_LABEL, BUDGET_VALUE_COLUMNS)) {
        return Some(total);
    }

    let header = budget.find_label(&LabelQuery::new(NEW_CONSTRUCTION_HEADER, &[]).prefer_exact())?;
    let sheet = budget.sheet();
    (header.row + 1..header.row.saturating_add(1 + NEW_CONSTRUCTION_SCAN_ROWS)).find_map(|row| {
        let label = normalize_label(sheet.cell(row, header.col).as_text()?);
        if label.contains("total") && label.contains("construction") {
            BUDGET_VALUE_COLUMNS
                .iter()
                .find_map(|&col| sheet.cell(row, col).as_number())
                .filter(|v| *v > 0.0)
        } else {
            None
        }
    })
}
