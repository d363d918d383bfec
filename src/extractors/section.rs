// src/extractors/section.rs

// --- Imports ---
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::resolver::LabelMatch;
use crate::document::{CellResolver, Document, LabelQuery, SheetRole};
use crate::extractors::layout::{
    FieldSpec, SectionLayout, BUDGET_VALUE_COLUMNS, CONSTRUCTION_LAYOUT, PERMANENT_LAYOUT,
};
use crate::models::{LineItem, SectionName, SectionRecord};

// --- Regex Patterns (Lazy Static) ---
// Leading "Other" plus any "(specify)"-style hint and separator, e.g. "Other (Specify): Bridge fee"
static OTHER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*other\b\s*(?:\(\s*(?:specify|describe|description)\s*\))?[\s:\-–—]*")
        .expect("Failed to compile OTHER_PREFIX_RE")
});

/// Pulls every line item and the declared total of one financing section.
#[derive(Debug, Clone, Copy)]
pub struct SectionExtractor {
    window: usize,
}

impl SectionExtractor {
    /// `window` is the number of rows below the section header that are searched.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Extracts `section` from the budget sheet.
    ///
    /// Never fails: a label that cannot be found simply leaves its item absent, and a
    /// missing section header leaves every item absent.
    pub fn extract(&self, document: &Document, section: SectionName) -> SectionRecord {
        let layout = SectionLayout::for_section(section);
        let resolver = CellResolver::for_document(document, SheetRole::Budget);

        let Some(header) = resolver.find_label(&LabelQuery::new(layout.header, &[]).prefer_exact()) else {
            tracing::warn!(
                "Section header '{}' not found on sheet '{}'",
                layout.header,
                resolver.sheet().name
            );
            return empty_record(layout);
        };
        let rows = self.section_rows(&resolver, layout, header.row + 1);
        tracing::debug!(
            "Section '{}' header at row {}, searching rows {}..{}",
            section,
            header.row + 1,
            rows.start + 1,
            rows.end
        );

        let mut line_items: Vec<LineItem> = layout
            .fields
            .iter()
            .map(|field| {
                let value = resolve_field(&resolver, field, rows.clone()).and_then(|(_, v)| v);
                LineItem::new(field.label, value)
            })
            .collect();

        line_items.push(extract_other(&resolver, &layout.other, rows.clone()));

        let declared_total = resolve_field(&resolver, &layout.total, rows).and_then(|(_, v)| v);

        let record = SectionRecord { section_name: section, line_items, declared_total };
        tracing::debug!(
            "Extracted '{}': {} of {} line items present, declared total {:?}",
            section,
            record.present_count(),
            record.line_items.len(),
            record.declared_total
        );
        record
    }

    /// Rows below the header that belong to the section: up to and including its own total
    /// row, stopping early at another section's header, never past the window.
    fn section_rows(&self, resolver: &CellResolver<'_>, layout: &SectionLayout, start: usize) -> Range<usize> {
        let window = start..start.saturating_add(self.window);

        let mut end = window.end;
        if let Some((total, _)) = resolve_field(resolver, &layout.total, window.clone()) {
            end = end.min(total.row + 1);
        }
        for other in [&CONSTRUCTION_LAYOUT, &PERMANENT_LAYOUT] {
            if other.name == layout.name {
                continue;
            }
            let query = LabelQuery::new(other.header, &[]).within(start..end).prefer_exact();
            if let Some(next) = resolver.find_label(&query) {
                end = end.min(next.row);
            }
        }
        start..end
    }
}

/// Tries each search label in turn; the first label found decides the row. Inside a section
/// an exact label beats a partial one ("Insurance" over "Title Insurance").
fn resolve_field(
    resolver: &CellResolver<'_>,
    field: &FieldSpec,
    rows: Range<usize>,
) -> Option<(LabelMatch, Option<f64>)> {
    field.search.iter().find_map(|label| {
        let query = LabelQuery::new(label, BUDGET_VALUE_COLUMNS).within(rows.clone()).prefer_exact();
        let found = resolver.find_label(&query)?;
        Some((found, resolver.resolve_number(&query)))
    })
}

fn extract_other(
    resolver: &CellResolver<'_>,
    field: &FieldSpec,
    rows: Range<usize>,
) -> LineItem {
    let Some((found, value)) = resolve_field(resolver, field, rows) else {
        return LineItem::new(field.label, None);
    };

    // The description is usually typed into the label cell itself; some forms leave the
    // label alone and put it in the first cell right of the label that is not an amount.
    let description = resolver
        .label_text(found)
        .and_then(other_description)
        .or_else(|| {
            let col = (found.col + 1..)
                .find(|col| !BUDGET_VALUE_COLUMNS.contains(col))
                .unwrap_or(found.col + 1);
            resolver.sheet().cell(found.row, col).as_text().map(|s| s.trim().to_string())
        });

    LineItem { label: field.label.to_string(), value, description }
}

/// Text of an "Other" label after the "Other" prefix, if anything is left.
fn other_description(label_text: &str) -> Option<String> {
    let rest = OTHER_PREFIX_RE.replace(label_text, "");
    let rest = rest.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn empty_record(layout: &SectionLayout) -> SectionRecord {
    SectionRecord {
        section_name: layout.name,
        line_items: layout.line_item_labels().map(|label| LineItem::new(label, None)).collect(),
        declared_total: None,
    }
}
