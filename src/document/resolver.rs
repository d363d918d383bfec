// src/document/resolver.rs

//! Label-based cell lookup.
//!
//! Workbooks drift a little between application rounds (rows inserted, labels reworded
//! slightly), so values are located by the text of their row label rather than by fixed
//! coordinates. Every lookup here is a pure function over a [`SheetView`].

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Cell, Document, SheetRole, SheetView};

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

/// Column A, where both financing sections print their labels.
pub const DEFAULT_LABEL_COLUMN: usize = 0;

/// Trims, case-folds and collapses internal whitespace.
pub fn normalize_label(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// A semantic reference to a row: which label to look for, where, and which columns
/// hold its value.
#[derive(Debug, Clone)]
pub struct LabelQuery<'a> {
    label: &'a str,
    exclude: &'a [&'a str],
    label_columns: &'a [usize],
    value_columns: &'a [usize],
    rows: Option<Range<usize>>,
    prefer_exact: bool,
}

impl<'a> LabelQuery<'a> {
    /// Looks for `label` in column A and reads the value from `value_column`.
    pub fn new(label: &'a str, value_columns: &'a [usize]) -> Self {
        Self {
            label,
            exclude: &[],
            label_columns: &[DEFAULT_LABEL_COLUMN],
            value_columns,
            rows: None,
            prefer_exact: false,
        }
    }

    /// Candidate label columns, tried left to right on each row.
    pub fn in_columns(mut self, label_columns: &'a [usize]) -> Self {
        self.label_columns = label_columns;
        self
    }

    /// Restricts the search to a row window.
    pub fn within(mut self, rows: Range<usize>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Rows whose label contains any of these phrases are skipped.
    pub fn excluding(mut self, phrases: &'a [&'a str]) -> Self {
        self.exclude = phrases;
        self
    }

    /// An exact match anywhere in the window wins over an earlier partial one.
    pub fn prefer_exact(mut self) -> Self {
        self.prefer_exact = true;
        self
    }
}

/// Position of a matched label cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    pub row: usize,
    pub col: usize,
}

/// Read-only lookups against one sheet.
#[derive(Debug, Clone, Copy)]
pub struct CellResolver<'d> {
    sheet: &'d SheetView,
}

impl<'d> CellResolver<'d> {
    pub fn new(sheet: &'d SheetView) -> Self {
        Self { sheet }
    }

    pub fn for_document(document: &'d Document, role: SheetRole) -> Self {
        Self::new(document.sheet(role))
    }

    pub fn sheet(&self) -> &'d SheetView {
        self.sheet
    }

    /// Finds the topmost row whose normalized label equals or contains `query`'s label.
    ///
    /// With [`LabelQuery::prefer_exact`], an exact match anywhere in the window is taken
    /// over an earlier partial one.
    pub fn find_label(&self, query: &LabelQuery<'_>) -> Option<LabelMatch> {
        let target = normalize_label(query.label);
        if target.is_empty() {
            return None;
        }
        let excluded: Vec<String> = query.exclude.iter().map(|p| normalize_label(p)).collect();

        let rows = query.rows.clone().unwrap_or(0..self.sheet.height());
        let end = rows.end.min(self.sheet.height());

        let mut partial: Option<LabelMatch> = None;
        for row in rows.start..end {
            for &col in query.label_columns {
                let Some(text) = self.sheet.cell(row, col).as_text() else {
                    continue;
                };
                let text = normalize_label(text);
                if !text.contains(&target) {
                    continue;
                }
                if excluded.iter().any(|phrase| text.contains(phrase.as_str())) {
                    tracing::trace!("Skipping '{}' at row {}: excluded phrase", text, row);
                    continue;
                }
                if text == target || !query.prefer_exact {
                    return Some(LabelMatch { row, col });
                }
                if partial.is_none() {
                    partial = Some(LabelMatch { row, col });
                }
            }
        }
        partial
    }

    /// First non-empty value cell on the matched row.
    pub fn resolve(&self, query: &LabelQuery<'_>) -> Option<&'d Cell> {
        let found = self.find_label(query)?;
        query
            .value_columns
            .iter()
            .map(|&col| self.sheet.cell(found.row, col))
            .find(|cell| !matches!(cell, Cell::Empty))
    }

    /// First numeric value on the matched row, trying value columns in order.
    pub fn resolve_number(&self, query: &LabelQuery<'_>) -> Option<f64> {
        let found = self.find_label(query)?;
        let value = query
            .value_columns
            .iter()
            .find_map(|&col| self.sheet.cell(found.row, col).as_number());
        if value.is_none() {
            tracing::debug!(
                "Label '{}' found on sheet '{}' row {} but no numeric value",
                query.label,
                self.sheet.name,
                found.row + 1
            );
        }
        value
    }

    /// Raw text of the label cell at `found`.
    pub fn label_text(&self, found: LabelMatch) -> Option<&'d str> {
        self.sheet.cell(found.row, found.col).as_text()
    }
}

/// Resolves `row_label` on the given sheet and returns the cell at `column`.
///
/// Absence (no matching label, or an empty value cell) is `None`, never an error.
pub fn resolve<'d>(
    document: &'d Document,
    sheet: SheetRole,
    row_label: &str,
    column: usize,
) -> Option<&'d Cell> {
    let columns = [column];
    CellResolver::for_document(document, sheet).resolve(&LabelQuery::new(row_label, &columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn budget_sheet() -> SheetView {
        SheetView::new(
            "Sources & Uses Budget",
            vec![
                vec![text("CONSTRUCTION INTEREST & FEES")],
                vec![text("  Construction   Loan Interest "), Cell::Number(100.0)],
                vec![text("Taxes"), Cell::Number(5.0)],
                vec![text("Total Construction Interest & Fees"), Cell::Number(105.0)],
                vec![text("PERMANENT FINANCING")],
                vec![text("Taxes"), Cell::Number(7.0)],
                vec![text("Property Taxes Reserve"), Cell::Number(1.0)],
            ],
        )
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Title &\tRecording\n "), "title & recording");
        assert_eq!(normalize_label("TOTAL"), "total");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn test_find_label_tolerates_spacing_and_case() {
        let sheet = budget_sheet();
        let resolver = CellResolver::new(&sheet);
        let query = LabelQuery::new("construction loan interest", &[1]);
        assert_eq!(resolver.resolve_number(&query), Some(100.0));
    }

    #[test]
    fn test_first_match_is_topmost() {
        let sheet = budget_sheet();
        let resolver = CellResolver::new(&sheet);
        assert_eq!(resolver.resolve_number(&LabelQuery::new("Taxes", &[1])), Some(5.0));
    }

    #[test]
    fn test_window_scopes_repeated_labels() {
        let sheet = budget_sheet();
        let resolver = CellResolver::new(&sheet);
        let query = LabelQuery::new("Taxes", &[1]).within(5..20);
        assert_eq!(resolver.resolve_number(&query), Some(7.0));
    }

    fn insurance_sheet() -> SheetView {
        SheetView::new(
            "s",
            vec![
                vec![text("Title Insurance"), Cell::Number(1.0)],
                vec![text("Insurance"), Cell::Number(2.0)],
            ],
        )
    }

    #[test]
    fn test_first_partial_match_wins_by_default() {
        let sheet = insurance_sheet();
        let resolver = CellResolver::new(&sheet);
        assert_eq!(resolver.resolve_number(&LabelQuery::new("Insurance", &[1])), Some(1.0));
    }

    #[test]
    fn test_prefer_exact_skips_earlier_partial_match() {
        let sheet = insurance_sheet();
        let resolver = CellResolver::new(&sheet);
        let query = LabelQuery::new("Insurance", &[1]).prefer_exact();
        assert_eq!(resolver.resolve_number(&query), Some(2.0));
        // Only a partial match available: it is still used.
        let query = LabelQuery::new("Title", &[1]).prefer_exact();
        assert_eq!(resolver.resolve_number(&query), Some(1.0));
    }

    #[test]
    fn test_document_level_resolve_is_first_match() {
        let budget = SheetView::new(
            "Sources and Uses",
            vec![
                vec![text("Title Insurance"), Cell::Number(1.0)],
                vec![text("Insurance"), Cell::Number(2.0)],
            ],
        );
        let doc = Document::from_sheets("doc", vec![budget, SheetView::new("Application", vec![])])
            .unwrap();
        assert_eq!(resolve(&doc, SheetRole::Budget, "insurance", 1), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn test_partial_match_and_exclusions() {
        let sheet = SheetView::new(
            "Application",
            vec![
                vec![Cell::Empty, Cell::Empty, Cell::Empty, text("Total number of units excluding managers' units"), Cell::Number(49.0)],
                vec![Cell::Empty, Cell::Empty, Cell::Empty, text("Total number of units:"), Cell::Number(50.0)],
            ],
        );
        let resolver = CellResolver::new(&sheet);
        let query = LabelQuery::new("Total number of units", &[4])
            .in_columns(&[3, 6])
            .excluding(&["excluding managers"]);
        assert_eq!(resolver.resolve_number(&query), Some(50.0));
    }

    #[test]
    fn test_value_columns_fall_back_in_order() {
        let sheet = SheetView::new(
            "s",
            vec![vec![text("Units"), Cell::Empty, text("n/a"), Cell::Number(12.0)]],
        );
        let resolver = CellResolver::new(&sheet);
        assert_eq!(resolver.resolve_number(&LabelQuery::new("units", &[1, 2, 3])), Some(12.0));
        assert_eq!(
            resolver.resolve(&LabelQuery::new("units", &[1, 2, 3])),
            Some(&text("n/a"))
        );
    }

    #[test]
    fn test_missing_label_is_none() {
        let sheet = budget_sheet();
        let resolver = CellResolver::new(&sheet);
        assert_eq!(resolver.find_label(&LabelQuery::new("Bond Premium", &[1])), None);
        assert_eq!(resolver.resolve_number(&LabelQuery::new("Bond Premium", &[1])), None);
    }

    #[test]
    fn test_document_level_resolve() {
        let doc = Document::from_sheets(
            "doc",
            vec![budget_sheet(), SheetView::new("Application", vec![])],
        )
        .unwrap();
        assert_eq!(
            resolve(&doc, SheetRole::Budget, "total construction interest", 1),
            Some(&Cell::Number(105.0))
        );
        assert_eq!(resolve(&doc, SheetRole::Application, "Taxes", 1), None);
    }
}
