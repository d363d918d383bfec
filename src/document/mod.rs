// src/document/mod.rs

//! In-memory view of an application workbook.
//!
//! A [`Document`] is read once and is immutable afterwards; every extractor borrows it.

pub mod resolver;

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::utils::error::ExtractError;

pub use resolver::{CellResolver, LabelQuery};

/// File stem of the workbook, used to name its results and errors.
pub fn source_identifier(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A single cell value as seen by the extractors.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(String),
}

impl Cell {
    /// Numeric value of the cell.
    ///
    /// Text is accepted only when the trimmed text is a plain number; currency symbols and
    /// thousands separators are not stripped.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text of the cell, if it holds a non-blank string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::Error(e) => Cell::Error(format!("#{:?}", e)),
            // Date serials are still numbers to the layout; nothing here reads dates.
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

/// Line-indexed grid of one worksheet. Row and column indices are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    pub name: String,
    rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

impl SheetView {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Number of rows in the view (trailing rows beyond the data are implicitly empty).
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Which of the two layout sheets a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRole {
    /// The "Application" tab holding project facts.
    Application,
    /// The "Sources & Uses Budget" tab holding both financing sections.
    Budget,
}

impl SheetRole {
    fn matches(self, sheet_name: &str) -> bool {
        let name = sheet_name.trim().to_lowercase();
        match self {
            SheetRole::Application => name == "application",
            SheetRole::Budget => name.contains("sources") && name.contains("uses"),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            SheetRole::Application => "Application",
            SheetRole::Budget => "Sources & Uses Budget",
        }
    }
}

/// A parsed workbook with the two sheets the layout relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    application: SheetView,
    budget: SheetView,
}

impl Document {
    /// Builds a document from already-loaded sheets.
    ///
    /// Fails with `DocumentUnreadable` when either the Application or the
    /// Sources & Uses sheet is missing. The first sheet matching each role wins.
    pub fn from_sheets(source_id: &str, sheets: Vec<SheetView>) -> Result<Self, ExtractError> {
        let mut application = None;
        let mut budget = None;

        for sheet in sheets {
            if budget.is_none() && SheetRole::Budget.matches(&sheet.name) {
                budget = Some(sheet);
            } else if application.is_none() && SheetRole::Application.matches(&sheet.name) {
                application = Some(sheet);
            }
        }

        let missing = |role: SheetRole| ExtractError::DocumentUnreadable {
            source_id: source_id.to_string(),
            reason: format!("could not find '{}' sheet", role.describe()),
        };

        Ok(Self {
            budget: budget.ok_or_else(|| missing(SheetRole::Budget))?,
            application: application.ok_or_else(|| missing(SheetRole::Application))?,
        })
    }

    /// Opens a workbook from disk (xlsx, xls, xlsb, ods) and loads the relevant sheets.
    /// Errors name the document by its [`source_identifier`].
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let source_id = source_identifier(path);
        let unreadable = |reason: String| ExtractError::DocumentUnreadable {
            source_id: source_id.clone(),
            reason,
        };

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| unreadable(format!("failed to open workbook: {}", e)))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        tracing::debug!("Workbook {} has sheets: {:?}", source_id, sheet_names);

        let mut sheets = Vec::new();
        for name in sheet_names {
            // Only the two layout sheets are materialized; the rest of the workbook is ignored.
            if !SheetRole::Budget.matches(&name) && !SheetRole::Application.matches(&name) {
                continue;
            }
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| unreadable(format!("failed to read sheet '{}': {}", name, e)))?;

            // Range data may not begin at A1; pad so indices stay absolute.
            let (start_row, start_col) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
            for row in range.rows() {
                let mut cells = vec![Cell::Empty; start_col];
                cells.extend(row.iter().map(Cell::from));
                rows.push(cells);
            }
            sheets.push(SheetView::new(name, rows));
        }

        Self::from_sheets(&source_id, sheets)
    }

    pub fn sheet(&self, role: SheetRole) -> &SheetView {
        match role {
            SheetRole::Application => &self.application,
            SheetRole::Budget => &self.budget,
        }
    }
}
