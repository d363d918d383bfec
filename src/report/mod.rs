// src/report/mod.rs

//! Summary workbook: one row per application, problems highlighted.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};

use crate::extractors::layout::{SectionLayout, OTHER_LABEL};
use crate::models::{ExtractionResult, SectionName, SectionRecord};
use crate::orchestrator::DocumentOutcome;
use crate::utils::error::ReportError;

const SUMMARY_SHEET: &str = "Summary";
const FAILURES_SHEET: &str = "Failures";
const MAX_COLUMN_WIDTH: usize = 50;

const ERROR_FILL: u32 = 0xFFC7CE;
const WARNING_FILL: u32 = 0xFFEB9C;

/// How a value is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Text,
    Currency,
    Count,
    Decimal,
    Percent,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Number(Option<f64>),
}

impl Value {
    fn display_len(&self) -> usize {
        match self {
            Value::Text(s) => s.chars().count(),
            // "$1,234,567.89" style
            Value::Number(Some(n)) => format!("{:.2}", n).len() + 4,
            Value::Number(None) => 0,
        }
    }
}

/// Row status, deciding the fill.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Clean,
    Warnings,
    Errors,
}

impl Status {
    fn of(result: &ExtractionResult) -> Self {
        if result.has_errors() {
            Status::Errors
        } else if result.warnings().next().is_some() {
            Status::Warnings
        } else {
            Status::Clean
        }
    }
}

struct Column {
    header: String,
    kind: Kind,
    extract: Box<dyn Fn(&ExtractionResult) -> Value>,
}

fn column(header: impl Into<String>, kind: Kind, extract: impl Fn(&ExtractionResult) -> Value + 'static) -> Column {
    Column { header: header.into(), kind, extract: Box::new(extract) }
}

fn section_columns(section: SectionName, suffix: &str) -> Vec<Column> {
    let layout = SectionLayout::for_section(section);
    let mut columns = Vec::new();

    for label in layout.line_item_labels() {
        columns.push(column(format!("{} ({})", label, suffix), Kind::Currency, move |r| {
            Value::Number(r.section(section).line_item(label).and_then(|item| item.value))
        }));
        if label == OTHER_LABEL {
            columns.push(column(format!("Other Description ({})", suffix), Kind::Text, move |r| {
                Value::Text(other_description(r.section(section)))
            }));
        }
    }

    columns.push(column(layout.total.label, Kind::Currency, move |r| {
        Value::Number(r.section(section).declared_total)
    }));
    columns
}

fn other_description(record: &SectionRecord) -> String {
    record
        .line_item(OTHER_LABEL)
        .and_then(|item| item.description.clone())
        .unwrap_or_default()
}

fn summary_columns() -> Vec<Column> {
    let mut columns = vec![column("Application Name", Kind::Text, |r| {
        Value::Text(r.source_identifier.clone())
    })];
    columns.extend(section_columns(SectionName::Construction, "Const"));
    columns.extend(section_columns(SectionName::Permanent, "Perm"));
    columns.extend([
        column("Combined Financing Costs", Kind::Currency, |r| Value::Number(r.combined_financing_cost)),
        column("Total Units", Kind::Count, |r| Value::Number(r.project_facts.unit_count.map(f64::from))),
        column("Total Square Feet", Kind::Decimal, |r| Value::Number(r.project_facts.square_footage)),
        column("New Construction Total", Kind::Currency, |r| Value::Number(r.project_facts.new_construction_total)),
        column("Financing Costs per Unit", Kind::Currency, |r| Value::Number(r.cost_per_unit)),
        column("Financing Costs per SF", Kind::Currency, |r| Value::Number(r.cost_per_sf)),
        column("Financing Costs % of Hard Costs", Kind::Percent, |r| Value::Number(r.cost_pct_hard_costs)),
        column("Validation Errors", Kind::Text, |r| {
            Value::Text(r.errors().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; "))
        }),
        column("Validation Warnings", Kind::Text, |r| {
            Value::Text(r.warnings().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; "))
        }),
    ]);
    columns
}

fn cell_format(kind: Kind, status: Status) -> Format {
    let format = match kind {
        Kind::Text => Format::new(),
        Kind::Currency => Format::new().set_num_format("$#,##0.00"),
        Kind::Count => Format::new().set_num_format("#,##0"),
        Kind::Decimal => Format::new().set_num_format("#,##0.##"),
        Kind::Percent => Format::new().set_num_format("0.00%"),
    };
    match status {
        Status::Clean => format,
        Status::Warnings => format.set_background_color(Color::RGB(WARNING_FILL)),
        Status::Errors => format
            .set_background_color(Color::RGB(ERROR_FILL))
            .set_font_color(Color::RGB(0x9C0006)),
    }
}

fn header_format() -> Format {
    Format::new().set_bold().set_border_bottom(FormatBorder::Thin)
}

/// Writes the batch to an `.xlsx` report: a "Summary" sheet with one row per extracted
/// application and, when any document failed, a "Failures" sheet listing them.
///
/// Missing values are left blank. Rows with Error findings are filled red, rows with only
/// warnings yellow.
pub fn write_summary_report(outcomes: &[DocumentOutcome], path: &Path) -> Result<usize, ReportError> {
    let results: Vec<&ExtractionResult> = outcomes.iter().filter_map(DocumentOutcome::result).collect();
    let failures: Vec<(&str, &str)> = outcomes
        .iter()
        .filter_map(|o| match o {
            DocumentOutcome::Failed { source_identifier, reason } => {
                Some((source_identifier.as_str(), reason.as_str()))
            }
            DocumentOutcome::Extracted(_) => None,
        })
        .collect();

    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet().set_name(SUMMARY_SHEET)?;
    write_summary_sheet(worksheet, &results)?;

    if !failures.is_empty() {
        let worksheet = workbook.add_worksheet().set_name(FAILURES_SHEET)?;
        write_failures_sheet(worksheet, &failures)?;
    }

    workbook.save(path)?;
    tracing::info!("Summary report saved to: {}", path.display());
    Ok(results.len())
}

fn write_summary_sheet(worksheet: &mut Worksheet, results: &[&ExtractionResult]) -> Result<(), ReportError> {
    let columns = summary_columns();
    let header = header_format();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.header.chars().count()).collect();

    for (col, spec) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, &spec.header, &header)?;
    }

    for (idx, &result) in results.iter().enumerate() {
        let row = idx as u32 + 1;
        let status = Status::of(result);

        for (col, spec) in columns.iter().enumerate() {
            let col16 = col as u16;
            let format = cell_format(spec.kind, status);
            let value = (spec.extract)(result);
            widths[col] = widths[col].max(value.display_len());

            match value {
                Value::Text(s) if !s.is_empty() => {
                    worksheet.write_string_with_format(row, col16, &s, &format)?;
                }
                Value::Number(Some(n)) => {
                    worksheet.write_number_with_format(row, col16, n, &format)?;
                }
                // Blank keeps the row fill without inventing a value.
                Value::Text(_) | Value::Number(None) => {
                    worksheet.write_blank(row, col16, &format)?;
                }
            }
        }
    }

    for (col, width) in widths.into_iter().enumerate() {
        worksheet.set_column_width(col as u16, (width + 2).min(MAX_COLUMN_WIDTH) as f64)?;
    }
    worksheet.set_freeze_panes(1, 1)?;
    Ok(())
}

fn write_failures_sheet(worksheet: &mut Worksheet, failures: &[(&str, &str)]) -> Result<(), ReportError> {
    let header = header_format();
    worksheet.write_string_with_format(0, 0, "Application Name", &header)?;
    worksheet.write_string_with_format(0, 1, "Reason", &header)?;

    let fill = cell_format(Kind::Text, Status::Errors);
    for (idx, (source, reason)) in failures.iter().enumerate() {
        let row = idx as u32 + 1;
        worksheet.write_string_with_format(row, 0, *source, &fill)?;
        worksheet.write_string_with_format(row, 1, *reason, &fill)?;
    }

    worksheet.set_column_width(0, 30)?;
    worksheet.set_column_width(1, MAX_COLUMN_WIDTH as f64)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_columns_cover_every_field() {
        let headers: Vec<String> = summary_columns().into_iter().map(|c| c.header).collect();
        // name + (9 items + description + total) + (6 items + description + total) + 9 trailing
        assert_eq!(headers.len(), 1 + 11 + 8 + 9);
        assert_eq!(headers[0], "Application Name");
        assert!(headers.contains(&"Taxes (Const)".to_string()));
        assert!(headers.contains(&"Taxes (Perm)".to_string()));
        assert!(headers.contains(&"Other Description (Perm)".to_string()));
        assert!(headers.contains(&"Total Construction Interest & Fees".to_string()));
        assert!(headers.contains(&"Total Permanent Financing".to_string()));
        assert_eq!(headers.last().unwrap(), "Validation Warnings");
    }

    #[test]
    fn test_write_report_with_failures() {
        let outcomes = vec![DocumentOutcome::Failed {
            source_identifier: "broken".into(),
            reason: "Document 'broken' is unreadable: failed to open workbook".into(),
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");

        let written = write_summary_report(&outcomes, &path).unwrap();
        assert_eq!(written, 0);
        assert!(std::fs::metadata(&path).unwrap().len() > 100);
    }
}
