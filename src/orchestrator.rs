// src/orchestrator.rs

//! Per-document pipeline: sections and facts in, validated result with metrics out.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::task::JoinSet;

use crate::config::ExtractionConfig;
use crate::document::{source_identifier, Document};
use crate::extractors::{ProjectFactsExtractor, SectionExtractor};
use crate::metrics;
use crate::models::{ExtractionResult, SectionName};
use crate::utils::error::ExtractError;
use crate::validation;

/// What happened to one document of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DocumentOutcome {
    Extracted(ExtractionResult),
    Failed { source_identifier: String, reason: String },
}

impl DocumentOutcome {
    pub fn source_identifier(&self) -> &str {
        match self {
            DocumentOutcome::Extracted(result) => &result.source_identifier,
            DocumentOutcome::Failed { source_identifier, .. } => source_identifier,
        }
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            DocumentOutcome::Extracted(result) => Some(result),
            DocumentOutcome::Failed { .. } => None,
        }
    }
}

/// Stateless; one instance can serve any number of documents, from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionOrchestrator {
    config: ExtractionConfig,
    sections: SectionExtractor,
    facts: ProjectFactsExtractor,
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl ExtractionOrchestrator {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            sections: SectionExtractor::new(config.section_window),
            facts: ProjectFactsExtractor::new(),
        }
    }

    /// Runs the full pipeline over an opened document. Missing data never fails here;
    /// it shows up as findings and absent values.
    pub fn run(&self, document: &Document, source_identifier: &str) -> ExtractionResult {
        let construction = self.sections.extract(document, SectionName::Construction);
        let permanent = self.sections.extract(document, SectionName::Permanent);
        let facts = self.facts.extract(document);

        let findings = validation::validate(&construction, &permanent, &facts, self.config.total_tolerance);
        let metrics = metrics::compute(construction.declared_total, permanent.declared_total, &facts);

        let result = ExtractionResult {
            source_identifier: source_identifier.to_string(),
            construction_section: construction,
            permanent_section: permanent,
            project_facts: facts,
            combined_financing_cost: metrics.combined_financing_cost,
            cost_per_unit: metrics.cost_per_unit,
            cost_per_sf: metrics.cost_per_sf,
            cost_pct_hard_costs: metrics.cost_pct_hard_costs,
            findings,
        };
        log_findings(&result);
        result
    }

    /// Opens the workbook at `path` and runs it. The source identifier is the file stem.
    pub fn run_path(&self, path: &Path) -> Result<ExtractionResult, ExtractError> {
        tracing::info!("Parsing: {}", path.display());
        let document = Document::open(path)?;
        Ok(self.run(&document, &source_identifier(path)))
    }

    /// Processes every workbook on tokio's blocking pool, one task per document.
    ///
    /// A document that cannot be read becomes a [`DocumentOutcome::Failed`]; the rest of the
    /// batch is unaffected. Outcomes come back in input order.
    pub async fn run_batch(&self, paths: Vec<PathBuf>) -> Vec<DocumentOutcome> {
        let sources: Vec<String> = paths.iter().map(|p| source_identifier(p)).collect();
        let mut tasks = JoinSet::new();

        for (idx, path) in paths.into_iter().enumerate() {
            let orchestrator = *self;
            tasks.spawn_blocking(move || (idx, orchestrator.run_path(&path)));
        }

        let mut slots: Vec<Option<DocumentOutcome>> = vec![None; sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(result))) => slots[idx] = Some(DocumentOutcome::Extracted(result)),
                Ok((idx, Err(e))) => {
                    tracing::error!("Error parsing {}: {}", sources[idx], e);
                    slots[idx] = Some(DocumentOutcome::Failed {
                        source_identifier: sources[idx].clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => tracing::error!("Extraction task failed: {}", e),
            }
        }

        // A slot is only empty if its task panicked; report it rather than drop it.
        slots
            .into_iter()
            .zip(sources)
            .map(|(slot, source)| {
                slot.unwrap_or_else(|| DocumentOutcome::Failed {
                    reason: format!("extraction of '{}' was aborted", source),
                    source_identifier: source,
                })
            })
            .collect()
    }
}

fn log_findings(result: &ExtractionResult) {
    let errors: Vec<String> = result.errors().map(|f| f.message.clone()).collect();
    let warnings: Vec<String> = result.warnings().map(|f| f.message.clone()).collect();
    if !errors.is_empty() {
        tracing::warn!("{}: ERRORS: {}", result.source_identifier, errors.join(", "));
    }
    if !warnings.is_empty() {
        tracing::info!("{}: WARNINGS: {}", result.source_identifier, warnings.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, SheetView};
    use crate::models::{FindingCode, FindingContext, Severity};

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn row(label: &str, value: f64) -> Vec<Cell> {
        vec![text(label), Cell::Number(value)]
    }

    fn app_row(label: &str, value: f64) -> Vec<Cell> {
        let mut cells = vec![Cell::Empty; 33];
        cells[3] = text(label);
        cells[32] = Cell::Number(value);
        cells
    }

    fn budget_rows(with_permanent_total: bool) -> Vec<Vec<Cell>> {
        let mut rows = vec![
            vec![text("CONSTRUCTION INTEREST & FEES")],
            row("Construction Loan Interest", 90_000.0),
            row("Origination Fee", 15_000.0),
            row("Credit Enhancement/Application Fee", 5_000.0),
            row("Bond Premium", 0.0),
            row("Cost of Issuance", 20_000.0),
            row("Title & Recording", 5_000.0),
            row("Taxes", 5_000.0),
            row("Insurance", 7_500.0),
            row("Other: Lender legal", 2_500.0),
            row("Total Construction Interest & Fees", 150_000.0),
            vec![],
            vec![text("PERMANENT FINANCING")],
            row("Loan Origination Fee", 30_000.0),
            row("Credit Enhancement/Application Fee", 10_000.0),
            row("Title & Recording", 4_000.0),
            row("Taxes", 2_000.0),
            row("Insurance", 3_000.0),
            row("Other", 1_000.0),
        ];
        if with_permanent_total {
            rows.push(row("Total Permanent Financing Costs", 50_000.0));
        }
        rows.push(vec![]);
        rows.push(row("Total New Construction Costs", 2_000_000.0));
        rows
    }

    fn document(with_permanent_total: bool) -> Document {
        Document::from_sheets(
            "synthetic",
            vec![
                SheetView::new(
                    "Application",
                    vec![
                        app_row("Total number of units:", 50.0),
                        app_row("Total square footage of all project structures (excluding commercial/retail):", 40_000.0),
                    ],
                ),
                SheetView::new("Sources & Uses Budget", budget_rows(with_permanent_total)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_metrics() {
        let result = ExtractionOrchestrator::default().run(&document(true), "synthetic");

        assert_eq!(result.source_identifier, "synthetic");
        assert_eq!(result.construction_section.declared_total, Some(150_000.0));
        assert_eq!(result.permanent_section.declared_total, Some(50_000.0));
        assert_eq!(result.combined_financing_cost, Some(200_000.0));
        assert_eq!(result.cost_per_unit, Some(4_000.0));
        assert_eq!(result.cost_per_sf, Some(5.0));
        assert_eq!(result.cost_pct_hard_costs, Some(0.10));
        assert!(!result.has_errors());
        assert!(result.findings.is_empty(), "unexpected findings: {:?}", result.findings);
    }

    #[test]
    fn test_missing_permanent_total() {
        let result = ExtractionOrchestrator::default().run(&document(false), "no-perm-total");

        assert_eq!(result.construction_section.declared_total, Some(150_000.0));
        assert_eq!(result.permanent_section.declared_total, None);
        assert_eq!(result.combined_financing_cost, None);
        assert_eq!(result.cost_per_unit, None);
        assert!(!result.has_errors());

        let warnings: Vec<_> = result.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, FindingCode::SectionTotalMissing);
        assert_eq!(warnings[0].context, FindingContext::Section(SectionName::Permanent));
    }

    #[test]
    fn test_mismatched_total_is_reported_not_raised() {
        let mut rows = budget_rows(true);
        rows[1] = row("Construction Loan Interest", 91_000.0);
        let doc = Document::from_sheets(
            "mismatch",
            vec![SheetView::new("Application", vec![]), SheetView::new("Sources & Uses Budget", rows)],
        )
        .unwrap();

        let result = ExtractionOrchestrator::default().run(&doc, "mismatch");
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].context, FindingContext::Section(SectionName::Construction));
        // Metrics still use the declared totals.
        assert_eq!(result.combined_financing_cost, Some(200_000.0));
        assert_eq!(result.cost_per_unit, None);
        assert_eq!(result.warnings().count(), 2);
        assert!(result.warnings().all(|f| f.severity == Severity::Warning));
    }

    #[test]
    fn test_idempotent() {
        let doc = document(true);
        let orchestrator = ExtractionOrchestrator::default();
        assert_eq!(orchestrator.run(&doc, "same"), orchestrator.run(&doc, "same"));
    }

    #[test]
    fn test_source_identifier_is_file_stem() {
        assert_eq!(source_identifier(Path::new("applications/CA-25-401.xlsx")), "CA-25-401");
    }

    #[test]
    fn test_batch_isolates_unreadable_documents() {
        let orchestrator = ExtractionOrchestrator::default();
        let outcomes = tokio_test::block_on(
            orchestrator.run_batch(vec![PathBuf::from("/missing/a.xlsx"), PathBuf::from("/missing/b.xlsx")]),
        );
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].source_identifier(), "a");
        assert_eq!(outcomes[1].source_identifier(), "b");
        assert!(outcomes.iter().all(|o| o.result().is_none()));
    }
}
