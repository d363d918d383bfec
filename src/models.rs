// src/models.rs

//! Records produced by one extraction run.
//!
//! Every numeric field is an `Option<f64>`: `None` means "not found / not computable",
//! which is never the same thing as a zero cost.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two financing-cost sections of the Sources & Uses budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionName {
    Construction,
    Permanent,
}

impl SectionName {
    /// Heading as printed in the workbook and in findings.
    pub fn title(self) -> &'static str {
        match self {
            SectionName::Construction => "Construction Interest & Fees",
            SectionName::Permanent => "Permanent Financing",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub value: Option<f64>,
    /// Free-text description; only ever set on the "Other" entry.
    pub description: Option<String>,
}

impl LineItem {
    pub fn new(label: impl Into<String>, value: Option<f64>) -> Self {
        Self { label: label.into(), value, description: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub section_name: SectionName,
    /// Fixed, ordered set of line items for the section.
    pub line_items: Vec<LineItem>,
    pub declared_total: Option<f64>,
}

impl SectionRecord {
    /// Sum of the present line items. Absent items contribute nothing.
    pub fn line_item_sum(&self) -> f64 {
        self.line_items.iter().filter_map(|item| item.value).sum()
    }

    pub fn line_item(&self, label: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.label == label)
    }

    pub fn present_count(&self) -> usize {
        self.line_items.iter().filter(|item| item.value.is_some()).count()
    }
}

/// The three cross-cutting facts feeding the derived metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFacts {
    pub unit_count: Option<u32>,
    pub square_footage: Option<f64>,
    pub new_construction_total: Option<f64>,
}

/// Names a single project fact, for findings and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectFact {
    UnitCount,
    SquareFootage,
    NewConstructionTotal,
}

impl ProjectFact {
    pub const ALL: [ProjectFact; 3] = [
        ProjectFact::UnitCount,
        ProjectFact::SquareFootage,
        ProjectFact::NewConstructionTotal,
    ];

    pub fn description(self) -> &'static str {
        match self {
            ProjectFact::UnitCount => "Total units",
            ProjectFact::SquareFootage => "Total square footage",
            ProjectFact::NewConstructionTotal => "New Construction total",
        }
    }

    pub fn is_present(self, facts: &ProjectFacts) -> bool {
        match self {
            ProjectFact::UnitCount => facts.unit_count.is_some(),
            ProjectFact::SquareFootage => facts.square_footage.is_some(),
            ProjectFact::NewConstructionTotal => facts.new_construction_total.is_some(),
        }
    }
}

impl fmt::Display for ProjectFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingCode {
    SectionTotalMismatch,
    SectionTotalMissing,
    ProjectFactMissing,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingContext {
    Section(SectionName),
    Fact(ProjectFact),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    pub context: FindingContext,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Combined financing cost and the ratios derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancingMetrics {
    pub combined_financing_cost: Option<f64>,
    pub cost_per_unit: Option<f64>,
    pub cost_per_sf: Option<f64>,
    /// Fraction of hard costs (0.10 is ten percent).
    pub cost_pct_hard_costs: Option<f64>,
}

/// Everything extracted from one workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub source_identifier: String,
    pub construction_section: SectionRecord,
    pub permanent_section: SectionRecord,
    pub project_facts: ProjectFacts,
    pub combined_financing_cost: Option<f64>,
    pub cost_per_unit: Option<f64>,
    pub cost_per_sf: Option<f64>,
    pub cost_pct_hard_costs: Option<f64>,
    pub findings: Vec<Finding>,
}

impl ExtractionResult {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn section(&self, name: SectionName) -> &SectionRecord {
        match name {
            SectionName::Construction => &self.construction_section,
            SectionName::Permanent => &self.permanent_section,
        }
    }
}
