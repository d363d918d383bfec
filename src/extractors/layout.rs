// src/extractors/layout.rs

//! Fixed layout of the application workbook: which labels to look for and where.

use crate::models::SectionName;

// --- Sources & Uses Budget sheet ---
/// Column B holds the amounts in both financing sections.
pub const BUDGET_VALUE_COLUMNS: &[usize] = &[1];

// --- Application sheet ---
/// Labels sit in column D or G depending on the application round.
pub const APPLICATION_LABEL_COLUMNS: &[usize] = &[3, 6];
/// Values are in column AG; older forms put them in column L.
pub const APPLICATION_VALUE_COLUMNS: &[usize] = &[32, 11];

/// One enumerated line item and the label text(s) it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub search: &'static [&'static str],
}

const fn field(label: &'static str, search: &'static [&'static str]) -> FieldSpec {
    FieldSpec { label, search }
}

/// Layout of one financing section.
#[derive(Debug, Clone, Copy)]
pub struct SectionLayout {
    pub name: SectionName,
    pub header: &'static str,
    /// Line items in document order, excluding "Other".
    pub fields: &'static [FieldSpec],
    pub other: FieldSpec,
    pub total: FieldSpec,
}

pub const OTHER_LABEL: &str = "Other";

pub const CONSTRUCTION_LAYOUT: SectionLayout = SectionLayout {
    name: SectionName::Construction,
    header: "CONSTRUCTION INTEREST & FEES",
    fields: &[
        field("Construction Loan Interest", &["Construction Loan Interest"]),
        field("Origination Fee", &["Origination Fee"]),
        field(
            "Credit Enhancement/Application Fee",
            &["Credit Enhancement/Application Fee", "Credit Enhancement"],
        ),
        field("Bond Premium", &["Bond Premium"]),
        field("Cost of Issuance", &["Cost of Issuance"]),
        field("Title & Recording", &["Title & Recording", "Title and Recording"]),
        field("Taxes", &["Taxes"]),
        field("Insurance", &["Insurance"]),
    ],
    other: field(OTHER_LABEL, &["Other"]),
    total: field(
        "Total Construction Interest & Fees",
        &["Total Construction Interest & Fees", "Total Construction Interest"],
    ),
};

pub const PERMANENT_LAYOUT: SectionLayout = SectionLayout {
    name: SectionName::Permanent,
    header: "PERMANENT FINANCING",
    fields: &[
        field("Loan Origination Fee", &["Loan Origination Fee"]),
        field(
            "Credit Enhancement/Application Fee",
            &["Credit Enhancement/Application Fee", "Credit Enhancement"],
        ),
        field("Title & Recording", &["Title & Recording", "Title and Recording"]),
        field("Taxes", &["Taxes"]),
        field("Insurance", &["Insurance"]),
    ],
    other: field(OTHER_LABEL, &["Other"]),
    total: field(
        "Total Permanent Financing",
        &["Total Permanent Financing"],
    ),
};

impl SectionLayout {
    pub fn for_section(name: SectionName) -> &'static SectionLayout {
        match name {
            SectionName::Construction => &CONSTRUCTION_LAYOUT,
            SectionName::Permanent => &PERMANENT_LAYOUT,
        }
    }

    /// Display labels of every line item, "Other" last.
    pub fn line_item_labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.label).chain(std::iter::once(self.other.label))
    }
}

// --- Project facts ---
pub const UNIT_COUNT_LABEL: &str = "Total number of units";
pub const UNIT_COUNT_EXCLUDE: &[&str] = &["excluding managers"];
pub const SQUARE_FOOTAGE_LABEL: &str = "Total square footage of all project structures";
pub const NEW_CONSTRUCTION_LABEL: &str = "Total New Construction Costs";
/// Heading of the budget block whose total row serves as a last resort for hard costs.
pub const NEW_CONSTRUCTION_HEADER: &str = "NEW CONSTRUCTION";
