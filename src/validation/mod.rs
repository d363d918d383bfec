// src/validation/mod.rs

//! Consistency checks over extracted sections and project facts.
//!
//! Nothing here fails: every problem becomes a [`Finding`] and all of them are returned.

use crate::models::{
    Finding, FindingCode, FindingContext, ProjectFact, ProjectFacts, SectionRecord, Severity,
};

/// Checks both section totals and the completeness of the project facts.
///
/// Findings are ordered: construction total, permanent total, then missing facts in the
/// order unit count, square footage, new construction total.
pub fn validate(
    construction: &SectionRecord,
    permanent: &SectionRecord,
    facts: &ProjectFacts,
    tolerance: f64,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    findings.extend(check_section_total(construction, tolerance));
    findings.extend(check_section_total(permanent, tolerance));

    findings.extend(
        ProjectFact::ALL
            .into_iter()
            .filter(|fact| !fact.is_present(facts))
            .map(missing_fact),
    );

    findings
}

/// Declared total against the sum of the present line items.
pub fn check_section_total(record: &SectionRecord, tolerance: f64) -> Option<Finding> {
    let section = record.section_name;

    let Some(declared) = record.declared_total else {
        return Some(Finding {
            severity: Severity::Warning,
            code: FindingCode::SectionTotalMissing,
            message: format!("{}: total not found", section),
            context: FindingContext::Section(section),
        });
    };

    let line_sum = record.line_item_sum();
    let discrepancy = (declared - line_sum).abs();
    if discrepancy > tolerance {
        return Some(Finding {
            severity: Severity::Error,
            code: FindingCode::SectionTotalMismatch,
            message: format!(
                "{}: Total ({}) does not match sum of line items ({}); off by {}",
                section,
                format_amount(declared),
                format_amount(line_sum),
                format_amount(discrepancy)
            ),
            context: FindingContext::Section(section),
        });
    }

    None
}

fn missing_fact(fact: ProjectFact) -> Finding {
    Finding {
        severity: Severity::Warning,
        code: FindingCode::ProjectFactMissing,
        message: format!("{} not found", fact),
        context: FindingContext::Fact(fact),
    }
}

/// Renders an amount with thousands separators and two decimals, e.g. `1,234.50`.
pub fn format_amount(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOTAL_TOLERANCE;
    use crate::models::{LineItem, SectionName};

    fn section(name: SectionName, values: &[Option<f64>], total: Option<f64>) -> SectionRecord {
        SectionRecord {
            section_name: name,
            line_items: values
                .iter()
                .enumerate()
                .map(|(i, v)| LineItem::new(format!("Item {}", i), *v))
                .collect(),
            declared_total: total,
        }
    }

    fn complete_facts() -> ProjectFacts {
        ProjectFacts {
            unit_count: Some(50),
            square_footage: Some(40_000.0),
            new_construction_total: Some(2_000_000.0),
        }
    }

    #[test]
    fn test_exact_totals_produce_no_findings() {
        let construction = section(SectionName::Construction, &[Some(100.0), Some(50.0), None], Some(150.0));
        let permanent = section(SectionName::Permanent, &[Some(0.0), Some(25.5)], Some(25.5));
        let findings = validate(&construction, &permanent, &complete_facts(), DEFAULT_TOTAL_TOLERANCE);
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_rounding_within_tolerance_is_accepted() {
        let construction = section(SectionName::Construction, &[Some(0.1), Some(0.2)], Some(0.3));
        assert_eq!(check_section_total(&construction, DEFAULT_TOTAL_TOLERANCE), None);
        let near = section(SectionName::Construction, &[Some(100.0)], Some(100.009));
        assert_eq!(check_section_total(&near, DEFAULT_TOTAL_TOLERANCE), None);
    }

    #[test]
    fn test_mismatch_is_single_error_naming_section() {
        let construction = section(SectionName::Construction, &[Some(100.0)], Some(100.0));
        let permanent = section(SectionName::Permanent, &[Some(1_000.0), Some(234.5)], Some(2_000.0));
        let findings = validate(&construction, &permanent, &complete_facts(), DEFAULT_TOTAL_TOLERANCE);

        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.code, FindingCode::SectionTotalMismatch);
        assert_eq!(finding.context, FindingContext::Section(SectionName::Permanent));
        assert_eq!(
            finding.message,
            "Permanent Financing: Total (2,000.00) does not match sum of line items (1,234.50); off by 765.50"
        );
    }

    #[test]
    fn test_missing_total_is_warning() {
        let construction = section(SectionName::Construction, &[Some(100.0)], None);
        let finding = check_section_total(&construction, DEFAULT_TOTAL_TOLERANCE).unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.code, FindingCode::SectionTotalMissing);
        assert_eq!(finding.context, FindingContext::Section(SectionName::Construction));
    }

    #[test]
    fn test_one_warning_per_missing_fact_in_order() {
        let construction = section(SectionName::Construction, &[Some(1.0)], Some(1.0));
        let permanent = section(SectionName::Permanent, &[Some(1.0)], Some(1.0));

        let facts = ProjectFacts { unit_count: None, square_footage: Some(10.0), new_construction_total: None };
        let findings = validate(&construction, &permanent, &facts, DEFAULT_TOTAL_TOLERANCE);
        let contexts: Vec<_> = findings.iter().map(|f| f.context).collect();
        assert_eq!(
            contexts,
            vec![
                FindingContext::Fact(ProjectFact::UnitCount),
                FindingContext::Fact(ProjectFact::NewConstructionTotal),
            ]
        );
        assert!(findings.iter().all(|f| f.severity == Severity::Warning
            && f.code == FindingCode::ProjectFactMissing));

        let findings = validate(&construction, &permanent, &ProjectFacts::default(), DEFAULT_TOTAL_TOLERANCE);
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_full_ordering() {
        let construction = section(SectionName::Construction, &[Some(1.0)], Some(5.0));
        let permanent = section(SectionName::Permanent, &[Some(1.0)], None);
        let findings = validate(&construction, &permanent, &ProjectFacts::default(), DEFAULT_TOTAL_TOLERANCE);
        let codes: Vec<_> = findings.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec![
                FindingCode::SectionTotalMismatch,
                FindingCode::SectionTotalMissing,
                FindingCode::ProjectFactMissing,
                FindingCode::ProjectFactMissing,
                FindingCode::ProjectFactMissing,
            ]
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-42_000.5), "-42,000.50");
    }
}
