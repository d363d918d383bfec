// src/config.rs

/// Largest accepted gap between a declared section total and the sum of its line items.
/// Absorbs cent-level rounding in the source workbooks.
pub const DEFAULT_TOTAL_TOLERANCE: f64 = 0.01;

/// How many rows below a section header the line items are searched for.
pub const DEFAULT_SECTION_WINDOW: usize = 20;

/// Upper bound for the section window; a section never spans more rows than this.
pub const MAX_SECTION_WINDOW: usize = 1_000;

/// Environment override for the total tolerance.
pub const TOLERANCE_ENV_VAR: &str = "FINANCING_TOTAL_TOLERANCE";

/// Knobs for a single extraction run. Shared read-only across documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionConfig {
    pub total_tolerance: f64,
    pub section_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            total_tolerance: DEFAULT_TOTAL_TOLERANCE,
            section_window: DEFAULT_SECTION_WINDOW,
        }
    }
}

impl ExtractionConfig {
    /// Resolves the tolerance from (in order) the explicit value, the environment, the default.
    pub fn resolve(tolerance: Option<f64>, section_window: Option<usize>) -> Result<Self, String> {
        let total_tolerance = match tolerance {
            Some(t) => t,
            None => match std::env::var(TOLERANCE_ENV_VAR) {
                Ok(raw) => raw.trim().parse::<f64>().map_err(|_| {
                    format!("{} must be a number, got '{}'", TOLERANCE_ENV_VAR, raw)
                })?,
                Err(_) => DEFAULT_TOTAL_TOLERANCE,
            },
        };

        if !total_tolerance.is_finite() || total_tolerance < 0.0 {
            return Err(format!("tolerance must be a non-negative number, got {}", total_tolerance));
        }

        let section_window = section_window.unwrap_or(DEFAULT_SECTION_WINDOW);
        if section_window == 0 || section_window > MAX_SECTION_WINDOW {
            return Err(format!(
                "section window must be between 1 and {} rows, got {}",
                MAX_SECTION_WINDOW, section_window
            ));
        }

        tracing::debug!(
            "Extraction config: tolerance {}, section window {}",
            total_tolerance,
            section_window
        );
        Ok(Self { total_tolerance, section_window })
    }
}
