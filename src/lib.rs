// src/lib.rs

//! Extraction, validation and derived metrics for the financing-cost sections of
//! housing tax-credit application workbooks.
//!
//! The core pipeline is [`orchestrator::ExtractionOrchestrator`]: it reads a [`Document`],
//! extracts the Construction Interest & Fees and Permanent Financing sections plus the
//! project facts, validates section totals, and derives cost ratios into an
//! [`ExtractionResult`]. Downloading workbooks ([`acquire`]), persisting results
//! ([`storage`]) and the summary workbook ([`report`]) sit around it.

pub mod acquire;
pub mod config;
pub mod document;
pub mod extractors;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod storage;
pub mod summary;
pub mod utils;
pub mod validation;

pub use config::ExtractionConfig;
pub use document::Document;
pub use models::{ExtractionResult, Finding, FindingCode, Severity};
pub use orchestrator::{DocumentOutcome, ExtractionOrchestrator};
