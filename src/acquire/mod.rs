// src/acquire/mod.rs

//! Fetching application workbooks from the published applications index.

pub mod client;
pub mod links;

pub use client::download_workbooks;
pub use links::{collect_workbook_links, looks_like_workbook, WorkbookLink};
