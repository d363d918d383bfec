// src/extractors/mod.rs
pub mod facts;
pub mod layout;
pub mod section;

// Re-export key extraction types for convenience
pub use facts::ProjectFactsExtractor;
pub use layout::{SectionLayout, CONSTRUCTION_LAYOUT, PERMANENT_LAYOUT};
pub use section::SectionExtractor;
