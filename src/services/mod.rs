//! Service layer orchestrating capture, dispatch and normalization.

pub mod analysis;

pub use analysis::{AnalysisError, AnalysisService};
