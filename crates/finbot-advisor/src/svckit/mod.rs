//! Service Kit
//!
//! Pure portfolio and chart services used by the chat pipeline.

pub mod chart_builder;
pub mod ingestion;
pub mod portfolio_analyzer;

pub use chart_builder::{ChartKind, ChartSpec, ChartSpecBuilder, Slice};
pub use ingestion::{ParsedPortfolio, Validation, parse_csv, validate};
pub use portfolio_analyzer::{Concentration, analyze, concentration};
