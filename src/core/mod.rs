//! ETF domain types, the normalization and comparison engine, and the data
//! source abstraction.

pub mod comparison;
pub mod config;
pub mod known;
pub mod log;
pub mod magnitude;
pub mod normalize;
pub mod performance;
pub mod record;
pub mod source;

// Re-export main types for cleaner imports
pub use comparison::{ComparisonSummary, compare};
pub use magnitude::{Magnitude, format_magnitude, parse_magnitude};
pub use record::{DataSource, EtfRecord, Holding, PerformanceMetric};
pub use source::{EtfDataSource, EtfSearch, ProviderKind};
