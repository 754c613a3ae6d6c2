//! Cost and performance simulators for the intelligence patterns.
//!
//! The numbers produced here are illustrative: token counts, call counts and
//! latencies come from fixed per-framework formulas and a seeded RNG, not
//! from measuring real model calls. Results can be printed as plain-text
//! tables or exported to JSON/CSV.

pub mod catalog;
pub mod cost;
pub mod model;
pub mod perf;
pub mod pricing;
pub mod report;

pub use catalog::{Complexity, PatternCategory, PatternMeta};
pub use cost::{CostAggregate, CostComparison, CostSimulator, FrameworkTotals};
pub use model::{CostMetrics, LatencyStats, PerformanceMetrics, TokenUsage};
pub use perf::{PerfComparison, PerfSettings, PerformanceSimulator};
pub use pricing::{ModelPricing, PricingTable};
pub use report::ExportFormat;

/// Errors from the benchmark subsystem.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("unknown pattern(s): {}. Valid patterns: {}", .unknown.join(", "), .valid.join(", "))]
    UnknownPattern {
        unknown: Vec<String>,
        valid: Vec<String>,
    },

    #[error("unknown model '{model}'. Known models: {}", .known.join(", "))]
    UnknownModel { model: String, known: Vec<String> },

    #[error("invalid load level: {0}")]
    InvalidLoad(String),

    #[error("invalid time scale: {0}")]
    InvalidTimeScale(String),

    #[error("invalid export format '{0}' (expected json, csv or both)")]
    InvalidExport(String),

    #[error("benchmark worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
