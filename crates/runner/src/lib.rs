//! # patternlab runner
//!
//! Finds every numbered pattern script under the catalog root, runs each one
//! as a subprocess with a per-pattern timeout and turns the outcomes into
//! Markdown and JSON reports.
//!
//! Script failures and timeouts are recorded as data in [`RunOutcome`];
//! [`RunnerError`] is reserved for problems with the catalog or the report
//! directory itself.

pub mod discovery;
pub mod exec;
pub mod limiter;
pub mod report;
pub mod runner;

pub use discovery::{DiscoveryFilter, PatternScript, discover};
pub use exec::{Executor, ProcessExecutor, RunOutcome, RunStatus};
pub use limiter::RateLimiter;
pub use report::ReportFormat;
pub use runner::{FrameworkTally, RunSummary, ScriptResult, TestRunner};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Catalog root not found: {0}")]
    CatalogNotFound(PathBuf),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid report format '{0}' (expected markdown, json or both)")]
    InvalidFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
}
