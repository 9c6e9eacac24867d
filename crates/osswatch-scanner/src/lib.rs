//! Scan runner for osswatch.
//!
//! Iterates every tracked project, invokes the external security-scan tool on
//! its repository URL, and persists the JSON verdict. Per-project failures are
//! logged and skipped; they never abort the batch and never surface to API
//! callers.

pub mod runner;
pub mod tool;

pub use runner::{BatchSummary, ScanRunner};
pub use tool::{HipcheckCli, ScanError, ScanTool};
