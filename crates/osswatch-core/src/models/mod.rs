//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain.

mod caller;
mod organization;
mod project;

// Re-export all models for convenient imports
pub use caller::*;
pub use organization::*;
pub use project::*;
