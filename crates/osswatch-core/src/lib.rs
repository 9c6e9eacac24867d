//! Osswatch Core Library
//!
//! This crate provides core domain models, error types, configuration, the
//! authorization policy, and validation shared across all osswatch components.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{CallerContext, DisconnectOutcome, GlobalRole, Organization, Project};
pub use policy::Action;
