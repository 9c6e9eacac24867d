//! Database access layer for osswatch.
//!
//! Repositories are plain structs over a [`sqlx::PgPool`]; the seam consumed
//! by services is the [`ProjectStore`] trait so that business logic can be
//! exercised against the in-memory store (`test-util` feature) without a
//! running Postgres.

pub mod db;

pub use db::project::PgProjectStore;
pub use db::store::{NewProject, ProjectStore};

#[cfg(feature = "test-util")]
pub use db::memory::MemoryProjectStore;
