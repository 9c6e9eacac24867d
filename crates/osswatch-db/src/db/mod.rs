pub mod project;
pub mod store;

#[cfg(feature = "test-util")]
pub mod memory;
