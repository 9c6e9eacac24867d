//! Input validation helpers shared by the API and the scan runner.

mod url;

pub use url::{derive_project_name, validate_project_url};
