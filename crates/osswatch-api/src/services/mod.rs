pub mod project_lifecycle;
