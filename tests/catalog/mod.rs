// Catalog tests
// Alignment of ordered source lists and dependency extraction from view definitions

pub mod alignment;
pub mod dependencies;
