pub mod collect;
pub mod dependencies;

// Re-export all command functions
pub use collect::cmd_collect;
pub use dependencies::{DependencyFormat, cmd_dependencies};
