// Public modules
pub mod check_directories;
pub mod check_metadata;
pub mod copy_metadata;
pub mod delete;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod partition;
pub mod paths;
pub mod s5_commands;
pub mod settings;
pub mod source;
pub mod symlinks;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use settings::JobSettings;
