pub mod file_writer;
pub mod path_policy;
pub mod result;

pub use file_writer::{ensure_directory_exists, write_atomic, FileWriter, WriteFailure, WriteReport};
pub use path_policy::{validate_relative_path, PathDecision, PathPolicy, DEFAULT_PROTECTED_NAMES};
pub use result::WriteResult;
