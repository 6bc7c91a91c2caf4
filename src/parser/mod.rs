pub mod animation_parser;

pub use animation_parser::{marker_path, parse_animation_code, FileRecord};
