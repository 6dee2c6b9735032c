pub mod config;
pub mod matching;

pub use config::{parse, parse_str, LabelConfiguration, LabelRule};
pub use matching::{compile_pattern, matches, Glob};
