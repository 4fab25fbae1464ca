pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod formatter;
pub mod grouping;
pub mod keywords;
pub mod lexer;
pub mod mode;
pub mod node;
pub mod options;
pub mod query;
pub mod reindent;
pub mod report;
pub mod splitter;
pub(crate) mod string_utils;
pub mod token;

// Re-export the main public API
pub use api::{format, get_matching_paths, parse, run, split, tokenize};
pub use config::load_config;
pub use error::SqlfoldError;
pub use mode::Mode;
pub use options::{Case, FormatOptions, GroupingLimits};
