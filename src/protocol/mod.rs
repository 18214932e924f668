pub mod mapping;
pub mod parser;

pub use mapping::{is_allowed, MappingValidator};
pub use parser::{generate, matches_prefix, parse, ParseOutcome};
