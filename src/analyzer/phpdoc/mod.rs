//! PHPDoc comment blocks: description lines and tags.

mod parser;
mod types;

pub use parser::DocBlockParser;
pub use types::{DocBlock, DocTag, GenericTag, ParamTag, ReturnTag, VarTag};
