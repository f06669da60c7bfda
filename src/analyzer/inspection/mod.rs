//! Turns the comparison of a doc type with a signature type into warning
//! messages for one declaration site.

pub mod doc_type;
pub mod fn_type;
mod subject;

pub use subject::{SubjectKind, TypeSubject};
