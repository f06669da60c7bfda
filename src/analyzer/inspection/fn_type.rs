//! Warnings about the signature side of a declaration.

use super::{SubjectKind, TypeSubject};
use crate::analyzer::types::helper::to_example_fn_type;

/// A missing signature type is only acceptable when a doc tag takes its place.
pub fn report_mandatory(subject: &mut TypeSubject) {
    if subject.fn_type.is_defined() || subject.has_doc_tag() {
        return;
    }

    match subject.kind {
        SubjectKind::Return => {
            subject.add_fn_warning("Missing PHPDoc tag or void type declaration for :subject:")
        }
        SubjectKind::Param => subject
            .add_fn_warning("Add type declaration for :subject: or create PHPDoc with type hint"),
        SubjectKind::Property | SubjectKind::Constant => {}
    }
}

/// Suggests a signature type derived from the doc type, when one exists.
pub fn report_suggested(subject: &mut TypeSubject) {
    if subject.fn_type.is_defined() {
        return;
    }
    let Some(doc_type) = subject.defined_doc_type() else {
        return;
    };

    if let Some(example) = to_example_fn_type(doc_type, subject.is_return()) {
        subject.add_fn_warning(format!(
            "Add type declaration for :subject:, e.g.: \"{example}\""
        ));
    }
}
