use crate::analyzer::Diagnostic;
use crate::analyzer::elements::{ConstElement, SourceFile};
use crate::analyzer::inspection::{TypeSubject, doc_type};
use crate::analyzer::project::ProjectContext;
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::rules::helpers::Report;

/// Checks the `@var` tag of class constants against the constant value.
pub struct ConstantRule;

impl ConstantRule {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, report: &mut Report<'_>, constant: &ConstElement) {
        let doc_block = &constant.doc_block;
        let mut subject = TypeSubject::constant(constant).with_doc_block(doc_block.is_defined());
        if let Some(var_tag) = doc_block.var_tag() {
            subject = subject.with_tag(&var_tag.ty, constant.line);
        }

        doc_type::report_mandatory(&mut subject, true);
        doc_type::report_suggested(&mut subject);
        doc_type::report_replaceable(&mut subject);
        doc_type::report_removable(&mut subject);
        doc_type::report_invalid(&mut subject);
        doc_type::report_missing_or_wrong(&mut subject);
        report.add_subject(&mut subject);
    }
}

impl Default for ConstantRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for ConstantRule {
    fn name(&self) -> &str {
        "type_sniff/constant"
    }

    fn run(&self, file: &SourceFile, _context: &ProjectContext) -> Vec<Diagnostic> {
        let mut report = Report::new(file, self.name());
        for class in &file.classes {
            for constant in &class.constants {
                self.check(&mut report, constant);
            }
        }
        report.finish()
    }
}
