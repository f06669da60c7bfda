use crate::analyzer::Diagnostic;
use crate::analyzer::elements::{PropertyElement, SourceFile};
use crate::analyzer::inspection::{TypeSubject, doc_type};
use crate::analyzer::project::ProjectContext;
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::rules::helpers::Report;

/// Checks the `@var` tag of class properties against the declared type and
/// the default value.
pub struct PropertyRule;

impl PropertyRule {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, report: &mut Report<'_>, property: &PropertyElement) {
        let doc_block = &property.doc_block;
        let mut subject = TypeSubject::property(property).with_doc_block(doc_block.is_defined());

        if doc_block.is_undefined() {
            if property.fn_type.is_undefined() {
                report.add(
                    property.line,
                    format!("Add PHPDoc for property ${}", property.name),
                );
            } else {
                doc_type::report_mandatory(&mut subject, true);
                report.add_subject(&mut subject);
            }
            return;
        }

        let Some(var_tag) = doc_block.var_tag() else {
            report.add(
                property.line,
                format!("Add @var tag for property ${}", property.name),
            );
            return;
        };

        if let Some(name) = &var_tag.name {
            report.add(
                var_tag.line,
                format!("Remove property name ${name} from @var tag"),
            );
        }

        subject = subject.with_tag(&var_tag.ty, var_tag.line);
        doc_type::report_mandatory(&mut subject, true);
        doc_type::report_suggested(&mut subject);
        doc_type::report_replaceable(&mut subject);
        doc_type::report_removable(&mut subject);
        doc_type::report_invalid(&mut subject);
        doc_type::report_missing_or_wrong(&mut subject);
        report.add_subject(&mut subject);
    }
}

impl Default for PropertyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for PropertyRule {
    fn name(&self) -> &str {
        "type_sniff/property"
    }

    fn run(&self, file: &SourceFile, _context: &ProjectContext) -> Vec<Diagnostic> {
        let mut report = Report::new(file, self.name());
        for class in &file.classes {
            for property in &class.properties {
                self.check(&mut report, property);
            }
        }
        report.finish()
    }
}
