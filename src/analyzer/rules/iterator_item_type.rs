use crate::analyzer::elements::{ClassElement, ClassKind, SourceFile};
use crate::analyzer::project::{ProjectContext, resolve_class_name};
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::rules::helpers::Report;
use crate::analyzer::{Diagnostic, Severity};

const ITERATOR_AGGREGATE: &str = "IteratorAggregate";
const ITEM_TYPE_TAGS: [&str; 3] = ["template-implements", "template-extends", "implements"];

/// Classes implementing `IteratorAggregate` must declare their item type.
pub struct IteratorItemTypeRule {
    severity: Severity,
}

impl IteratorItemTypeRule {
    pub fn new(severity: Severity) -> Self {
        Self { severity }
    }

    fn needs_item_type(
        &self,
        file: &SourceFile,
        class: &ClassElement,
        context: &ProjectContext,
    ) -> bool {
        if class.kind != ClassKind::Class {
            return false;
        }

        let namespace = class.namespace.as_deref();

        // a parent that already implements it is the one that gets checked
        if let Some(parent) = &class.parent {
            let parent = resolve_class_name(namespace, &file.uses, parent);
            if context.implements_interface(&parent, ITERATOR_AGGREGATE) == Some(true) {
                return false;
            }
        }

        let implements_directly = class.interfaces.iter().any(|name| {
            is_iterator_aggregate(&resolve_class_name(namespace, &file.uses, name))
        });
        let implements = implements_directly
            || context.implements_interface(&class.fqcn, ITERATOR_AGGREGATE) == Some(true);
        if !implements {
            return false;
        }

        !ITEM_TYPE_TAGS
            .iter()
            .any(|tag| class.doc_block.has_tag(tag))
    }
}

impl DiagnosticRule for IteratorItemTypeRule {
    fn name(&self) -> &str {
        "type_sniff/iterator_item_type"
    }

    fn run(&self, file: &SourceFile, context: &ProjectContext) -> Vec<Diagnostic> {
        let mut report = Report::new(file, self.name()).with_severity(self.severity);

        for class in &file.classes {
            if self.needs_item_type(file, class, context) {
                report.add(
                    class.line,
                    "Classes which implement IteratorAggregate must have \"@template-implements IteratorAggregate<?>\" doc tag with a specified item type or template type",
                );
            }
        }

        report.finish()
    }
}

fn is_iterator_aggregate(fqcn: &str) -> bool {
    fqcn.rsplit('\\')
        .next()
        .is_some_and(|name| name.eq_ignore_ascii_case(ITERATOR_AGGREGATE))
}
