use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::Diagnostic;
use crate::analyzer::config::MethodConfig;
use crate::analyzer::elements::{ClassElement, ClassKind, SourceFile};
use crate::analyzer::inspection::{TypeSubject, doc_type, fn_type};
use crate::analyzer::phpdoc::DocBlock;
use crate::analyzer::project::{MethodExtension, MethodMetadata, ProjectContext};
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::rules::helpers::{Report, report_invalid_tags};
use crate::analyzer::signature::FunctionSignature;
use crate::analyzer::types::{Type, TypeKind};

static CONSTRUCTOR_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+\s+constructor\.?$").expect("valid constructor pattern")
});

/// Cross-checks parameter and return types of functions and methods with
/// their PHPDoc.
pub struct MethodRule {
    config: MethodConfig,
    use_reflection: bool,
}

/// A function or a method, with its class when it has one.
struct Callable<'a> {
    line: usize,
    signature: &'a FunctionSignature,
    doc_block: &'a DocBlock,
    class: Option<&'a ClassElement>,
    basic_getter: Option<&'a str>,
}

impl MethodRule {
    pub fn new(config: MethodConfig, use_reflection: bool) -> Self {
        Self {
            config,
            use_reflection,
        }
    }

    fn check(&self, report: &mut Report<'_>, callable: &Callable<'_>, context: &ProjectContext) {
        let raised_before = report.raised();

        report_invalid_tags(report, callable.doc_block, &self.config.invalid_tags);
        self.inspect(report, callable, context);

        if report.raised() == raised_before
            && has_useless_doc_block(callable.signature, callable.doc_block)
        {
            report.add(callable.line, "Useless PHPDoc");
        }
    }

    fn inspect(&self, report: &mut Report<'_>, callable: &Callable<'_>, context: &ProjectContext) {
        let signature = callable.signature;
        let doc_block = callable.doc_block;
        let is_constructor = signature.name.eq_ignore_ascii_case("__construct");
        let is_magic = signature.name.starts_with("__");

        // constructors are inspected even though they are magic and may override
        if !is_constructor {
            if is_magic || doc_block.has_tag("inheritdoc") {
                return;
            }
            if self.is_extended(callable, context) {
                report.add(
                    callable.line,
                    "Missing @inheritDoc tag. Remove duplicated parent PHPDoc content.",
                );
                return;
            }
        }

        for param in &signature.params {
            let mut subject = TypeSubject::param(param).with_doc_block(doc_block.is_defined());
            if let Some(tag) = doc_block.param_tag(&param.name) {
                subject = subject.with_tag(&tag.ty, tag.line);
            } else if let Some(tag) = param.doc_block.var_tag().filter(|_| param.promoted) {
                subject = subject.with_tag(&tag.ty, tag.line).with_doc_block(true);
            }
            self.inspect_subject(report, &mut subject);
        }

        if is_constructor {
            for (line, text) in doc_block.description_lines() {
                if CONSTRUCTOR_DESCRIPTION.is_match(text) {
                    report.add(line, "Useless description.");
                }
            }
            return;
        }

        let mut subject =
            TypeSubject::return_value(signature).with_doc_block(doc_block.is_defined());
        if let Some(tag) = doc_block.return_tag() {
            subject = subject.with_tag(&tag.ty, tag.line);
        }
        self.inspect_subject(report, &mut subject);

        if let (Some(class), Some(property)) = (callable.class, callable.basic_getter) {
            if class.kind == ClassKind::Class {
                self.report_nullable_basic_getter(report, &mut subject, class, property);
            }
        }
    }

    fn is_extended(&self, callable: &Callable<'_>, context: &ProjectContext) -> bool {
        if !self.use_reflection {
            return false;
        }

        callable.class.is_some_and(|class| {
            context.method_extension(&class.fqcn, &callable.signature.name)
                == MethodExtension::Extended
        })
    }

    fn inspect_subject(&self, report: &mut Report<'_>, subject: &mut TypeSubject) {
        fn_type::report_mandatory(subject);
        fn_type::report_suggested(subject);

        if self.config.report_missing_tags || subject.has_doc_tag() {
            doc_type::report_mandatory(subject, true);
            doc_type::report_suggested(subject);
            doc_type::report_replaceable(subject);
            doc_type::report_removable(subject);
            doc_type::report_invalid(subject);
            doc_type::report_missing_or_wrong(subject);
        } else {
            doc_type::report_mandatory(subject, false);
        }

        report.add_subject(subject);
    }

    /// A getter returning a property documented as nullable must admit null
    /// in its return types too.
    fn report_nullable_basic_getter(
        &self,
        report: &mut Report<'_>,
        subject: &mut TypeSubject,
        class: &ClassElement,
        property: &str,
    ) {
        let report_doc = self.config.report_nullable_basic_getter_doc_type;
        let report_fn = self.config.report_nullable_basic_getter_fn_type;
        if !report_doc && !report_fn {
            return;
        }

        let Some(var_tag) = class
            .property(property)
            .and_then(|prop| prop.doc_block.var_tag())
        else {
            return;
        };
        if !var_tag.ty.contains(TypeKind::Null) {
            return;
        }

        if report_doc && subject.has_doc_block && !subject.doc_contains(TypeKind::Null) {
            let example = match subject.defined_doc_type() {
                Some(doc_type) => doc_type.to_doc_string(),
                None => without_null(&var_tag.ty).to_doc_string(),
            };
            subject.add_doc_warning(format!(
                "Returned property ${property} is nullable, add null return doc type, e.g. {example}|null"
            ));
        }

        // only a declared type is checked, a missing one is reported above
        if report_fn && subject.fn_type.is_defined() && !subject.fn_type.contains(TypeKind::Null) {
            let declared = subject.fn_type.to_string();
            subject.add_fn_warning(format!(
                "Returned property ${property} is nullable, use nullable return type declaration, e.g. ?{declared}"
            ));
        }

        report.add_subject(subject);
    }
}

impl DiagnosticRule for MethodRule {
    fn name(&self) -> &str {
        "type_sniff/method"
    }

    fn run(&self, file: &SourceFile, context: &ProjectContext) -> Vec<Diagnostic> {
        let mut report = Report::new(file, self.name());

        for function in &file.functions {
            let callable = Callable {
                line: function.line,
                signature: &function.signature,
                doc_block: &function.doc_block,
                class: None,
                basic_getter: None,
            };
            self.check(&mut report, &callable, context);
        }

        for class in &file.classes {
            for method in &class.methods {
                let callable = Callable {
                    line: method.line,
                    signature: &method.signature,
                    doc_block: &method.doc_block,
                    class: Some(class),
                    basic_getter: method.basic_getter.as_deref(),
                };
                self.check(&mut report, &callable, context);
            }
        }

        report.finish()
    }
}

/// True when the doc block only repeats the signature: no description, no
/// other tags, and every tag type spelled exactly like the declaration.
fn has_useless_doc_block(signature: &FunctionSignature, doc_block: &DocBlock) -> bool {
    if doc_block.is_undefined()
        || doc_block.has_description()
        || doc_block
            .return_tag()
            .is_some_and(|tag| tag.description.is_some())
        || doc_block
            .tag_names()
            .iter()
            .any(|name| *name != "param" && *name != "return")
    {
        return false;
    }

    for param in &signature.params {
        let Some(tag) = doc_block.param_tag(&param.name) else {
            return false;
        };
        if tag.description.is_some() || tag.ty.to_string() != declared_spelling(&param.fn_type) {
            return false;
        }
    }

    match doc_block.return_tag() {
        Some(tag) => tag.ty.to_string() == declared_spelling(&signature.return_type),
        None => true,
    }
}

fn declared_spelling(ty: &Type) -> String {
    match ty {
        Type::Nullable(_) => ty.to_doc_string(),
        other => other.to_string(),
    }
}

fn without_null(ty: &Type) -> Type {
    Type::union(
        ty.members()
            .iter()
            .filter(|member| !matches!(member, Type::Null))
            .cloned(),
    )
}
