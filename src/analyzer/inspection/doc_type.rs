//! Warnings about the PHPDoc side of a declaration.

use super::{SubjectKind, TypeSubject};
use crate::analyzer::types::helper::{fake_typed_array, to_example_doc_type};
use crate::analyzer::types::{Type, TypeKind, compare};

/// Array-typed declarations need a doc tag naming the element type.
/// `missing_tags` disables the report for an existing doc block without the tag.
pub fn report_mandatory(subject: &mut TypeSubject, missing_tags: bool) {
    match subject.kind {
        SubjectKind::Param | SubjectKind::Return => {
            if subject.has_doc_tag() || !subject.fn_type.contains(TypeKind::Array) {
                return;
            }
            if !missing_tags && subject.has_doc_block {
                return;
            }
            subject.add_doc_warning(
                "Create PHPDoc with typed array type hint for :subject:, .e.g.: \"string[]\" or \"SomeClass[]\"",
            );
        }
        SubjectKind::Property | SubjectKind::Constant => {
            let holds_array = subject.fn_type.contains(TypeKind::Array)
                || subject
                    .value_type
                    .as_ref()
                    .is_some_and(|ty| ty.contains(TypeKind::Array));
            if !holds_array
                || subject.doc_contains(TypeKind::TypedArray)
                || subject.doc_contains(TypeKind::Array)
            {
                return;
            }
            subject.add_doc_warning(
                "Add PHPDoc with typed array type hint for :subject:. Use mixed[] for generic arrays.",
            );
        }
    }
}

/// A tag without a type.
pub fn report_suggested(subject: &mut TypeSubject) {
    if !matches!(&subject.doc_type, Some(Type::Undefined)) {
        return;
    }

    match subject.kind {
        SubjectKind::Property | SubjectKind::Constant => {
            subject.add_doc_warning("Add type hint to @var tag for :subject:")
        }
        SubjectKind::Param | SubjectKind::Return => {
            let message = match to_example_doc_type(&subject.fn_type) {
                Some(example) => {
                    format!("Add type hint in PHPDoc tag for :subject:, e.g. \"{example}\"")
                }
                None => "Add type hint in PHPDoc tag for :subject:".to_string(),
            };
            subject.add_doc_warning(message);
        }
    }
}

/// `?T` is signature syntax; docs spell it `T|null`.
pub fn report_replaceable(subject: &mut TypeSubject) {
    let Some(Type::Nullable(_)) = &subject.doc_type else {
        return;
    };
    let compound = subject
        .doc_type
        .as_ref()
        .map(Type::to_doc_string)
        .unwrap_or_default();
    subject.add_doc_warning(format!(
        "Change type hint for :subject: to compound, e.g. {compound}"
    ));
}

pub fn report_removable(subject: &mut TypeSubject) {
    if subject.is_return()
        && matches!(subject.doc_type, Some(Type::Void))
        && matches!(subject.fn_type, Type::Void)
    {
        subject.add_doc_warning("Remove @return void tag, not necessary");
    }

    if subject.doc_contains(TypeKind::Array) && subject.doc_contains(TypeKind::TypedArray) {
        subject.add_doc_warning(
            "Remove array type, typed array type is present in PHPDoc for :subject:.",
        );
    }
}

pub fn report_invalid(subject: &mut TypeSubject) {
    if subject.doc_contains(TypeKind::Array) && !subject.doc_contains(TypeKind::TypedArray) {
        subject.add_doc_warning(
            "Replace array type with typed array type in PHPDoc for :subject:. Use mixed[] for generic arrays.",
        );
    }

    if let Some(fake) = fake_typed_array(subject.doc_type.as_ref()) {
        subject.add_doc_warning(format!(
            "Use a more specific type in typed array hint \"{}\" for :subject:. Correct array depth must be specified.",
            fake.to_doc_string()
        ));
    }

    if !subject.is_return() && subject.doc_contains(TypeKind::Void) {
        subject.add_doc_warning("Type hint \"void\" is not valid for :subject:");
    }
}

/// Compares the doc type with the declared type, or with the value type for
/// constants and untyped properties.
pub fn report_missing_or_wrong(subject: &mut TypeSubject) {
    let Some(doc_type) = subject.defined_doc_type().cloned() else {
        return;
    };

    let (comparison, target, missing_only) = match subject.kind {
        SubjectKind::Param | SubjectKind::Return => {
            (compare(&doc_type, &subject.fn_type), "type declaration", false)
        }
        SubjectKind::Constant => {
            let value_type = subject.value_type.clone().unwrap_or(Type::Undefined);
            (compare(&doc_type, &value_type), "value type", false)
        }
        SubjectKind::Property if subject.fn_type.is_defined() => {
            (compare(&doc_type, &subject.fn_type), "type declaration", false)
        }
        SubjectKind::Property => {
            let value_type = subject.value_type.clone().unwrap_or(Type::Undefined);
            (compare(&doc_type, &value_type), "value type", true)
        }
    };

    if !missing_only && !comparison.wrong_doc_types.is_empty() {
        let wrong = render(&comparison.wrong_doc_types);
        let message = if comparison.wrong_doc_types.len() == 1 {
            format!("Type hint \"{wrong}\" is not compatible with :subject: {target}")
        } else {
            format!("Type hints \"{wrong}\" are not compatible with :subject: {target}")
        };
        subject.add_doc_warning(message);
    }

    if !comparison.missing_doc_types.is_empty() {
        let missing = render(&comparison.missing_doc_types);
        let message = if comparison.missing_doc_types.len() == 1 {
            format!("Missing \"{missing}\" type in :subject: type hint")
        } else {
            format!("Missing \"{missing}\" types in :subject: type hint")
        };
        subject.add_doc_warning(message);
    }
}

fn render(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::to_doc_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::raw::parse;

    fn run_all(mut subject: TypeSubject) -> Vec<String> {
        report_mandatory(&mut subject, true);
        report_suggested(&mut subject);
        report_replaceable(&mut subject);
        report_removable(&mut subject);
        report_invalid(&mut subject);
        report_missing_or_wrong(&mut subject);
        subject
            .take_warnings()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }

    fn param(fn_type: &str, doc: Option<&str>) -> TypeSubject {
        let subject = TypeSubject::new("parameter $x", SubjectKind::Param, parse(fn_type), 5);
        match doc {
            Some(doc) => subject.with_tag(&parse(doc), 3).with_doc_block(true),
            None => subject,
        }
    }

    fn ret(fn_type: &str, doc: Option<&str>) -> TypeSubject {
        let subject = TypeSubject::new("return value", SubjectKind::Return, parse(fn_type), 5);
        match doc {
            Some(doc) => subject.with_tag(&parse(doc), 3).with_doc_block(true),
            None => subject,
        }
    }

    #[test]
    fn array_param_without_tag() {
        assert_eq!(
            run_all(param("array", None)),
            vec![
                "Create PHPDoc with typed array type hint for parameter $x, .e.g.: \"string[]\" or \"SomeClass[]\""
            ]
        );
    }

    #[test]
    fn missing_tags_can_be_tolerated_inside_a_doc_block() {
        let mut subject = param("array", None).with_doc_block(true);
        report_mandatory(&mut subject, false);
        assert!(!subject.has_warnings());

        let mut subject = param("array", None);
        report_mandatory(&mut subject, false);
        assert!(subject.has_warnings());
    }

    #[test]
    fn bare_array_in_doc_must_be_replaced() {
        assert_eq!(
            run_all(ret("?array", Some("array|null"))),
            vec![
                "Replace array type with typed array type in PHPDoc for return value. Use mixed[] for generic arrays."
            ]
        );
    }

    #[test]
    fn wrong_and_missing_types() {
        assert_eq!(
            run_all(param("int", Some("string"))),
            vec![
                "Type hint \"string\" is not compatible with parameter $x type declaration",
                "Missing \"int\" type in parameter $x type hint",
            ]
        );
        assert_eq!(
            run_all(ret("?int", Some("string|float"))),
            vec![
                "Type hints \"string, float\" are not compatible with return value type declaration",
                "Missing \"null, int\" types in return value type hint",
            ]
        );
    }

    #[test]
    fn void_return_tag_is_redundant() {
        assert_eq!(
            run_all(ret("void", Some("void"))),
            vec!["Remove @return void tag, not necessary"]
        );
    }

    #[test]
    fn void_is_only_valid_for_returns() {
        assert_eq!(
            run_all(param("", Some("void"))),
            vec!["Type hint \"void\" is not valid for parameter $x"]
        );
    }

    #[test]
    fn nullable_doc_shorthand() {
        assert_eq!(
            run_all(param("", Some("?SomeClass"))),
            vec!["Change type hint for parameter $x to compound, e.g. SomeClass|null"]
        );
    }

    #[test]
    fn typed_array_next_to_bare_array() {
        assert_eq!(
            run_all(param("array", Some("int[]|array"))),
            vec!["Remove array type, typed array type is present in PHPDoc for parameter $x."]
        );
    }

    #[test]
    fn fake_typed_array_needs_specific_type() {
        assert_eq!(
            run_all(param("array", Some("array[]"))),
            vec![
                "Use a more specific type in typed array hint \"array[]\" for parameter $x. Correct array depth must be specified."
            ]
        );
    }

    #[test]
    fn tag_without_type_gets_example() {
        assert_eq!(
            run_all(param("int", Some(""))),
            vec!["Add type hint in PHPDoc tag for parameter $x, e.g. \"int\""]
        );
        assert_eq!(
            run_all(param("", Some(""))),
            vec!["Add type hint in PHPDoc tag for parameter $x"]
        );
        assert_eq!(
            run_all(param("array", Some(""))),
            vec!["Add type hint in PHPDoc tag for parameter $x, e.g. \"SomeClass[]\""]
        );
    }

    #[test]
    fn constant_compares_against_value_type() {
        let mut subject = TypeSubject::new("C2 constant", SubjectKind::Constant, Type::Undefined, 9)
            .with_tag(&Type::Array, 8);
        subject.value_type = Some(Type::Int);
        assert_eq!(
            run_all(subject),
            vec![
                "Replace array type with typed array type in PHPDoc for C2 constant. Use mixed[] for generic arrays.",
                "Type hint \"array\" is not compatible with C2 constant value type",
                "Missing \"int\" type in C2 constant type hint",
            ]
        );

        let mut subject = TypeSubject::new("C3 constant", SubjectKind::Constant, Type::Undefined, 12);
        subject.value_type = Some(Type::Array);
        assert_eq!(
            run_all(subject),
            vec!["Add PHPDoc with typed array type hint for C3 constant. Use mixed[] for generic arrays."]
        );
    }

    #[test]
    fn untyped_property_only_reports_missing_value_types() {
        let mut subject =
            TypeSubject::new("property $prop6", SubjectKind::Property, Type::Undefined, 33)
                .with_tag(&Type::Int, 32);
        subject.value_type = Some(Type::Array);
        assert_eq!(
            run_all(subject),
            vec![
                "Add PHPDoc with typed array type hint for property $prop6. Use mixed[] for generic arrays.",
                "Missing \"array\" type in property $prop6 type hint",
            ]
        );
    }

    #[test]
    fn typed_property_compares_against_declaration() {
        let subject = TypeSubject::new("property $p", SubjectKind::Property, parse("?int"), 10)
            .with_tag(&parse("int|null"), 9);
        assert!(run_all(subject).is_empty());

        let subject = TypeSubject::new("property $p", SubjectKind::Property, Type::String, 10)
            .with_tag(&Type::Int, 9);
        assert_eq!(
            run_all(subject),
            vec![
                "Type hint \"int\" is not compatible with property $p type declaration",
                "Missing \"string\" type in property $p type hint",
            ]
        );
    }
}
