//! Compatibility between a PHPDoc type and a signature type for the same
//! declaration site.

use super::Type;

/// Outcome of comparing a doc type against a signature type. Both lists keep
/// the left-to-right member order of the type they were taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Doc members with no compatible signature member.
    pub wrong_doc_types: Vec<Type>,
    /// Signature members with no compatible doc member.
    pub missing_doc_types: Vec<Type>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.wrong_doc_types.is_empty() && self.missing_doc_types.is_empty()
    }
}

/// Compares `doc_type` against `fn_type`. An undefined side, or `mixed` on
/// the signature side, yields an empty comparison. A `mixed` doc member is
/// reported as wrong but covers every signature member.
pub fn compare(doc_type: &Type, fn_type: &Type) -> Comparison {
    if doc_type.is_undefined() || fn_type.is_undefined() {
        return Comparison::default();
    }

    let doc_members = expand(doc_type);
    let fn_members = expand(fn_type);
    if fn_members.iter().any(|member| matches!(member, Type::Mixed)) {
        return Comparison::default();
    }

    let wrong_doc_types = doc_members
        .iter()
        .filter(|doc| !fn_members.iter().any(|fn_member| is_compatible(doc, fn_member)))
        .cloned()
        .collect();
    let doc_covers_all = doc_members.iter().any(|doc| matches!(doc, Type::Mixed));
    let missing_doc_types = fn_members
        .iter()
        .filter(|fn_member| {
            !doc_covers_all && !doc_members.iter().any(|doc| is_compatible(doc, fn_member))
        })
        .cloned()
        .collect();

    Comparison {
        wrong_doc_types,
        missing_doc_types,
    }
}

/// Flat member list; `?T` expands to `null` followed by `T`.
fn expand(ty: &Type) -> Vec<Type> {
    match ty {
        Type::Nullable(inner) => {
            let mut members = vec![Type::Null];
            members.extend(expand(inner));
            members
        }
        Type::Union(members) => members.clone(),
        other => vec![other.clone()],
    }
}

/// Member-level compatibility of a doc member with a signature member.
/// The relation is directional: bare `array` on the signature side accepts
/// any typed array, but not the other way around.
pub fn is_compatible(doc: &Type, fn_type: &Type) -> bool {
    match (doc, fn_type) {
        (_, Type::Mixed) => true,
        (Type::Mixed, _) => false,
        (Type::Undefined, _) | (_, Type::Undefined) => true,
        (Type::Void, Type::Void) => true,
        (Type::Void, _) | (_, Type::Void) => false,

        (Type::Bool, Type::True | Type::False) | (Type::True | Type::False, Type::Bool) => true,

        (Type::Fqcn(a), Type::Fqcn(b))
        | (Type::Fqcn(a), Type::Generic { name: b, .. })
        | (Type::Generic { name: a, .. }, Type::Fqcn(b))
        | (Type::Generic { name: a, .. }, Type::Generic { name: b, .. }) => same_class(a, b),
        (
            Type::SelfType | Type::Static,
            Type::Fqcn(_) | Type::Generic { .. } | Type::Object,
        )
        | (
            Type::Fqcn(_) | Type::Generic { .. } | Type::Object,
            Type::SelfType | Type::Static,
        ) => true,
        (Type::Object, Type::Fqcn(_) | Type::Generic { .. })
        | (Type::Fqcn(_) | Type::Generic { .. }, Type::Object) => true,
        (Type::Callable, Type::Fqcn(name)) | (Type::Fqcn(name), Type::Callable) => {
            is_closure(name)
        }

        (Type::Array | Type::TypedArray { .. }, Type::Array) => true,
        (Type::Array, Type::TypedArray { .. }) => false,
        (
            Type::TypedArray {
                element: doc_element,
                depth: doc_depth,
            },
            Type::TypedArray {
                element: fn_element,
                depth: fn_depth,
            },
        ) => {
            is_wildcard(doc_element)
                || is_wildcard(fn_element)
                || (doc_depth == fn_depth && overlaps(doc_element, fn_element))
        }
        (
            Type::Array
            | Type::TypedArray { .. }
            | Type::Iterable
            | Type::Fqcn(_)
            | Type::Generic { .. },
            Type::Iterable,
        ) => true,

        _ => doc.kind() == fn_type.kind() && doc.is_leaf(),
    }
}

fn is_wildcard(element: &Type) -> bool {
    matches!(element, Type::Mixed | Type::Array)
}

fn overlaps(doc: &Type, fn_type: &Type) -> bool {
    let fn_members = expand(fn_type);
    expand(doc)
        .iter()
        .any(|doc_member| fn_members.iter().any(|fn_member| is_compatible(doc_member, fn_member)))
}

/// Class names match case-insensitively, ignoring the leading separator. An
/// unqualified or partially qualified name matches the trailing segments of
/// a longer one, since imports cannot be resolved here.
fn same_class(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('\\').to_ascii_lowercase();
    let b = b.trim_start_matches('\\').to_ascii_lowercase();
    if a == b {
        return true;
    }

    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    long.ends_with(&format!("\\{short}"))
}

fn is_closure(name: &str) -> bool {
    name.rsplit('\\')
        .next()
        .is_some_and(|last| last.eq_ignore_ascii_case("closure"))
}
