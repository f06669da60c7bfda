//! Suggestions between the two dialects and the fake typed array check used
//! by the inspectors.

use super::Type;

/// Example PHPDoc spelling for a signature type. Bare arrays are suggested as
/// a typed array since the element type cannot be read from the signature.
pub fn to_example_doc_type(fn_type: &Type) -> Option<String> {
    match fn_type {
        Type::Undefined => None,
        Type::Array => Some("SomeClass[]".to_string()),
        Type::Nullable(inner) => to_example_doc_type(inner).map(|inner| format!("{inner}|null")),
        Type::Union(members) => {
            let rendered: Vec<String> = members.iter().filter_map(to_example_doc_type).collect();
            Some(rendered.join("|"))
        }
        other => Some(other.to_doc_string()),
    }
}

/// Example signature type for a PHPDoc type, if one exists in PHP 7.4 syntax.
/// Only a single member, optionally joined with `null`, can be expressed.
pub fn to_example_fn_type(doc_type: &Type, is_return: bool) -> Option<Type> {
    let mut nullable = false;
    let mut expressible = Vec::new();

    for member in doc_type.members() {
        match member {
            Type::Null => nullable = true,
            Type::Nullable(inner) => {
                nullable = true;
                expressible.push(fn_member(inner, is_return)?);
            }
            other => expressible.push(fn_member(other, is_return)?),
        }
    }

    let base = Type::union(expressible);
    match base {
        Type::Undefined | Type::Union(_) => None,
        Type::Void if nullable => None,
        base if nullable => Some(Type::nullable(base)),
        base => Some(base),
    }
}

fn fn_member(member: &Type, is_return: bool) -> Option<Type> {
    let ty = match member {
        Type::Int
        | Type::Float
        | Type::String
        | Type::Bool
        | Type::SelfType
        | Type::Callable
        | Type::Object
        | Type::Iterable
        | Type::Array
        | Type::Fqcn(_) => member.clone(),
        Type::Void if is_return => Type::Void,
        Type::TypedArray { .. } => Type::Array,
        Type::Generic { name, .. } => Type::fqcn(name.clone()),
        _ => return None,
    };
    Some(ty)
}

/// A typed array whose element is a bare array, e.g. `array[]`. It states
/// the depth but nothing about the values.
pub fn fake_typed_array(ty: Option<&Type>) -> Option<Type> {
    ty?.members()
        .iter()
        .find(|member| {
            matches!(member, Type::TypedArray { element, .. } if matches!(element.as_ref(), Type::Array))
        })
        .cloned()
}
