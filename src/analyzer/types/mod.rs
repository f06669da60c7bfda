//! Closed model of PHP types as they appear in signatures and in PHPDoc tags.
//!
//! Both dialects produce the same [`Type`] values, which is what lets the
//! comparator reason about a signature type and a doc type side by side.

mod compare;
pub mod helper;
pub mod raw;

use std::fmt;
use std::mem;

pub use compare::{Comparison, compare, is_compatible};

/// A PHP type from either the signature or the PHPDoc dialect.
///
/// Values are normalized at construction: unions are flat and deduplicated,
/// singleton unions collapse to their member, null is expressed exactly once
/// and typed arrays always have a depth of at least one. Use the constructor
/// functions ([`Type::union`], [`Type::nullable`], [`Type::typed_array`])
/// rather than building composite variants by hand.
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    True,
    False,
    Null,
    Void,
    Mixed,
    SelfType,
    Static,
    Callable,
    Object,
    Iterable,
    Resource,
    Never,
    /// Class or interface name, kept as written.
    Fqcn(String),
    /// Bare `array` without an element type.
    Array,
    /// `element[]...[]`, `depth` is the number of `[]` suffixes.
    TypedArray { element: Box<Type>, depth: usize },
    /// `Name<A>` / `Name<A, B>` for containers that are not array-like.
    Generic { name: String, params: Vec<Type> },
    Union(Vec<Type>),
    /// Signature shorthand `?T`.
    Nullable(Box<Type>),
    /// No declaration was present.
    Undefined,
}

/// Variant tag of a [`Type`], used for membership queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int,
    Float,
    String,
    Bool,
    True,
    False,
    Null,
    Void,
    Mixed,
    SelfType,
    Static,
    Callable,
    Object,
    Iterable,
    Resource,
    Never,
    Fqcn,
    Array,
    TypedArray,
    Generic,
    Union,
    Nullable,
    Undefined,
}

impl Type {
    /// Resolves a scalar or pseudo-type keyword, case-insensitively.
    pub fn keyword(name: &str) -> Option<Type> {
        let lower = name.to_ascii_lowercase();
        let ty = match lower.as_str() {
            "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int"
            | "non-positive-int" | "non-zero-int" => Type::Int,
            "float" | "double" => Type::Float,
            "string" | "class-string" | "interface-string" | "non-empty-string"
            | "numeric-string" | "literal-string" | "callable-string" | "lowercase-string"
            | "non-falsy-string" | "truthy-string" => Type::String,
            "bool" | "boolean" => Type::Bool,
            "true" => Type::True,
            "false" => Type::False,
            "null" => Type::Null,
            "void" => Type::Void,
            "mixed" => Type::Mixed,
            "self" => Type::SelfType,
            "static" | "$this" => Type::Static,
            "callable" => Type::Callable,
            "object" => Type::Object,
            "iterable" => Type::Iterable,
            "resource" | "closed-resource" | "open-resource" => Type::Resource,
            "never" | "never-return" | "never-returns" | "no-return" | "noreturn" => Type::Never,
            "array" | "list" | "non-empty-array" | "non-empty-list" => Type::Array,
            "array-key" => Type::union([Type::Int, Type::String]),
            "numeric" => Type::union([Type::Int, Type::Float]),
            "scalar" => Type::union([Type::Int, Type::Float, Type::String, Type::Bool]),
            _ => return None,
        };
        Some(ty)
    }

    pub fn fqcn(name: impl Into<String>) -> Type {
        Type::Fqcn(name.into())
    }

    /// Builds a union: nested unions and nullables are flattened, duplicates
    /// and `Undefined` members are dropped, and fewer than two members
    /// collapse to the member itself (or `Undefined`).
    pub fn union(members: impl IntoIterator<Item = Type>) -> Type {
        let mut flat: Vec<Type> = Vec::new();
        for member in members {
            push_flat(&mut flat, member);
        }

        match flat.len() {
            0 => Type::Undefined,
            1 => flat.remove(0),
            _ => Type::Union(flat),
        }
    }

    /// Builds `?inner`. Null is never wrapped twice: an inner type that
    /// already admits null (or is `mixed`) is returned unchanged, and a union
    /// inner becomes `inner|null`.
    pub fn nullable(inner: Type) -> Type {
        match inner {
            Type::Undefined => Type::Undefined,
            Type::Null | Type::Mixed | Type::Nullable(_) => inner,
            Type::Union(_) if inner.contains(TypeKind::Null) => inner,
            Type::Union(_) => Type::union([inner, Type::Null]),
            other => Type::Nullable(Box::new(other)),
        }
    }

    /// Builds `element` wrapped in `depth` array levels. A typed-array element
    /// merges into the result, so `(int[])[]` equals `int[][]`. A depth of
    /// zero returns the element itself.
    pub fn typed_array(element: Type, depth: usize) -> Type {
        if depth == 0 {
            return element;
        }

        match element {
            Type::TypedArray {
                element: inner,
                depth: inner_depth,
            } => Type::TypedArray {
                element: inner,
                depth: inner_depth + depth,
            },
            other => Type::TypedArray {
                element: Box::new(other),
                depth,
            },
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Int => TypeKind::Int,
            Type::Float => TypeKind::Float,
            Type::String => TypeKind::String,
            Type::Bool => TypeKind::Bool,
            Type::True => TypeKind::True,
            Type::False => TypeKind::False,
            Type::Null => TypeKind::Null,
            Type::Void => TypeKind::Void,
            Type::Mixed => TypeKind::Mixed,
            Type::SelfType => TypeKind::SelfType,
            Type::Static => TypeKind::Static,
            Type::Callable => TypeKind::Callable,
            Type::Object => TypeKind::Object,
            Type::Iterable => TypeKind::Iterable,
            Type::Resource => TypeKind::Resource,
            Type::Never => TypeKind::Never,
            Type::Fqcn(_) => TypeKind::Fqcn,
            Type::Array => TypeKind::Array,
            Type::TypedArray { .. } => TypeKind::TypedArray,
            Type::Generic { .. } => TypeKind::Generic,
            Type::Union(_) => TypeKind::Union,
            Type::Nullable(_) => TypeKind::Nullable,
            Type::Undefined => TypeKind::Undefined,
        }
    }

    /// True if the type itself, or any member of a union or nullable, is of
    /// the given kind. `Nullable` always contains `Null`.
    pub fn contains(&self, kind: TypeKind) -> bool {
        if self.kind() == kind {
            return true;
        }

        match self {
            Type::Union(members) => members.iter().any(|member| member.contains(kind)),
            Type::Nullable(inner) => kind == TypeKind::Null || inner.contains(kind),
            _ => false,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Type::Undefined)
    }

    pub fn is_defined(&self) -> bool {
        !self.is_undefined()
    }

    /// Members of a union, or the type itself.
    pub fn members(&self) -> &[Type] {
        match self {
            Type::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// PHPDoc rendering: `?T` is spelled `T|null`.
    pub fn to_doc_string(&self) -> String {
        match self {
            Type::Nullable(inner) => format!("{}|null", inner.to_doc_string()),
            Type::Union(members) => join(members, "|", Type::to_doc_string),
            other => other.to_string(),
        }
    }
}

fn push_flat(flat: &mut Vec<Type>, member: Type) {
    match member {
        Type::Undefined => {}
        Type::Union(members) => {
            for inner in members {
                push_flat(flat, inner);
            }
        }
        Type::Nullable(inner) => {
            push_flat(flat, *inner);
            push_flat(flat, Type::Null);
        }
        other => {
            if !flat.contains(&other) {
                flat.push(other);
            }
        }
    }
}

fn join(types: &[Type], separator: &str, render: fn(&Type) -> String) -> String {
    types.iter().map(render).collect::<Vec<_>>().join(separator)
}

/// Signature rendering, e.g. `?string`, `array`, `int|false`.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::String => f.write_str("string"),
            Type::Bool => f.write_str("bool"),
            Type::True => f.write_str("true"),
            Type::False => f.write_str("false"),
            Type::Null => f.write_str("null"),
            Type::Void => f.write_str("void"),
            Type::Mixed => f.write_str("mixed"),
            Type::SelfType => f.write_str("self"),
            Type::Static => f.write_str("static"),
            Type::Callable => f.write_str("callable"),
            Type::Object => f.write_str("object"),
            Type::Iterable => f.write_str("iterable"),
            Type::Resource => f.write_str("resource"),
            Type::Never => f.write_str("never"),
            Type::Fqcn(name) => f.write_str(name),
            Type::Array => f.write_str("array"),
            Type::TypedArray { element, depth } => {
                let element = match element.as_ref() {
                    Type::Union(_) | Type::Nullable(_) => format!("({})", element.to_doc_string()),
                    other => other.to_doc_string(),
                };
                write!(f, "{}{}", element, "[]".repeat(*depth))
            }
            Type::Generic { name, params } => {
                write!(f, "{}<{}>", name, join(params, ", ", Type::to_doc_string))
            }
            Type::Union(members) => f.write_str(&join(members, "|", Type::to_string)),
            Type::Nullable(inner) => write!(f, "?{inner}"),
            Type::Undefined => Ok(()),
        }
    }
}

/// Structural equality; union members compare as a set.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Fqcn(a), Type::Fqcn(b)) => a == b,
            (
                Type::TypedArray {
                    element: a,
                    depth: a_depth,
                },
                Type::TypedArray {
                    element: b,
                    depth: b_depth,
                },
            ) => a_depth == b_depth && a == b,
            (
                Type::Generic {
                    name: a_name,
                    params: a_params,
                },
                Type::Generic {
                    name: b_name,
                    params: b_params,
                },
            ) => a_name == b_name && a_params == b_params,
            (Type::Union(a), Type::Union(b)) => {
                a.len() == b.len() && a.iter().all(|member| b.contains(member))
            }
            (Type::Nullable(a), Type::Nullable(b)) => a == b,
            _ => mem::discriminant(self) == mem::discriminant(other) && self.is_leaf(),
        }
    }
}

impl Eq for Type {}

impl Type {
    fn is_leaf(&self) -> bool {
        !matches!(
            self,
            Type::Fqcn(_)
                | Type::TypedArray { .. }
                | Type::Generic { .. }
                | Type::Union(_)
                | Type::Nullable(_)
        )
    }
}
