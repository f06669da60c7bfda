//! Function and method signatures read from the declaration token stream.

mod parser;

pub use parser::{SignatureParser, declared_type};

use crate::analyzer::phpdoc::DocBlock;
use crate::analyzer::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Line of the function name.
    pub line: usize,
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub return_type: Type,
    /// Line of the last return type token, or of `)` without one.
    pub return_line: usize,
}

impl FunctionSignature {
    pub fn param(&self, name: &str) -> Option<&FunctionParam> {
        self.params.iter().find(|param| param.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParam {
    pub line: usize,
    /// Name without the leading `$`.
    pub name: String,
    pub fn_type: Type,
    /// Type inferred from the default value; `None` without a default.
    pub default_type: Option<Type>,
    pub attributes: Vec<String>,
    pub doc_block: DocBlock,
    pub variadic: bool,
    pub by_ref: bool,
    /// Constructor property promotion.
    pub promoted: bool,
}

/// Infers the type of a literal default or initializer expression. Anything
/// that is not a plain literal is `Undefined`.
pub fn infer_value_type(raw: &str) -> Type {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();

    match lower.as_str() {
        "" => return Type::Undefined,
        "null" => return Type::Null,
        "true" | "false" => return Type::Bool,
        _ => {}
    }

    if (raw.starts_with('[') && raw.ends_with(']'))
        || (lower.starts_with("array") && lower[5..].trim_start().starts_with('('))
    {
        return Type::Array;
    }

    if raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')))
    {
        return Type::String;
    }

    let digits = raw
        .strip_prefix('-')
        .or_else(|| raw.strip_prefix('+'))
        .unwrap_or(raw)
        .trim_start()
        .replace('_', "");
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Type::Undefined;
    }

    if is_integer_literal(&digits) {
        Type::Int
    } else if digits.parse::<f64>().is_ok() {
        Type::Float
    } else {
        Type::Undefined
    }
}

fn is_integer_literal(digits: &str) -> bool {
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return !bin.is_empty() && bin.chars().all(|c| c == '0' || c == '1');
    }
    !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit())
}
