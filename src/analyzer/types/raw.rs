//! Parser for raw type expressions.
//!
//! The same grammar serves signature type hints (`?\Foo\Bar`, `int|false`)
//! and PHPDoc tag types (`string[]|null`, `array<int, Foo>`); the signature
//! dialect is simply a subset of the doc dialect.

use super::Type;

/// Container names that describe arrays when written as `Name<...>`.
const ARRAY_LIKE: &[&str] = &[
    "array",
    "iterable",
    "list",
    "non-empty-array",
    "non-empty-list",
];

/// Parses a raw type expression. Never fails: unknown names become
/// [`Type::Fqcn`] and an empty expression is [`Type::Undefined`].
pub fn parse(raw: &str) -> Type {
    let raw = raw.trim();
    if raw.is_empty() {
        return Type::Undefined;
    }

    let members = split_top_level(raw, '|');
    if members.len() == 1 {
        return parse_member(members[0]);
    }

    Type::union(members.into_iter().map(parse_member))
}

fn parse_member(raw: &str) -> Type {
    let raw = raw.trim();
    if raw.is_empty() {
        return Type::Undefined;
    }

    if let Some(inner) = raw.strip_prefix('?') {
        return Type::nullable(parse_member(inner));
    }

    let mut base = raw;
    let mut depth = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
        depth += 1;
    }

    if base.is_empty() {
        return Type::Undefined;
    }

    let element = parse_base(base);
    if depth == 0 {
        return element;
    }

    match element {
        Type::Undefined => Type::Undefined,
        element => Type::typed_array(element, depth),
    }
}

fn parse_base(base: &str) -> Type {
    if base.starts_with('(') && closing_index(base, 0) == Some(base.len() - 1) {
        return parse(&base[1..base.len() - 1]);
    }

    if is_quoted(base) {
        return Type::String;
    }

    if let Some(number) = parse_number(base) {
        return number;
    }

    if let Some(open) = base.find(['<', '{', '(']) {
        let name = base[..open].trim();
        if !name.is_empty() {
            return match &base[open..open + 1] {
                "<" => parse_generic(base, name, open),
                "{" => parse_shape(base, name),
                _ => parse_callable(name),
            };
        }
    }

    Type::keyword(base).unwrap_or_else(|| Type::fqcn(base))
}

fn parse_generic(base: &str, name: &str, open: usize) -> Type {
    let Some(close) = closing_index(base, open) else {
        return Type::fqcn(base);
    };

    let params = split_top_level(&base[open + 1..close], ',');
    let lower = name.to_ascii_lowercase();

    if ARRAY_LIKE.contains(&lower.as_str()) {
        // One `<>` pair unwraps one array level; a nested container in the
        // element position is not unwrapped further.
        let element = match params.last() {
            Some(last) if !last.contains('<') => match parse(last) {
                Type::Undefined => Type::Mixed,
                element => element,
            },
            _ => Type::Mixed,
        };
        return Type::typed_array(element, 1);
    }

    if let Some(keyword) = Type::keyword(&lower) {
        // `class-string<Foo>`, `int<0, max>` and friends keep their base type.
        if !matches!(keyword, Type::Array) {
            return keyword;
        }
    }

    Type::Generic {
        name: name.to_string(),
        params: params.into_iter().map(parse).collect(),
    }
}

fn parse_shape(base: &str, name: &str) -> Type {
    match name.to_ascii_lowercase().as_str() {
        "array" | "list" | "non-empty-array" | "non-empty-list" => {
            Type::typed_array(Type::Mixed, 1)
        }
        "object" => Type::Object,
        _ => Type::fqcn(base),
    }
}

fn parse_callable(name: &str) -> Type {
    if name.eq_ignore_ascii_case("callable") {
        Type::Callable
    } else {
        Type::fqcn(name)
    }
}

fn parse_number(raw: &str) -> Option<Type> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if digits.parse::<i64>().is_ok() {
        Some(Type::Int)
    } else if digits.parse::<f64>().is_ok() {
        Some(Type::Float)
    } else {
        None
    }
}

fn is_quoted(raw: &str) -> bool {
    raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')))
}

/// Index of the bracket closing the one opened at `open`.
fn closing_index(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in raw.char_indices().skip_while(|(idx, _)| *idx < open) {
        match ch {
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on `separator` outside of `<>`, `()`, `{}`, `[]` and quotes.
pub(crate) fn split_top_level(raw: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in raw.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth = depth.saturating_sub(1),
            _ if ch == separator && depth == 0 => {
                parts.push(raw[start..idx].trim());
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(raw[start..].trim());
    parts
}
