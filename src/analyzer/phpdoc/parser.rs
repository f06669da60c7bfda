use std::collections::BTreeMap;

use super::types::*;
use crate::analyzer::error::ParseError;
use crate::analyzer::types::{Type, raw};

pub struct DocBlockParser;

impl DocBlockParser {
    /// Parses a raw `/** ... */` comment whose first line is `start_line`.
    pub fn from_raw(raw: &str, start_line: usize) -> Result<DocBlock, ParseError> {
        let mut description = BTreeMap::new();
        let mut tags: Vec<RawTag> = Vec::new();

        for (offset, line) in raw.lines().enumerate() {
            let line_no = start_line + offset;
            let text = clean_line(line);
            let trimmed = text.trim_start();

            if trimmed.starts_with('@') || trimmed.starts_with("{@") {
                tags.push(RawTag::start(trimmed, line_no)?);
            } else if let Some(tag) = tags.last_mut() {
                tag.append(trimmed.trim());
            } else {
                description.insert(line_no, text.to_string());
            }
        }

        trim_blank_edges(&mut description);

        Ok(DocBlock::new(
            description,
            tags.into_iter().map(RawTag::into_tag).collect(),
        ))
    }
}

/// Strips the comment delimiters, one leading `*` and a single space after
/// it. Deeper indentation is kept.
fn clean_line(line: &str) -> &str {
    let mut text = line.trim_end();
    if let Some(rest) = text.strip_suffix("*/") {
        text = rest;
    }

    let mut text = text.trim_start();
    if let Some(rest) = text.strip_prefix("/**") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix('*') {
        text = rest;
    }

    text.strip_prefix(' ').unwrap_or(text).trim_end()
}

fn trim_blank_edges(description: &mut BTreeMap<usize, String>) {
    while let Some(entry) = description.first_entry() {
        if !entry.get().trim().is_empty() {
            break;
        }
        entry.remove();
    }
    while let Some(entry) = description.last_entry() {
        if !entry.get().trim().is_empty() {
            break;
        }
        entry.remove();
    }
}

fn is_tag_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '\\')
}

struct RawTag {
    line: usize,
    name: String,
    content: String,
}

impl RawTag {
    fn start(text: &str, line: usize) -> Result<Self, ParseError> {
        let body = match text.strip_prefix("{@") {
            Some(rest) => rest.trim_end().strip_suffix('}').unwrap_or(rest),
            None => text.strip_prefix('@').unwrap_or(text),
        };

        let end = body
            .find(|c: char| !is_tag_name_char(c))
            .unwrap_or(body.len());
        if end == 0 {
            return Err(ParseError::EmptyTagName { line });
        }

        Ok(Self {
            line,
            name: body[..end].to_lowercase(),
            content: body[end..].trim().to_string(),
        })
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.content.is_empty() {
            self.content.push(' ');
        }
        self.content.push_str(text);
    }

    fn into_tag(self) -> DocTag {
        match self.name.as_str() {
            "param" => match parse_param(&self.content) {
                Some((ty, name, description)) => DocTag::Param(ParamTag {
                    line: self.line,
                    ty,
                    name,
                    description,
                }),
                None => self.into_generic(),
            },
            "return" => {
                let (ty, description) = split_type(&self.content);
                DocTag::Return(ReturnTag {
                    line: self.line,
                    ty: raw::parse(ty),
                    description: non_empty(description),
                })
            }
            "var" => {
                let (ty, rest) = typed_content(&self.content);
                let (name, description) = match variable_name(rest) {
                    Some((name, description)) => (Some(name), description),
                    None => (None, rest),
                };
                DocTag::Var(VarTag {
                    line: self.line,
                    ty,
                    name,
                    description: non_empty(description),
                })
            }
            _ => self.into_generic(),
        }
    }

    fn into_generic(self) -> DocTag {
        DocTag::Generic(GenericTag {
            line: self.line,
            name: self.name,
            content: non_empty(&self.content),
        })
    }
}

fn parse_param(content: &str) -> Option<(Type, String, Option<String>)> {
    let (ty, rest) = typed_content(content);
    let (name, description) = variable_name(rest)?;
    Some((ty, name, non_empty(description)))
}

/// Type of a `@param`/`@var` tag, which may be omitted before the variable.
fn typed_content(content: &str) -> (Type, &str) {
    if starts_with_variable(content) {
        return (Type::Undefined, content);
    }
    let (ty, rest) = split_type(content);
    (raw::parse(ty), rest)
}

fn starts_with_variable(text: &str) -> bool {
    ["$", "&$", "...$", "&...$"]
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

/// Splits `$name rest` into the bare name and the rest.
fn variable_name(text: &str) -> Option<(String, &str)> {
    if !starts_with_variable(text) {
        return None;
    }

    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let name = text[..end]
        .trim_start_matches(['&', '.'])
        .trim_start_matches('$');
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), text[end..].trim()))
}

/// Splits a tag's content into the type expression and the remainder. The
/// type ends at the first whitespace outside brackets and quotes; a
/// `callable(...): T` return suffix belongs to the type.
fn split_type(content: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut after_colon = false;
    let mut prev: Option<char> = None;

    for (idx, c) in content.char_indices() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            prev = Some(c);
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && prev == Some(')') => after_colon = true,
            c if c.is_whitespace() && depth == 0 => {
                if after_colon {
                    continue;
                }
                return (&content[..idx], content[idx..].trim());
            }
            _ => after_colon = false,
        }
        prev = Some(c);
    }

    (content, "")
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
