use std::mem;

use crate::analyzer::error::ParseError;
use crate::analyzer::phpdoc::{DocBlock, DocBlockParser};
use crate::analyzer::tokens::{Token, TokenKind};
use crate::analyzer::types::{Type, raw};

use super::{FunctionParam, FunctionSignature, infer_value_type};

const PROMOTION_MODIFIERS: &[&str] = &["public", "protected", "private", "readonly"];
const PROPERTY_MODIFIERS: &[&str] = &[
    "public", "protected", "private", "readonly", "static", "var", "final", "abstract",
];

/// Single forward pass over a declaration's tokens.
pub struct SignatureParser;

impl SignatureParser {
    pub fn from_tokens(tokens: &[Token]) -> Result<FunctionSignature, ParseError> {
        let start = tokens
            .iter()
            .position(|token| token.is(TokenKind::Function))
            .ok_or(ParseError::MissingFunctionName)?;

        let mut name: Option<&Token> = None;
        let mut idx = start + 1;
        loop {
            let Some(token) = tokens.get(idx) else {
                return Err(match name {
                    Some(_) => ParseError::MissingParameterList,
                    None => ParseError::MissingFunctionName,
                });
            };
            idx += 1;
            match token.kind {
                TokenKind::Identifier => name = Some(token),
                TokenKind::OpenParen => break,
                _ => {}
            }
        }
        let name = name.ok_or(ParseError::MissingFunctionName)?;

        let mut params = Vec::new();
        let mut pending = PendingParam::default();
        let mut attribute: Option<AttributeGroup> = None;
        let mut depth = 0usize;
        let mut closing_line = None;

        while let Some(token) = tokens.get(idx) {
            idx += 1;
            pending.last_line = token.line;

            if let Some(group) = attribute.as_mut() {
                if group.feed(token, &mut pending.attributes) {
                    attribute = None;
                }
                continue;
            }

            match token.kind {
                TokenKind::CloseParen if depth == 0 => {
                    closing_line = Some(token.line);
                    pending.flush(&mut params)?;
                    break;
                }
                TokenKind::Comma if depth == 0 => pending.flush(&mut params)?,
                TokenKind::Equals if depth == 0 && pending.default.is_none() => {
                    pending.default = Some(String::new());
                }
                TokenKind::Comment => {}
                _ if pending.default.is_some() => {
                    depth = track_depth(token.kind, depth);
                    if let Some(default) = pending.default.as_mut() {
                        default.push_str(&token.text);
                    }
                }
                TokenKind::AttributeOpen => attribute = Some(AttributeGroup::new()),
                TokenKind::DocComment => pending.doc = Some(token.clone()),
                TokenKind::Ellipsis => pending.variadic = true,
                TokenKind::Ampersand => {
                    let next = tokens.get(idx).map(|next| next.kind);
                    if matches!(next, Some(TokenKind::Variable | TokenKind::Ellipsis)) {
                        pending.by_ref = true;
                    } else {
                        pending.type_text.push('&');
                    }
                }
                TokenKind::Variable => {
                    pending.name = Some(token.text.trim_start_matches('$').to_string());
                    pending.line = token.line;
                }
                TokenKind::Identifier
                    if pending.type_text.is_empty()
                        && pending.name.is_none()
                        && is_modifier(&token.text, PROMOTION_MODIFIERS) =>
                {
                    pending.promoted = true;
                }
                TokenKind::Identifier
                | TokenKind::NsSeparator
                | TokenKind::Nullable
                | TokenKind::Pipe => pending.type_text.push_str(&token.text),
                TokenKind::OpenParen | TokenKind::CloseParen => {
                    depth = track_depth(token.kind, depth);
                    pending.type_text.push_str(&token.text);
                }
                _ => {}
            }
        }

        let mut return_line = closing_line.ok_or(ParseError::MissingParameterList)?;
        let mut return_text = String::new();
        while let Some(token) = tokens.get(idx) {
            idx += 1;
            match token.kind {
                TokenKind::Semicolon | TokenKind::OpenBrace => break,
                TokenKind::Identifier
                | TokenKind::NsSeparator
                | TokenKind::Nullable
                | TokenKind::Pipe
                | TokenKind::Ampersand
                | TokenKind::OpenParen
                | TokenKind::CloseParen => {
                    return_text.push_str(&token.text);
                    return_line = token.line;
                }
                _ => {}
            }
        }

        Ok(FunctionSignature {
            line: name.line,
            name: name.text.clone(),
            params,
            return_type: raw::parse(&return_text),
            return_line,
        })
    }
}

/// Declared type of a property declaration: the type tokens after the
/// attributes and modifiers, up to the first variable.
pub fn declared_type(tokens: &[Token]) -> Type {
    let mut text = String::new();
    let mut attribute: Option<AttributeGroup> = None;
    let mut ignored = Vec::new();

    for token in tokens {
        if let Some(group) = attribute.as_mut() {
            if group.feed(token, &mut ignored) {
                attribute = None;
            }
            continue;
        }

        match token.kind {
            TokenKind::Variable => break,
            TokenKind::AttributeOpen => attribute = Some(AttributeGroup::new()),
            TokenKind::Identifier if text.is_empty() && is_modifier(&token.text, PROPERTY_MODIFIERS) => {}
            TokenKind::Identifier
            | TokenKind::NsSeparator
            | TokenKind::Nullable
            | TokenKind::Pipe
            | TokenKind::Ampersand
            | TokenKind::OpenParen
            | TokenKind::CloseParen => text.push_str(&token.text),
            _ => {}
        }
    }

    raw::parse(&text)
}

fn is_modifier(text: &str, modifiers: &[&str]) -> bool {
    modifiers
        .iter()
        .any(|modifier| modifier.eq_ignore_ascii_case(text))
}

fn track_depth(kind: TokenKind, depth: usize) -> usize {
    match kind {
        TokenKind::OpenParen
        | TokenKind::OpenBracket
        | TokenKind::OpenBrace
        | TokenKind::AttributeOpen => depth + 1,
        TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
            depth.saturating_sub(1)
        }
        _ => depth,
    }
}

#[derive(Default)]
struct PendingParam {
    type_text: String,
    default: Option<String>,
    name: Option<String>,
    line: usize,
    last_line: usize,
    attributes: Vec<String>,
    doc: Option<Token>,
    variadic: bool,
    by_ref: bool,
    promoted: bool,
}

impl PendingParam {
    fn flush(&mut self, params: &mut Vec<FunctionParam>) -> Result<(), ParseError> {
        let pending = mem::take(self);
        let Some(name) = pending.name else {
            if pending.type_text.is_empty() && pending.default.is_none() {
                return Ok(());
            }
            return Err(ParseError::MissingParameterName {
                line: pending.last_line,
            });
        };

        let doc_block = match &pending.doc {
            Some(token) => DocBlockParser::from_raw(&token.text, token.line)?,
            None => DocBlock::undefined(),
        };

        params.push(FunctionParam {
            line: pending.line,
            name,
            fn_type: raw::parse(&pending.type_text),
            default_type: pending.default.as_deref().map(infer_value_type),
            attributes: pending.attributes,
            doc_block,
            variadic: pending.variadic,
            by_ref: pending.by_ref,
            promoted: pending.promoted,
        });
        Ok(())
    }
}

/// Collects attribute names from one `#[...]` group.
struct AttributeGroup {
    depth: usize,
    current: Option<String>,
}

impl AttributeGroup {
    fn new() -> Self {
        Self {
            depth: 1,
            current: Some(String::new()),
        }
    }

    /// Returns `true` once the group is closed.
    fn feed(&mut self, token: &Token, names: &mut Vec<String>) -> bool {
        if let Some(mut current) = self.current.take() {
            if matches!(token.kind, TokenKind::Identifier | TokenKind::NsSeparator) {
                current.push_str(&token.text);
                self.current = Some(current);
                return false;
            }
            if !current.is_empty() {
                names.push(current);
            }
        }

        match token.kind {
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                self.depth = self.depth.saturating_sub(1);
                return self.depth == 0;
            }
            TokenKind::Comma if self.depth == 1 => self.current = Some(String::new()),
            kind => self.depth = track_depth(kind, self.depth),
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::phpdoc::DocTag;
    use crate::analyzer::rules::test_utils::{first_node_of_kind, parse_php};
    use crate::analyzer::tokens::tokens_for_node;

    fn signature_of(source: &str, kind: &str) -> Result<FunctionSignature, ParseError> {
        let parsed = parse_php(source);
        let node = first_node_of_kind(&parsed, kind).expect("declaration node");
        SignatureParser::from_tokens(&tokens_for_node(node, source))
    }

    fn tok(kind: TokenKind, text: &str, line: usize) -> Token {
        Token::new(kind, text, line)
    }

    #[test]
    fn parses_function_without_params() {
        let sig = signature_of("<?php\n\nfunction func1() {}\n", "function_definition")
            .expect("signature");
        assert_eq!(sig.line, 3);
        assert_eq!(sig.name, "func1");
        assert!(sig.params.is_empty());
        assert_eq!(sig.return_type, Type::Undefined);
        assert_eq!(sig.return_line, 3);
    }

    #[test]
    fn parses_param_types_and_return_type() {
        let source = "<?php\n\nfunction func2($a, int $b, ?string $c, self $d): array {}\n";
        let sig = signature_of(source, "function_definition").expect("signature");

        let summary: Vec<(usize, &str, Type)> = sig
            .params
            .iter()
            .map(|param| (param.line, param.name.as_str(), param.fn_type.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (3, "a", Type::Undefined),
                (3, "b", Type::Int),
                (3, "c", Type::nullable(Type::String)),
                (3, "d", Type::SelfType),
            ]
        );
        assert_eq!(sig.return_type, Type::Array);
        assert_eq!(sig.return_line, 3);
        assert!(sig.params.iter().all(|param| param.default_type.is_none()));
    }

    #[test]
    fn multi_line_signature_with_defaults() {
        let source = r#"<?php

function func3(
    ?\Space\Class1 $arg1,
    bool $arg2,
    $arg3 = false,
    int $arg4 = null,
    int $arg5
): \Space1\Class2 {
    return new \Space1\Class2();
}
"#;
        let sig = signature_of(source, "function_definition").expect("signature");
        assert_eq!(sig.line, 3);
        assert_eq!(sig.params.len(), 5);

        let arg1 = &sig.params[0];
        assert_eq!(arg1.line, 4);
        assert_eq!(arg1.fn_type, Type::nullable(Type::fqcn("\\Space\\Class1")));

        assert_eq!(sig.params[2].fn_type, Type::Undefined);
        assert_eq!(sig.params[2].default_type, Some(Type::Bool));
        assert_eq!(sig.params[3].default_type, Some(Type::Null));
        assert_eq!(sig.params[4].line, 8);
        assert_eq!(sig.params[4].default_type, None);

        assert_eq!(sig.return_type, Type::fqcn("\\Space1\\Class2"));
        assert_eq!(sig.return_line, 9);
    }

    #[test]
    fn union_return_type() {
        let source = "<?php\nfunction func1(\n    int $arg1,\n    string $arg2\n): int|false {\n}\n";
        let sig = signature_of(source, "function_definition").expect("signature");
        assert_eq!(sig.return_type, Type::union([Type::Int, Type::False]));
        assert_eq!(sig.return_line, 5);
    }

    #[test]
    fn variadic_and_reference_params() {
        let source = "<?php\nfunction f(array &$items, string ...$rest): void {}\n";
        let sig = signature_of(source, "function_definition").expect("signature");
        assert!(sig.params[0].by_ref);
        assert!(!sig.params[0].variadic);
        assert!(sig.params[1].variadic);
        assert_eq!(sig.params[1].fn_type, Type::String);
        assert_eq!(sig.return_type, Type::Void);
    }

    #[test]
    fn nested_default_values_do_not_split_params() {
        let source = "<?php\nfunction f($a = [1, 2], $b = array('x' => 1), $c = -1) {}\n";
        let sig = signature_of(source, "function_definition").expect("signature");
        let defaults: Vec<Option<Type>> =
            sig.params.iter().map(|param| param.default_type.clone()).collect();
        assert_eq!(
            defaults,
            vec![Some(Type::Array), Some(Type::Array), Some(Type::Int)]
        );
    }

    #[test]
    fn promoted_constructor_params() {
        let source = r#"<?php

class A
{
    public function __construct(
        private int $arg1,
        $arg2,
        /** @var int[]|int|false */
        public array|int|false $arg3 = false,
        protected ?bool $arg4 = true,
    ) {
    }
}
"#;
        let sig = signature_of(source, "method_declaration").expect("signature");
        assert_eq!(sig.name, "__construct");
        assert_eq!(sig.line, 5);
        assert_eq!(sig.params.len(), 4);

        assert!(sig.params[0].promoted);
        assert_eq!(sig.params[0].fn_type, Type::Int);
        assert!(!sig.params[1].promoted);
        assert!(sig.params[1].doc_block.is_undefined());

        let arg3 = &sig.params[2];
        assert!(arg3.promoted);
        assert_eq!(arg3.line, 9);
        assert_eq!(
            arg3.fn_type,
            Type::union([Type::Array, Type::Int, Type::False])
        );
        assert_eq!(arg3.default_type, Some(Type::Bool));
        match arg3.doc_block.tags() {
            [DocTag::Var(tag)] => {
                assert_eq!(tag.line, 8);
                assert_eq!(
                    tag.ty,
                    Type::union([Type::typed_array(Type::Int, 1), Type::Int, Type::False])
                );
            }
            other => panic!("unexpected tags {other:?}"),
        }

        assert_eq!(sig.params[3].fn_type, Type::nullable(Type::Bool));
        assert_eq!(sig.return_type, Type::Undefined);
        assert_eq!(sig.return_line, 11);
    }

    #[test]
    fn readonly_modifier_and_attributes_are_not_types() {
        let tokens = vec![
            tok(TokenKind::Function, "function", 1),
            tok(TokenKind::Identifier, "__construct", 1),
            tok(TokenKind::OpenParen, "(", 1),
            tok(TokenKind::AttributeOpen, "#[", 2),
            tok(TokenKind::Identifier, "Assert", 2),
            tok(TokenKind::NsSeparator, "\\", 2),
            tok(TokenKind::Identifier, "NotBlank", 2),
            tok(TokenKind::OpenParen, "(", 2),
            tok(TokenKind::CloseParen, ")", 2),
            tok(TokenKind::Comma, ",", 2),
            tok(TokenKind::Identifier, "Sensitive", 2),
            tok(TokenKind::CloseBracket, "]", 2),
            tok(TokenKind::Identifier, "readonly", 3),
            tok(TokenKind::Nullable, "?", 3),
            tok(TokenKind::Identifier, "string", 3),
            tok(TokenKind::Variable, "$name", 3),
            tok(TokenKind::CloseParen, ")", 4),
            tok(TokenKind::OpenBrace, "{", 4),
        ];

        let sig = SignatureParser::from_tokens(&tokens).expect("signature");
        let param = &sig.params[0];
        assert_eq!(param.attributes, vec!["Assert\\NotBlank", "Sensitive"]);
        assert!(param.promoted);
        assert_eq!(param.fn_type, Type::nullable(Type::String));
        assert_eq!(sig.return_line, 4);
    }

    #[test]
    fn missing_function_name_is_an_error() {
        let tokens = vec![
            tok(TokenKind::Function, "function", 1),
            tok(TokenKind::OpenParen, "(", 1),
            tok(TokenKind::CloseParen, ")", 1),
        ];
        assert_eq!(
            SignatureParser::from_tokens(&tokens),
            Err(ParseError::MissingFunctionName)
        );
        assert_eq!(
            SignatureParser::from_tokens(&[]),
            Err(ParseError::MissingFunctionName)
        );
    }

    #[test]
    fn missing_parameter_list_is_an_error() {
        let tokens = vec![
            tok(TokenKind::Function, "function", 1),
            tok(TokenKind::Identifier, "broken", 1),
        ];
        assert_eq!(
            SignatureParser::from_tokens(&tokens),
            Err(ParseError::MissingParameterList)
        );
    }

    #[test]
    fn type_without_parameter_name_is_an_error() {
        let tokens = vec![
            tok(TokenKind::Function, "function", 1),
            tok(TokenKind::Identifier, "f", 1),
            tok(TokenKind::OpenParen, "(", 1),
            tok(TokenKind::Identifier, "int", 2),
            tok(TokenKind::CloseParen, ")", 2),
        ];
        assert_eq!(
            SignatureParser::from_tokens(&tokens),
            Err(ParseError::MissingParameterName { line: 2 })
        );
    }

    #[test]
    fn property_declared_type_skips_modifiers() {
        let source = "<?php\nclass A {\n    public static ?\\Foo\\Bar $bar = null;\n}\n";
        let parsed = parse_php(source);
        let node = first_node_of_kind(&parsed, "property_declaration").expect("property");
        assert_eq!(
            declared_type(&tokens_for_node(node, source)),
            Type::nullable(Type::fqcn("\\Foo\\Bar"))
        );

        let untyped = vec![
            tok(TokenKind::Identifier, "var", 1),
            tok(TokenKind::Variable, "$x", 1),
        ];
        assert_eq!(declared_type(&untyped), Type::Undefined);
    }

    #[test]
    fn method_named_fn_keeps_its_name() {
        let source = "<?php\nclass A\n{\n    public function fn(int $x): void\n    {\n    }\n}\n";
        let sig = signature_of(source, "method_declaration").expect("signature");
        assert_eq!(sig.name, "fn");
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.return_type, Type::Void);
    }
}
