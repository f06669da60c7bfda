//! Token stream for a single declaration, produced from the tree-sitter tree.
//!
//! The declaration parsers consume `(kind, text, line)` triples instead of
//! syntax nodes, so they stay independent of grammar-internal node names.

use std::fmt;

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Function,
    Identifier,
    NsSeparator,
    Nullable,
    Ellipsis,
    Ampersand,
    Variable,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    AttributeOpen,
    Equals,
    Semicolon,
    Colon,
    Pipe,
    Literal,
    DocComment,
    Comment,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4} {:<14} {}", self.line, format!("{:?}", self.kind), self.text)
    }
}

/// Nodes emitted as a single token without descending into them.
const ATOMS: &[&str] = &[
    "variable_name",
    "string",
    "encapsed_string",
    "heredoc",
    "nowdoc",
    "comment",
];

/// Walks the leaves of `node` in source order. A function body is reduced
/// to one `OpenBrace` token.
pub fn tokens_for_node(node: Node, source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    push_tokens(node, source, &mut tokens);
    tokens
}

fn push_tokens(node: Node, source: &str, tokens: &mut Vec<Token>) {
    let line = node.start_position().row + 1;

    if node.kind() == "compound_statement" {
        tokens.push(Token::new(TokenKind::OpenBrace, "{", line));
        return;
    }

    if node.child_count() == 0 || ATOMS.contains(&node.kind()) {
        let Ok(text) = node.utf8_text(source.as_bytes()) else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let kind = match node.kind() {
            "function" | "fn" if !node.is_named() => TokenKind::Function,
            _ => classify(text),
        };
        tokens.push(Token::new(kind, text, line));
        return;
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            push_tokens(cursor.node(), source, tokens);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// Assigns a kind from the token text alone. Keywords are recognised by
/// node kind in [`push_tokens`], so a method named `fn` stays an identifier.
fn classify(text: &str) -> TokenKind {
    match text {
        "(" => return TokenKind::OpenParen,
        ")" => return TokenKind::CloseParen,
        "[" => return TokenKind::OpenBracket,
        "]" => return TokenKind::CloseBracket,
        "{" => return TokenKind::OpenBrace,
        "}" => return TokenKind::CloseBrace,
        "#[" => return TokenKind::AttributeOpen,
        "," => return TokenKind::Comma,
        "=" => return TokenKind::Equals,
        ";" => return TokenKind::Semicolon,
        ":" => return TokenKind::Colon,
        "|" => return TokenKind::Pipe,
        "?" => return TokenKind::Nullable,
        "..." => return TokenKind::Ellipsis,
        "&" => return TokenKind::Ampersand,
        "\\" => return TokenKind::NsSeparator,
        _ => {}
    }

    if text.starts_with("/**") && text != "/**/" {
        TokenKind::DocComment
    } else if text.starts_with("//") || text.starts_with('#') || text.starts_with("/*") {
        TokenKind::Comment
    } else if text.starts_with('$') {
        TokenKind::Variable
    } else if is_identifier(text) {
        TokenKind::Identifier
    } else if text.starts_with(|c: char| c.is_ascii_digit() || c == '\'' || c == '"')
        || text.starts_with("<<<")
    {
        TokenKind::Literal
    } else {
        TokenKind::Other
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_alphabetic() || first == '_' || !first.is_ascii())
        && chars.all(|c| c.is_alphanumeric() || c == '_' || !c.is_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_utils::{first_node_of_kind, parse_php};

    #[test]
    fn classifies_by_text() {
        assert_eq!(classify("function"), TokenKind::Identifier);
        assert_eq!(classify("fn"), TokenKind::Identifier);
        assert_eq!(classify("Foo_1"), TokenKind::Identifier);
        assert_eq!(classify("$foo"), TokenKind::Variable);
        assert_eq!(classify("/** @var int */"), TokenKind::DocComment);
        assert_eq!(classify("// note"), TokenKind::Comment);
        assert_eq!(classify("#["), TokenKind::AttributeOpen);
        assert_eq!(classify("'x'"), TokenKind::Literal);
        assert_eq!(classify("12"), TokenKind::Literal);
        assert_eq!(classify("::"), TokenKind::Other);
    }

    #[test]
    fn walks_declaration_leaves_in_order() {
        let source = "<?php\nfunction foo(?int $a = 1, string ...$rest): \\Foo\\Bar\n{\n    return $a;\n}\n";
        let parsed = parse_php(source);
        let node = first_node_of_kind(&parsed, "function_definition").expect("function");
        let tokens = tokens_for_node(node, source);

        let joined: String = tokens.iter().map(|token| token.text.as_str()).collect();
        assert_eq!(joined, "functionfoo(?int$a=1,string...$rest):\\Foo\\Bar{");

        assert!(tokens[0].is(TokenKind::Function));
        assert!(tokens.iter().any(|token| token.is(TokenKind::Nullable)));
        assert!(tokens.iter().any(|token| token.is(TokenKind::Ellipsis)));
        let variables: Vec<&str> = tokens
            .iter()
            .filter(|token| token.is(TokenKind::Variable))
            .map(|token| token.text.as_str())
            .collect();
        assert_eq!(variables, vec!["$a", "$rest"]);

        let body = tokens.last().expect("body token");
        assert!(body.is(TokenKind::OpenBrace));
        assert_eq!(body.line, 3);
    }

    #[test]
    fn keyword_named_methods_are_identifiers() {
        let source = "<?php\nclass A\n{\n    public function fn(): void\n    {\n    }\n}\n";
        let parsed = parse_php(source);
        let node = first_node_of_kind(&parsed, "method_declaration").expect("method");
        let tokens = tokens_for_node(node, source);

        let functions: Vec<&str> = tokens
            .iter()
            .filter(|token| token.is(TokenKind::Function))
            .map(|token| token.text.as_str())
            .collect();
        assert_eq!(functions, vec!["function"]);

        let name = tokens
            .iter()
            .find(|token| token.text == "fn")
            .expect("method name token");
        assert!(name.is(TokenKind::Identifier));
    }

    #[test]
    fn arrow_function_keyword_is_function() {
        let source = "<?php\n$double = fn (int $x): int => $x * 2;\n";
        let parsed = parse_php(source);
        let node = first_node_of_kind(&parsed, "arrow_function").expect("arrow function");
        let tokens = tokens_for_node(node, source);

        assert!(tokens[0].is(TokenKind::Function));
        assert_eq!(tokens[0].text, "fn");
    }
}
