//! Test utilities for colocated rule tests.
//!
//! Diagnostics are compared in the `"{line:03} {message}"` form used by the
//! `.expect` files of the integration suites.

use std::path::Path;

use tree_sitter::Node;

use crate::analyzer::config::AnalyzerConfig;
use crate::analyzer::elements::extract;
use crate::analyzer::parser::{ParsedSource, PhpParser, TreeSitterPhpParser};
use crate::analyzer::project::ProjectContext;
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::{Analyzer, Diagnostic};

const BANNER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Parse PHP source code into a `ParsedSource` for testing.
pub fn parse_php(source: &str) -> ParsedSource {
    TreeSitterPhpParser::new()
        .expect("failed to load tree-sitter-php language")
        .parse_source(Path::new("test.php"), source.to_string())
        .expect("failed to parse PHP source")
}

/// First node of `kind` in document order.
pub fn first_node_of_kind<'a>(parsed: &'a ParsedSource, kind: &str) -> Option<Node<'a>> {
    fn find<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
        if node.kind() == kind {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.children(&mut cursor).collect();
        children.into_iter().find_map(|child| find(child, kind))
    }

    find(parsed.tree.root_node(), kind)
}

/// Runs every enabled rule of the default configuration on `source`.
pub fn analyse_php(source: &str) -> Vec<Diagnostic> {
    analyse_php_with_config(source, AnalyzerConfig::default())
}

pub fn analyse_php_with_config(source: &str, config: AnalyzerConfig) -> Vec<Diagnostic> {
    Analyzer::new(Some(config))
        .expect("analyzer")
        .analyse_source(Path::new("test.php"), source.to_string())
        .expect("analysis")
}

/// Runs a single rule with a project context holding only this file.
/// Diagnostics are ordered by line, as the analyzer reports them.
pub fn run_rule<R>(rule: &R, source: &str) -> Vec<Diagnostic>
where
    R: DiagnosticRule,
{
    let file = extract(&parse_php(source));
    let context = ProjectContext::from_files(std::slice::from_ref(&file));
    let mut diagnostics = rule.run(&file, &context);
    diagnostics.sort_by_key(|diagnostic| diagnostic.line);
    diagnostics
}

pub fn diagnostic_line(diagnostic: &Diagnostic) -> String {
    format!("{:03} {}", diagnostic.line, diagnostic.message)
}

/// Assert that diagnostics match `expected` exactly, in order.
pub fn assert_messages(diagnostics: &[Diagnostic], expected: &[&str]) {
    let actual: Vec<String> = diagnostics.iter().map(diagnostic_line).collect();
    if actual == expected {
        return;
    }

    let mut error_msg = String::new();
    error_msg.push_str(&format!("\n{BANNER}\n"));
    error_msg.push_str(&format!(
        "Diagnostic mismatch: expected {}, got {}\n",
        expected.len(),
        actual.len()
    ));
    error_msg.push_str(&format!("{BANNER}\n"));

    error_msg.push_str("\nExpected diagnostics:\n");
    for (i, line) in expected.iter().enumerate() {
        error_msg.push_str(&format!("  {:2}. {}\n", i + 1, line));
    }

    error_msg.push_str("\nActual diagnostics:\n");
    for (i, line) in actual.iter().enumerate() {
        error_msg.push_str(&format!("  {:2}. {}\n", i + 1, line));
    }
    error_msg.push_str(&format!("{BANNER}\n"));

    panic!("{}", error_msg);
}

pub fn assert_no_diagnostics(diagnostics: &[Diagnostic]) {
    assert_messages(diagnostics, &[]);
}
