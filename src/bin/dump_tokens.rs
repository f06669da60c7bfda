use std::path::Path;

use anyhow::{Context, Result};
use php_type_sniff::analyzer::parser::{PhpParser, TreeSitterPhpParser};
use php_type_sniff::analyzer::signature::SignatureParser;
use php_type_sniff::analyzer::tokens::tokens_for_node;

const DECLARATIONS: &[&str] = &["function_definition", "method_declaration"];

fn print_declarations(node: tree_sitter::Node, source: &str) {
    if DECLARATIONS.contains(&node.kind()) {
        println!(
            "== {} at line {}",
            node.kind(),
            node.start_position().row + 1
        );

        let tokens = tokens_for_node(node, source);
        for token in &tokens {
            println!("{token}");
        }

        match SignatureParser::from_tokens(&tokens) {
            Ok(signature) => println!("{signature:#?}"),
            Err(err) => println!("error: {err}"),
        }
        println!();
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            print_declarations(cursor.node(), source);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn main() -> Result<()> {
    let path = std::env::args().nth(1).context("path argument missing")?;

    let mut parser = TreeSitterPhpParser::new()?;
    let parsed = parser.parse_file(Path::new(&path))?;

    print_declarations(parsed.tree.root_node(), parsed.source.as_str());
    Ok(())
}
