use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use tree_sitter::Parser;

/// A PHP file together with its syntax tree.
pub struct ParsedSource {
    pub path: PathBuf,
    pub source: Arc<String>,
    pub tree: tree_sitter::Tree,
}

/// Trait that abstracts PHP parsing implementations.
pub trait PhpParser {
    fn parse_source(&mut self, path: &Path, source: String) -> Result<ParsedSource>;

    fn parse_file(&mut self, path: &Path) -> Result<ParsedSource> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.parse_source(path, source)
    }
}

/// Parser wrapper that uses tree-sitter-php as the backend.
pub struct TreeSitterPhpParser {
    parser: Parser,
}

impl TreeSitterPhpParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(tree_sitter_php::language())
            .context("failed to load tree-sitter-php language")?;

        Ok(Self { parser })
    }
}

impl PhpParser for TreeSitterPhpParser {
    fn parse_source(&mut self, path: &Path, source: String) -> Result<ParsedSource> {
        let source = Arc::new(source);
        let tree = self
            .parser
            .parse(source.as_str(), None)
            .with_context(|| format!("tree-sitter failed to parse {}", path.display()))?;

        Ok(ParsedSource {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_memory_source() {
        let mut parser = TreeSitterPhpParser::new().expect("parser");
        let parsed = parser
            .parse_source(Path::new("memory.php"), "<?php\nfunction f() {}\n".into())
            .expect("parsed");
        assert_eq!(parsed.path, PathBuf::from("memory.php"));
        assert_eq!(parsed.tree.root_node().kind(), "program");
    }

    #[test]
    fn missing_file_reports_path() {
        let mut parser = TreeSitterPhpParser::new().expect("parser");
        let error = parser
            .parse_file(Path::new("does/not/exist.php"))
            .err()
            .expect("read error");
        assert!(error.to_string().contains("does/not/exist.php"));
    }
}
