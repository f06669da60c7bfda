//! Declarations of a parsed file that carry type information: functions,
//! class-likes and their methods, properties and constants.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;
use tree_sitter::Node;

use crate::analyzer::error::ParseError;
use crate::analyzer::ignore::IgnoreState;
use crate::analyzer::parser::ParsedSource;
use crate::analyzer::phpdoc::{DocBlock, DocBlockParser};
use crate::analyzer::signature::{
    FunctionSignature, SignatureParser, declared_type, infer_value_type,
};
use crate::analyzer::tokens::tokens_for_node;
use crate::analyzer::types::Type;

/// Everything the rules need from one file. The syntax tree is not kept.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: Arc<String>,
    /// First namespace declared in the file.
    pub namespace: Option<String>,
    /// Lowercased alias to imported name.
    pub uses: HashMap<String, String>,
    pub functions: Vec<FunctionElement>,
    pub classes: Vec<ClassElement>,
    pub failures: Vec<ParseFailure>,
    pub ignore: IgnoreState,
}

impl SourceFile {
    /// Source text of a 1-based line.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.source.lines().nth(line.checked_sub(1)?)
    }
}

/// A declaration skipped because its signature or doc comment was malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FunctionElement {
    pub line: usize,
    pub signature: FunctionSignature,
    pub doc_block: DocBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Clone)]
pub struct ClassElement {
    pub line: usize,
    pub kind: ClassKind,
    pub name: String,
    /// Namespace-qualified name without a leading separator.
    pub fqcn: String,
    pub namespace: Option<String>,
    pub doc_block: DocBlock,
    /// `extends` of a class, as written.
    pub parent: Option<String>,
    /// `implements` of a class or enum, `extends` of an interface; as written.
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodElement>,
    pub properties: Vec<PropertyElement>,
    pub constants: Vec<ConstElement>,
}

impl ClassElement {
    pub fn property(&self, name: &str) -> Option<&PropertyElement> {
        self.properties.iter().find(|prop| prop.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct MethodElement {
    pub line: usize,
    pub signature: FunctionSignature,
    pub doc_block: DocBlock,
    /// Property returned by a `return $this->prop;` body.
    pub basic_getter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PropertyElement {
    pub line: usize,
    /// Name without `$`.
    pub name: String,
    pub fn_type: Type,
    /// Type of the default value; `None` without one.
    pub value_type: Option<Type>,
    pub doc_block: DocBlock,
}

#[derive(Debug, Clone)]
pub struct ConstElement {
    pub line: usize,
    pub name: String,
    pub value_type: Type,
    pub doc_block: DocBlock,
}

/// Extracts the typed declarations of a parsed file.
pub fn extract(parsed: &ParsedSource) -> SourceFile {
    let mut extractor = Extractor {
        parsed,
        namespace: None,
        file: SourceFile {
            path: parsed.path.clone(),
            source: Arc::clone(&parsed.source),
            namespace: None,
            uses: HashMap::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            failures: Vec::new(),
            ignore: IgnoreState::from_source(&parsed.source),
        },
    };

    extractor.visit_children(parsed.tree.root_node());
    extractor.file
}

struct Extractor<'a> {
    parsed: &'a ParsedSource,
    namespace: Option<String>,
    file: SourceFile,
}

impl<'a> Extractor<'a> {
    fn visit_children(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                self.visit(cursor.node());
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
    }

    fn visit(&mut self, node: Node<'a>) {
        match node.kind() {
            "namespace_definition" => self.namespace(node),
            "namespace_use_declaration" => self.use_declaration(node),
            "function_definition" => {
                if let Some(function) = self.function(node) {
                    self.file.functions.push(function);
                }
            }
            "class_declaration" => self.class_like(node, ClassKind::Class),
            "interface_declaration" => self.class_like(node, ClassKind::Interface),
            "trait_declaration" => self.class_like(node, ClassKind::Trait),
            "enum_declaration" => self.class_like(node, ClassKind::Enum),
            _ => self.visit_children(node),
        }
    }

    fn namespace(&mut self, node: Node<'a>) {
        let name = child_by_kind(node, "namespace_name").and_then(|name| self.text(name));
        if self.file.namespace.is_none() {
            self.file.namespace = name.clone();
        }

        match child_by_kind(node, "compound_statement") {
            Some(body) => {
                let outer = std::mem::replace(&mut self.namespace, name);
                self.visit_children(body);
                self.namespace = outer;
            }
            None => self.namespace = name,
        }
    }

    fn use_declaration(&mut self, node: Node<'a>) {
        // `use function` and `use const` import no class names
        let keyword = self.text_of_first_token(node);
        if keyword.as_deref().is_some_and(|keyword| {
            keyword.eq_ignore_ascii_case("function") || keyword.eq_ignore_ascii_case("const")
        }) {
            return;
        }

        let prefix = child_by_kind(node, "namespace_name").and_then(|name| self.text(name));
        let mut clauses = Vec::new();
        walk_node(node, &mut |child| {
            if matches!(child.kind(), "namespace_use_clause" | "namespace_use_group_clause") {
                clauses.push(child);
            }
        });

        for clause in clauses {
            let Some(target) = (0..clause.named_child_count())
                .filter_map(|idx| clause.named_child(idx))
                .find(|child| matches!(child.kind(), "qualified_name" | "name" | "namespace_name"))
                .and_then(|child| self.text(child))
            else {
                continue;
            };

            let target = match &prefix {
                Some(prefix) => format!("{}\\{}", prefix.trim_end_matches('\\'), target),
                None => target,
            };
            let target = target.trim_start_matches('\\').to_string();

            let alias = child_by_kind(clause, "namespace_aliasing_clause")
                .and_then(|alias| child_by_kind(alias, "name"))
                .and_then(|alias| self.text(alias))
                .or_else(|| target.rsplit('\\').next().map(str::to_string));

            if let Some(alias) = alias {
                self.file.uses.insert(alias.to_ascii_lowercase(), target);
            }
        }
    }

    fn function(&mut self, node: Node<'a>) -> Option<FunctionElement> {
        let signature = self.signature(node)?;
        let doc_block = self.doc_block_before(node)?;

        Some(FunctionElement {
            line: signature.line,
            signature,
            doc_block,
        })
    }

    fn class_like(&mut self, node: Node<'a>, kind: ClassKind) {
        let Some(name_node) = child_by_kind(node, "name") else {
            return;
        };
        let Some(name) = self.text(name_node) else {
            return;
        };

        let fqcn = match &self.namespace {
            Some(namespace) => format!("{namespace}\\{name}"),
            None => name.clone(),
        };
        let doc_block = self
            .doc_block_before(node)
            .unwrap_or_else(DocBlock::undefined);

        let mut parent = None;
        let mut interfaces = Vec::new();
        if let Some(base) = child_by_kind(node, "base_clause") {
            let names = self.class_names(base);
            match kind {
                ClassKind::Interface => interfaces.extend(names),
                _ => parent = names.into_iter().next(),
            }
        }
        if let Some(clause) = child_by_kind(node, "class_interface_clause") {
            interfaces.extend(self.class_names(clause));
        }

        let mut class = ClassElement {
            line: name_node.start_position().row + 1,
            kind,
            name,
            fqcn,
            namespace: self.namespace.clone(),
            doc_block,
            parent,
            interfaces,
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
        };

        let body = child_by_kind(node, "declaration_list")
            .or_else(|| child_by_kind(node, "enum_declaration_list"));
        if let Some(body) = body {
            for idx in 0..body.named_child_count() {
                let Some(member) = body.named_child(idx) else {
                    continue;
                };
                match member.kind() {
                    "method_declaration" => {
                        if let Some(method) = self.method(member) {
                            class.methods.push(method);
                        }
                    }
                    "property_declaration" => self.properties(member, &mut class.properties),
                    "const_declaration" => self.constants(member, &mut class.constants),
                    _ => {}
                }
            }
        }

        self.file.classes.push(class);
    }

    fn method(&mut self, node: Node<'a>) -> Option<MethodElement> {
        let signature = self.signature(node)?;
        let doc_block = self.doc_block_before(node)?;
        let basic_getter = child_by_kind(node, "compound_statement")
            .and_then(|body| self.text(body))
            .and_then(|body| basic_getter_property(&body));

        Some(MethodElement {
            line: signature.line,
            signature,
            doc_block,
            basic_getter,
        })
    }

    fn properties(&mut self, node: Node<'a>, properties: &mut Vec<PropertyElement>) {
        let Some(doc_block) = self.doc_block_before(node) else {
            return;
        };
        let fn_type = declared_type(&tokens_for_node(node, &self.parsed.source));

        for idx in 0..node.named_child_count() {
            let Some(element) = node.named_child(idx) else {
                continue;
            };
            if element.kind() != "property_element" {
                continue;
            }
            let Some(text) = self.text(element) else {
                continue;
            };

            let (name, value) = split_assignment(&text);
            properties.push(PropertyElement {
                line: element.start_position().row + 1,
                name: name.trim_start_matches('$').to_string(),
                fn_type: fn_type.clone(),
                value_type: value.map(infer_value_type),
                doc_block: doc_block.clone(),
            });
        }
    }

    fn constants(&mut self, node: Node<'a>, constants: &mut Vec<ConstElement>) {
        let Some(doc_block) = self.doc_block_before(node) else {
            return;
        };

        for idx in 0..node.named_child_count() {
            let Some(element) = node.named_child(idx) else {
                continue;
            };
            if element.kind() != "const_element" {
                continue;
            }
            let Some(text) = self.text(element) else {
                continue;
            };

            let (name, value) = split_assignment(&text);
            constants.push(ConstElement {
                line: element.start_position().row + 1,
                name: name.to_string(),
                value_type: value.map(infer_value_type).unwrap_or(Type::Undefined),
                doc_block: doc_block.clone(),
            });
        }
    }

    fn signature(&mut self, node: Node<'a>) -> Option<FunctionSignature> {
        let tokens = tokens_for_node(node, &self.parsed.source);
        match SignatureParser::from_tokens(&tokens) {
            Ok(signature) => Some(signature),
            Err(error) => {
                self.fail(node.start_position().row + 1, error);
                None
            }
        }
    }

    /// Doc comment directly preceding `node`, `DocBlock::undefined()` when
    /// there is none, or `None` when it could not be parsed.
    fn doc_block_before(&mut self, node: Node<'a>) -> Option<DocBlock> {
        let Some(comment) = node
            .prev_sibling()
            .filter(|prev| prev.kind() == "comment")
        else {
            return Some(DocBlock::undefined());
        };
        let Some(text) = self.text(comment) else {
            return Some(DocBlock::undefined());
        };
        if !text.starts_with("/**") {
            return Some(DocBlock::undefined());
        }

        let line = comment.start_position().row + 1;
        match DocBlockParser::from_raw(&text, line) {
            Ok(doc_block) => Some(doc_block),
            Err(error) => {
                self.fail(line, error);
                None
            }
        }
    }

    fn class_names(&self, clause: Node<'a>) -> Vec<String> {
        (0..clause.named_child_count())
            .filter_map(|idx| clause.named_child(idx))
            .filter(|child| matches!(child.kind(), "name" | "qualified_name"))
            .filter_map(|child| self.text(child))
            .collect()
    }

    fn fail(&mut self, line: usize, error: ParseError) {
        warn!(
            file = %self.parsed.path.display(),
            line,
            "skipping declaration: {error}"
        );
        self.file.failures.push(ParseFailure {
            line,
            message: error.to_string(),
        });
    }

    fn text(&self, node: Node<'a>) -> Option<String> {
        node_text(node, self.parsed)
    }

    fn text_of_first_token(&self, node: Node<'a>) -> Option<String> {
        let keyword = node.child(1)?;
        self.text(keyword)
    }
}

/// `$prop = value` or `NAME = value`.
fn split_assignment(text: &str) -> (&str, Option<&str>) {
    match text.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (text.trim(), None),
    }
}

/// Property name when the body is exactly `{ return $this->prop; }`.
fn basic_getter_property(body: &str) -> Option<String> {
    let inner = body.trim().strip_prefix('{')?.strip_suffix('}')?.trim();
    let expression = inner
        .strip_prefix("return")?
        .trim_start()
        .strip_suffix(';')?
        .trim_end();
    let property = expression.strip_prefix("$this->")?;

    let valid = property
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && property.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| property.to_string())
}

fn walk_node<'a, F>(node: Node<'a>, callback: &mut F)
where
    F: FnMut(Node<'a>),
{
    callback(node);
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            walk_node(cursor.node(), callback);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    (0..node.named_child_count())
        .filter_map(|idx| node.named_child(idx))
        .find(|child| child.kind() == kind)
}

fn node_text(node: Node, parsed: &ParsedSource) -> Option<String> {
    node.utf8_text(parsed.source.as_bytes())
        .ok()
        .map(|text| text.trim().to_owned())
}
