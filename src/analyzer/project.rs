use std::collections::{HashMap, HashSet};

use crate::analyzer::elements::{ClassKind, SourceFile};

/// Class-like declarations of the whole workspace, keyed by lowercased
/// fully-qualified name.
#[derive(Debug, Default)]
pub struct ProjectContext {
    classes: HashMap<String, ClassInfo>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub fqcn: String,
    pub kind: ClassKind,
    /// Resolved `extends` of a class.
    pub parent: Option<String>,
    /// Resolved interfaces, including the parents of an interface.
    pub interfaces: Vec<String>,
    methods: HashSet<String>,
}

impl ClassInfo {
    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.contains(&name.to_lowercase())
    }

    fn ancestors(&self) -> impl Iterator<Item = &String> {
        self.parent.iter().chain(self.interfaces.iter())
    }
}

/// Whether a method overrides or implements one declared by an ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodExtension {
    Extended,
    NotExtended,
    /// Some ancestor is declared outside the analysed files.
    Unknown,
}

/// Metadata about methods that a single file cannot provide.
pub trait MethodMetadata {
    fn method_extension(&self, class_fqcn: &str, method: &str) -> MethodExtension;
}

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: &[SourceFile]) -> Self {
        let mut context = Self::new();
        for file in files {
            context.insert(file);
        }
        context
    }

    pub fn insert(&mut self, file: &SourceFile) {
        for class in &file.classes {
            let namespace = class.namespace.as_deref();
            let info = ClassInfo {
                fqcn: class.fqcn.clone(),
                kind: class.kind,
                parent: class
                    .parent
                    .as_deref()
                    .map(|name| resolve_class_name(namespace, &file.uses, name)),
                interfaces: class
                    .interfaces
                    .iter()
                    .map(|name| resolve_class_name(namespace, &file.uses, name))
                    .collect(),
                methods: class
                    .methods
                    .iter()
                    .map(|method| method.signature.name.to_lowercase())
                    .collect(),
            };
            self.classes.insert(class_key(&class.fqcn), info);
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, fqcn: &str) -> Option<&ClassInfo> {
        self.classes.get(&class_key(fqcn))
    }

    /// Whether any ancestor of `fqcn` is named `interface` (compared by the
    /// last name segment). `None` when the answer depends on classes outside
    /// the project.
    pub fn implements_interface(&self, fqcn: &str, interface: &str) -> Option<bool> {
        let class = self.class(fqcn)?;
        let mut unknown = false;
        let found = self.walk_ancestors(class, &mut |name, info| {
            if short_name(name).eq_ignore_ascii_case(short_name(interface)) {
                return true;
            }
            if info.is_none() {
                unknown = true;
            }
            false
        });

        match (found, unknown) {
            (true, _) => Some(true),
            (false, true) => None,
            (false, false) => Some(false),
        }
    }

    /// Visits every ancestor name once, with its info when it is declared in
    /// the project. Stops early when `visit` returns `true`.
    fn walk_ancestors<F>(&self, class: &ClassInfo, visit: &mut F) -> bool
    where
        F: FnMut(&str, Option<&ClassInfo>) -> bool,
    {
        let mut seen = HashSet::new();
        let mut stack: Vec<&String> = class.ancestors().collect();

        while let Some(name) = stack.pop() {
            if !seen.insert(class_key(name)) {
                continue;
            }

            let info = self.class(name);
            if visit(name, info) {
                return true;
            }
            if let Some(info) = info {
                stack.extend(info.ancestors());
            }
        }

        false
    }
}

impl MethodMetadata for ProjectContext {
    fn method_extension(&self, class_fqcn: &str, method: &str) -> MethodExtension {
        let Some(class) = self.class(class_fqcn) else {
            return MethodExtension::Unknown;
        };
        // trait methods end up in classes this index knows nothing about
        if class.kind == ClassKind::Trait {
            return MethodExtension::Unknown;
        }

        let mut unknown = false;
        let extended = self.walk_ancestors(class, &mut |_, info| match info {
            Some(info) => info.declares_method(method),
            None => {
                unknown = true;
                false
            }
        });

        if extended {
            MethodExtension::Extended
        } else if unknown {
            MethodExtension::Unknown
        } else {
            MethodExtension::NotExtended
        }
    }
}

/// Resolves a class name as written in a file to its fully-qualified form
/// (without a leading separator), through `use` aliases and the namespace.
pub fn resolve_class_name(
    namespace: Option<&str>,
    uses: &HashMap<String, String>,
    written: &str,
) -> String {
    if let Some(absolute) = written.strip_prefix('\\') {
        return absolute.to_owned();
    }

    let (first, remainder) = match written.split_once('\\') {
        Some((first, remainder)) => (first, Some(remainder)),
        None => (written, None),
    };

    if let Some(target) = uses.get(&first.to_ascii_lowercase()) {
        return match remainder {
            Some(remainder) => format!("{target}\\{remainder}"),
            None => target.clone(),
        };
    }

    match namespace {
        Some(ns) => format!("{ns}\\{written}"),
        None => written.to_owned(),
    }
}

fn class_key(name: &str) -> String {
    name.trim_start_matches('\\').to_lowercase()
}

fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::elements::extract;
    use crate::analyzer::rules::test_utils::parse_php;

    fn context(sources: &[&str]) -> ProjectContext {
        let files: Vec<SourceFile> = sources
            .iter()
            .map(|source| extract(&parse_php(source)))
            .collect();
        ProjectContext::from_files(&files)
    }

    #[test]
    fn resolves_names_through_aliases_and_namespace() {
        let uses = HashMap::from([
            ("bar".to_string(), "Vendor\\Bar".to_string()),
            ("lib".to_string(), "Vendor\\Lib".to_string()),
        ]);

        assert_eq!(resolve_class_name(Some("App"), &uses, "\\Foo"), "Foo");
        assert_eq!(resolve_class_name(Some("App"), &uses, "Bar"), "Vendor\\Bar");
        assert_eq!(resolve_class_name(Some("App"), &uses, "Lib\\Item"), "Vendor\\Lib\\Item");
        assert_eq!(resolve_class_name(Some("App"), &uses, "Local"), "App\\Local");
        assert_eq!(resolve_class_name(None, &uses, "Local"), "Local");
    }

    #[test]
    fn detects_overridden_methods_across_files() {
        let context = context(&[
            "<?php\nnamespace App;\n\nclass Base\n{\n    public function run() {}\n}\n",
            "<?php\nnamespace App\\Sub;\n\nuse App\\Base;\n\nclass Child extends Base\n{\n    public function run() {}\n    public function own() {}\n}\n",
        ]);

        assert_eq!(context.len(), 2);
        assert_eq!(
            context.method_extension("App\\Sub\\Child", "RUN"),
            MethodExtension::Extended
        );
        assert_eq!(
            context.method_extension("App\\Sub\\Child", "own"),
            MethodExtension::NotExtended
        );
        assert_eq!(
            context.method_extension("App\\Base", "run"),
            MethodExtension::NotExtended
        );
    }

    #[test]
    fn external_ancestors_make_extension_unknown() {
        let context = context(&[
            "<?php\nclass Job extends \\Vendor\\BaseJob\n{\n    public function handle() {}\n}\n",
            "<?php\ntrait Helper\n{\n    public function help() {}\n}\n",
        ]);

        assert_eq!(
            context.method_extension("Job", "handle"),
            MethodExtension::Unknown
        );
        assert_eq!(
            context.method_extension("Helper", "help"),
            MethodExtension::Unknown
        );
        assert_eq!(
            context.method_extension("Missing", "handle"),
            MethodExtension::Unknown
        );
    }

    #[test]
    fn interface_methods_count_as_extended() {
        let context = context(&[
            "<?php\ninterface Runner\n{\n    public function run(): void;\n}\n\nclass Task implements Runner\n{\n    public function run(): void {}\n}\n",
        ]);

        assert_eq!(
            context.method_extension("Task", "run"),
            MethodExtension::Extended
        );
    }

    #[test]
    fn interface_lookup_through_parents() {
        let context = context(&[
            "<?php\nclass Items implements \\IteratorAggregate {}\nclass MoreItems extends Items {}\nclass Plain {}\nclass Remote extends \\Vendor\\Thing {}\n",
        ]);

        assert_eq!(context.implements_interface("Items", "IteratorAggregate"), Some(true));
        assert_eq!(context.implements_interface("MoreItems", "IteratorAggregate"), Some(true));
        assert_eq!(context.implements_interface("Plain", "IteratorAggregate"), Some(false));
        assert_eq!(context.implements_interface("Remote", "IteratorAggregate"), None);
    }
}
