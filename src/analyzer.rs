pub mod config;
pub mod elements;
pub mod error;
pub mod ignore;
pub mod inspection;
pub mod parser;
pub mod phpdoc;
pub mod project;
pub mod rules;
pub mod signature;
pub mod tokens;
pub mod types;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use config::AnalyzerConfig;
use elements::SourceFile;
use parser::PhpParser;
use project::ProjectContext;

/// Represents the severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic emitted for one line of a file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub severity: Severity,
    /// 1-based.
    pub line: usize,
    /// Name of the rule that raised it.
    pub code: String,
    pub message: String,
    pub snippet_line: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticJson {
    pub file: String,
    pub line: usize,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        file: PathBuf,
        severity: Severity,
        code: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file,
            severity,
            line,
            code: code.into(),
            message: message.into(),
            snippet_line: None,
        }
    }

    pub fn with_snippet(mut self, snippet_line: Option<String>) -> Self {
        self.snippet_line = snippet_line;
        self
    }

    pub fn to_json(&self) -> DiagnosticJson {
        DiagnosticJson {
            file: self.file.display().to_string(),
            line: self.line,
            severity: self.severity,
            code: self.code.clone(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RESET: &str = "\x1b[0m";
        const DIM: &str = "\x1b[2m";
        const BOLD_RED: &str = "\x1b[1;31m";
        const BOLD_YELLOW: &str = "\x1b[1;33m";
        const BLUE: &str = "\x1b[34m";

        let severity_color = match self.severity {
            Severity::Warning | Severity::Info => BOLD_YELLOW,
            Severity::Error => BOLD_RED,
        };
        writeln!(
            f,
            "{}{}{}: {} {}[{}]{}",
            severity_color, self.severity, RESET, self.message, DIM, self.code, RESET
        )?;
        writeln!(f, " --> {}:{}", self.file.display(), self.line)?;

        if let Some(line) = &self.snippet_line {
            writeln!(f, "{BLUE}    |{RESET}")?;
            writeln!(f, "{BLUE}{:>3}{RESET} {BLUE}|{RESET} {}", self.line, line)?;
            writeln!(f, "{BLUE}    |{RESET}")?;
        }

        Ok(())
    }
}

/// Parses PHP files, builds the project class index and runs the rules.
pub struct Analyzer {
    config: AnalyzerConfig,
    rules: Vec<Box<dyn rules::DiagnosticRule>>,
}

impl Analyzer {
    pub fn new(config: Option<AnalyzerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        // surfaces a broken grammar before any file is touched
        parser::TreeSitterPhpParser::new()?;
        let rules = rules::all(&config);

        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyse_file(&mut self, path: &Path) -> Result<Vec<Diagnostic>> {
        let root = path.parent().unwrap_or(path);
        self.analyse_files_with_progress(&[path.to_path_buf()], root, None)
    }

    pub fn analyse_root(&mut self, root: &Path) -> Result<Vec<Diagnostic>> {
        let paths = collect_php_files(root)?;
        self.analyse_files_with_progress(&paths, root, None)
    }

    /// Analyses in-memory source as if it were the file at `path`.
    pub fn analyse_source(&self, path: &Path, source: String) -> Result<Vec<Diagnostic>> {
        let parsed = parser::TreeSitterPhpParser::new()?.parse_source(path, source)?;
        let files = vec![elements::extract(&parsed)];
        Ok(self.run_rules(&files, None))
    }

    pub fn analyse_files_with_progress(
        &mut self,
        paths: &[PathBuf],
        root: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<Diagnostic>> {
        debug!(files = paths.len(), root = %root.display(), "analysing");
        if let Some(pb) = progress {
            pb.set_message("Parsing");
        }

        let mut files = paths
            .par_iter()
            .map_init(
                parser::TreeSitterPhpParser::new,
                |parser, path| -> Result<SourceFile> {
                    let parser = parser.as_mut().map_err(|err| anyhow::anyhow!("{err}"))?;
                    let parsed = parser.parse_file(path)?;
                    Ok(elements::extract(&parsed))
                },
            )
            .collect::<Result<Vec<_>>>()?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        if let Some(pb) = progress {
            pb.set_message("Checking");
        }
        Ok(self.run_rules(&files, progress))
    }

    fn run_rules(&self, files: &[SourceFile], progress: Option<&ProgressBar>) -> Vec<Diagnostic> {
        let context = ProjectContext::from_files(files);
        debug!(classes = context.len(), "indexed project classes");

        let enabled_rules: Vec<&dyn rules::DiagnosticRule> = self
            .rules
            .iter()
            .map(|rule| &**rule)
            .filter(|rule| {
                let enabled = self.config.enabled(rule.name());
                if !enabled {
                    debug!(rule = rule.name(), "rule disabled");
                }
                enabled
            })
            .collect();

        let per_file: Vec<Vec<Diagnostic>> = files
            .par_iter()
            .map(|file| {
                let diagnostics = check_file(file, &enabled_rules, &context);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                diagnostics
            })
            .collect();

        per_file.into_iter().flatten().collect()
    }
}

fn check_file(
    file: &SourceFile,
    rules: &[&dyn rules::DiagnosticRule],
    context: &ProjectContext,
) -> Vec<Diagnostic> {
    if file.ignore.ignores_everything() {
        debug!(file = %file.path.display(), "ignored by directive");
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    for rule in rules {
        let found = rule.run(file, context);
        debug!(
            file = %file.path.display(),
            rule = rule.name(),
            count = found.len(),
            "rule finished"
        );
        diagnostics.extend(found);
    }

    diagnostics.sort_by_key(|diagnostic| diagnostic.line);
    diagnostics
}

pub fn collect_php_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(if is_php_file(root) {
            vec![root.to_path_buf()]
        } else {
            vec![]
        });
    }

    let mut php_files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if entry.file_type().is_file() && is_php_file(path) {
            php_files.push(path.to_path_buf());
        }
    }

    php_files.sort();
    Ok(php_files)
}

pub fn collect_php_files_from_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut php_files = Vec::new();
    for root in roots {
        php_files.extend(collect_php_files(root)?);
    }
    php_files.sort();
    php_files.dedup();
    Ok(php_files)
}

pub fn is_php_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::rules::test_utils::{analyse_php, analyse_php_with_config, assert_messages};

    const SOURCE: &str = r#"<?php
class Sample
{
    private $untyped;

    public function run($input)
    {
    }
}
"#;

    #[test]
    fn runs_all_rules_in_line_order() {
        assert_messages(
            &analyse_php(SOURCE),
            &[
                "004 Add PHPDoc for property $untyped",
                "006 Add type declaration for parameter $input or create PHPDoc with type hint",
                "006 Missing PHPDoc tag or void type declaration for return value",
            ],
        );
    }

    #[test]
    fn disabled_rules_do_not_run() {
        let config =
            AnalyzerConfig::from_yaml("rules:\n  type_sniff: false\n  type_sniff/property: true\n")
                .expect("config");
        assert_messages(
            &analyse_php_with_config(SOURCE, config),
            &["004 Add PHPDoc for property $untyped"],
        );
    }

    #[test]
    fn ignore_directives_suppress_diagnostics() {
        let source = r#"<?php
class Sample
{
    // type-sniff-ignore: type_sniff/property
    private $untyped;

    /* type-sniff-ignore */
    public function run($input)
    {
    }
}
"#;
        assert_messages(&analyse_php(source), &[]);

        let source = "<?php\n// type-sniff-ignore-file\nfunction f($a) {}\n";
        assert_messages(&analyse_php(source), &[]);
    }

    #[test]
    fn diagnostic_rendering() {
        let diagnostic = Diagnostic::new(
            PathBuf::from("src/Foo.php"),
            Severity::Warning,
            "type_sniff/method",
            12,
            "Useless PHPDoc",
        )
        .with_snippet(Some("    public function foo(): void".into()));

        let text = diagnostic.to_string();
        assert!(text.contains("Useless PHPDoc"));
        assert!(text.contains(" --> src/Foo.php:12"));
        assert!(text.contains("public function foo(): void"));

        let json = serde_json::to_value(diagnostic.to_json()).expect("json");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["code"], "type_sniff/method");
        assert_eq!(json["line"], 12);
    }

    #[test]
    fn recognises_php_files() {
        assert!(is_php_file(Path::new("a/B.php")));
        assert!(is_php_file(Path::new("a/B.PHP")));
        assert!(!is_php_file(Path::new("a/B.phpt")));
        assert!(!is_php_file(Path::new("a/php")));
    }
}
