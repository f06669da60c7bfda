use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::Diagnostic;
use crate::analyzer::config::DescriptionConfig;
use crate::analyzer::elements::SourceFile;
use crate::analyzer::project::ProjectContext;
use crate::analyzer::rules::DiagnosticRule;
use crate::analyzer::rules::helpers::{Report, report_invalid_tags};

/// `Class Foo`, `Interface Foo.` and the like.
static KIND_AND_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Class|Interface|Trait|Enum)\s+\w+\.?$").expect("valid description pattern")
});

/// Flags class-like doc blocks that only restate the declaration.
pub struct DescriptionRule {
    config: DescriptionConfig,
}

impl DescriptionRule {
    pub fn new(config: DescriptionConfig) -> Self {
        Self { config }
    }
}

impl DiagnosticRule for DescriptionRule {
    fn name(&self) -> &str {
        "type_sniff/description"
    }

    fn run(&self, file: &SourceFile, _context: &ProjectContext) -> Vec<Diagnostic> {
        let mut report = Report::new(file, self.name());

        for class in &file.classes {
            for (line, text) in class.doc_block.description_lines() {
                if KIND_AND_NAME.is_match(text) {
                    report.add(line, "Useless description");
                }
            }
            report_invalid_tags(&mut report, &class.doc_block, &self.config.invalid_tags);
        }

        report.finish()
    }
}
