use crate::analyzer::elements::SourceFile;
use crate::analyzer::inspection::TypeSubject;
use crate::analyzer::phpdoc::DocBlock;
use crate::analyzer::{Diagnostic, Severity};

pub fn diagnostic_at_line(
    file: &SourceFile,
    code: &str,
    severity: Severity,
    line: usize,
    message: impl Into<String>,
) -> Diagnostic {
    Diagnostic::new(file.path.clone(), severity, code, line, message)
        .with_snippet(file.line_text(line).map(|text| text.trim_end().to_owned()))
}

/// Collects the diagnostics of one rule for one file, dropping the ones the
/// file suppresses.
pub struct Report<'a> {
    file: &'a SourceFile,
    code: &'a str,
    severity: Severity,
    raised: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Report<'a> {
    pub fn new(file: &'a SourceFile, code: &'a str) -> Self {
        Self {
            file,
            code,
            severity: Severity::Warning,
            raised: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn add(&mut self, line: usize, message: impl Into<String>) {
        self.raised += 1;
        if self.file.ignore.should_ignore(self.code, line) {
            return;
        }

        self.diagnostics.push(diagnostic_at_line(
            self.file,
            self.code,
            self.severity,
            line,
            message,
        ));
    }

    /// Moves the warnings collected on `subject` into the report.
    pub fn add_subject(&mut self, subject: &mut TypeSubject) {
        for (line, message) in subject.take_warnings() {
            self.add(line, message);
        }
    }

    /// Number of warnings raised so far, suppressed ones included.
    pub fn raised(&self) -> usize {
        self.raised
    }

    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// `Useless tag` for every tag of `doc_block` named in `invalid_tags`
/// (lowercase names without `@`).
pub fn report_invalid_tags(report: &mut Report<'_>, doc_block: &DocBlock, invalid_tags: &[String]) {
    for tag in doc_block.tags() {
        if invalid_tags.iter().any(|invalid| invalid == tag.name()) {
            report.add(tag.line(), "Useless tag");
        }
    }
}
