//! Utilities to honor in-source ignore directives for diagnostics.

const DIRECTIVE: &str = "type-sniff-ignore";
const FILE_DIRECTIVE: &str = "type-sniff-ignore-file";

/// Rules suppressed either everywhere or for a range of lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Suppression {
    all: bool,
    patterns: Vec<String>,
}

impl Suppression {
    fn from_args(tail: &str) -> Self {
        let mut suppression = Self::default();

        let mut args = trim_comment_tail(tail).trim_start();
        if let Some(stripped) = args.strip_prefix(':') {
            args = stripped.trim_start();
        }

        if args.is_empty() {
            suppression.all = true;
            return suppression;
        }

        for token in args.split(|c: char| c == ',' || c.is_whitespace()) {
            let trimmed = token
                .trim()
                .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                .trim_end_matches('/');
            if trimmed.is_empty() {
                continue;
            }

            let normalized = trimmed.to_ascii_lowercase();
            if ["*", "all"].contains(&normalized.as_str()) {
                suppression.all = true;
                suppression.patterns.clear();
                break;
            }

            suppression.patterns.push(normalized);
        }

        if suppression.patterns.is_empty() {
            suppression.all = true;
        }
        suppression
    }

    fn matches(&self, rule_name: &str) -> bool {
        if self.all {
            return true;
        }

        let rule_lower = rule_name.to_ascii_lowercase();
        self.patterns.iter().any(|pattern| {
            rule_lower == *pattern
                || rule_lower
                    .strip_prefix(pattern.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// Tracks the ignore directives declared in a file.
#[derive(Clone, Debug, Default)]
pub struct IgnoreState {
    file: Vec<Suppression>,
    /// `(line, suppression)`; a line directive covers its own line and the next.
    lines: Vec<(usize, Suppression)>,
}

impl IgnoreState {
    /// Parses the ignore directives declared in the supplied source.
    pub fn from_source(source: &str) -> Self {
        let mut state = Self::default();

        for (idx, line) in source.lines().enumerate() {
            if let Some(pos) = line.find(FILE_DIRECTIVE) {
                state
                    .file
                    .push(Suppression::from_args(&line[pos + FILE_DIRECTIVE.len()..]));
            } else if let Some(pos) = line.find(DIRECTIVE) {
                state.lines.push((
                    idx + 1,
                    Suppression::from_args(&line[pos + DIRECTIVE.len()..]),
                ));
            }
        }

        state
    }

    /// Returns `true` if a diagnostic of `rule_name` on `line` should be suppressed.
    pub fn should_ignore(&self, rule_name: &str, line: usize) -> bool {
        self.file.iter().any(|suppression| suppression.matches(rule_name))
            || self.lines.iter().any(|(directive_line, suppression)| {
                (line == *directive_line || line == directive_line + 1)
                    && suppression.matches(rule_name)
            })
    }

    /// Returns `true` if a file-level directive suppresses every rule.
    pub fn ignores_everything(&self) -> bool {
        self.file.iter().any(|suppression| suppression.all)
    }
}

fn trim_comment_tail(value: &str) -> &str {
    let mut limit = value.len();

    for marker in ["//", "/*", "#", "*/"] {
        if let Some(idx) = value.find(marker) {
            limit = limit.min(idx);
        }
    }

    value[..limit].trim_end()
}
