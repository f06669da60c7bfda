use thiserror::Error;

/// Failure to parse a single declaration or doc comment. It aborts only the
/// element being parsed, never the file or the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected to find function name")]
    MissingFunctionName,
    #[error("expected to find parameter list")]
    MissingParameterList,
    #[error("expected parameter name on line {line}")]
    MissingParameterName { line: usize },
    #[error("expected tag name on line {line}")]
    EmptyTagName { line: usize },
}
