//! Errors produced while tokenizing or decomposing a command line.

use thiserror::Error;

/// A command line that cannot be split into a pipeline.
///
/// Every variant is fatal for the input: no partial explanation is
/// rendered for a malformed command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quote was opened and never closed.
    #[error("unterminated {quote} quote opened at byte {position}")]
    UnterminatedQuote { quote: char, position: usize },

    /// The input ends on a backslash with nothing left to escape.
    #[error("dangling escape at byte {position}: a backslash must be followed by a character")]
    DanglingEscape { position: usize },

    /// A connective operator has no command on one side.
    #[error("missing command around `{operator}` (token {position})")]
    EmptyStage { operator: String, position: usize },

    /// A redirection operator is not followed by a target word.
    #[error("redirection `{operator}` has no target (token {position})")]
    MissingRedirectTarget { operator: String, position: usize },

    /// An operator token the decomposer does not understand.
    #[error("unsupported operator `{operator}` (token {position})")]
    UnknownOperator { operator: String, position: usize },
}

impl ParseError {
    /// Short rule id, used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::UnterminatedQuote { .. } => "unterminated_quote",
            ParseError::DanglingEscape { .. } => "dangling_escape",
            ParseError::EmptyStage { .. } => "empty_stage",
            ParseError::MissingRedirectTarget { .. } => "missing_redirect_target",
            ParseError::UnknownOperator { .. } => "unknown_operator",
        }
    }
}
