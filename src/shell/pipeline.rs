//! Split a token stream into pipeline stages, connectives and redirections.

use serde::Serialize;

use super::error::ParseError;
use super::tokenizer::{Token, TokenKind, escape_word, tokenize};

/// Connective between two consecutive stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Connector {
    /// `|` - pipe stdout to next command
    #[serde(rename = "|")]
    Pipe,
    /// `&&` - run next if previous succeeds
    #[serde(rename = "&&")]
    And,
    /// `||` - run next if previous fails
    #[serde(rename = "||")]
    Or,
    /// `;` - run sequentially
    #[serde(rename = ";")]
    Sequence,
}

impl Connector {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "|" => Some(Connector::Pipe),
            "&&" => Some(Connector::And),
            "||" => Some(Connector::Or),
            ";" => Some(Connector::Sequence),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Connector::Pipe => "|",
            Connector::And => "&&",
            Connector::Or => "||",
            Connector::Sequence => ";",
        }
    }
}

/// Redirection operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RedirectOp {
    #[serde(rename = ">")]
    Stdout,
    #[serde(rename = ">>")]
    StdoutAppend,
    #[serde(rename = "2>")]
    Stderr,
    #[serde(rename = "2>>")]
    StderrAppend,
    #[serde(rename = "<")]
    Stdin,
}

impl RedirectOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(RedirectOp::Stdout),
            ">>" => Some(RedirectOp::StdoutAppend),
            "2>" => Some(RedirectOp::Stderr),
            "2>>" => Some(RedirectOp::StderrAppend),
            "<" => Some(RedirectOp::Stdin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RedirectOp::Stdout => ">",
            RedirectOp::StdoutAppend => ">>",
            RedirectOp::Stderr => "2>",
            RedirectOp::StderrAppend => "2>>",
            RedirectOp::Stdin => "<",
        }
    }

    /// Whether this operator writes to its target.
    pub fn is_output(self) -> bool {
        !matches!(self, RedirectOp::Stdin)
    }
}

/// A redirection attached to the stage it follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectionSpec {
    pub operator: RedirectOp,
    pub target: String,
}

impl RedirectionSpec {
    pub fn new(operator: RedirectOp, target: impl Into<String>) -> Self {
        Self {
            operator,
            target: target.into(),
        }
    }
}

/// One command with its arguments and redirections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStage {
    /// The command word.
    pub command: String,
    /// Raw argument tokens; flags are not yet separated from positionals.
    pub arguments: Vec<Token>,
    /// Redirections in source order.
    pub redirections: Vec<RedirectionSpec>,
}

impl PipelineStage {
    /// Argument texts.
    pub fn args(&self) -> Vec<&str> {
        self.arguments.iter().map(|t| t.text.as_str()).collect()
    }

    /// Shell text for this stage, redirections last.
    pub fn render(&self) -> String {
        let command = if self.command.is_empty() {
            Token::quoted(String::new()).to_shell()
        } else {
            escape_word(&self.command)
        };
        let mut parts = vec![command];
        parts.extend(self.arguments.iter().map(Token::to_shell));
        for redirection in &self.redirections {
            parts.push(redirection.operator.as_str().to_string());
            parts.push(Token::quoted(redirection.target.clone()).to_shell());
        }
        parts.join(" ")
    }
}

/// A decomposed command line: `stages[i]` and `stages[i + 1]` are joined by `connectors[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub stages: Vec<PipelineStage>,
    pub connectors: Vec<Connector>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Command names, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.command.as_str()).collect()
    }

    /// The connector between stage `index` and the next one, if any.
    pub fn connector_after(&self, index: usize) -> Option<Connector> {
        self.connectors.get(index).copied()
    }

    /// Shell text reconstructing the pipeline (modulo whitespace).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(self.connectors[i - 1].as_str());
                out.push(' ');
            }
            out.push_str(&stage.render());
        }
        out
    }
}

/// The stage currently being assembled.
#[derive(Default)]
struct StageBuilder {
    words: Vec<Token>,
    redirections: Vec<RedirectionSpec>,
}

impl StageBuilder {
    fn is_empty(&self) -> bool {
        self.words.is_empty() && self.redirections.is_empty()
    }

    /// Close the stage. `operator`/`position` name the boundary for errors.
    fn finish(&mut self, operator: &str, position: usize) -> Result<PipelineStage, ParseError> {
        let mut words = std::mem::take(&mut self.words).into_iter();
        let redirections = std::mem::take(&mut self.redirections);
        let Some(command) = words.next() else {
            return Err(ParseError::EmptyStage {
                operator: operator.to_string(),
                position,
            });
        };
        Ok(PipelineStage {
            command: command.text,
            arguments: words.collect(),
            redirections,
        })
    }
}

/// Decompose a token stream into a pipeline.
///
/// A redirection consumes exactly the following word as its target. A
/// connective with no command before it, or a `|`/`||`/`&&` ending the
/// stream, is an [`ParseError::EmptyStage`]; one trailing `;` is accepted.
pub fn decompose(tokens: &[Token]) -> Result<Pipeline, ParseError> {
    let mut pipeline = Pipeline::default();
    let mut current = StageBuilder::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Word | TokenKind::QuotedWord => current.words.push(token.clone()),
            TokenKind::Redirect => {
                let operator =
                    RedirectOp::from_symbol(&token.text).ok_or_else(|| ParseError::UnknownOperator {
                        operator: token.text.clone(),
                        position: i,
                    })?;
                match tokens.get(i + 1) {
                    Some(target) if target.is_word() => {
                        current
                            .redirections
                            .push(RedirectionSpec::new(operator, target.text.clone()));
                        i += 1;
                    }
                    _ => {
                        return Err(ParseError::MissingRedirectTarget {
                            operator: token.text.clone(),
                            position: i,
                        });
                    }
                }
            }
            TokenKind::Operator => {
                let connector =
                    Connector::from_symbol(&token.text).ok_or_else(|| ParseError::UnknownOperator {
                        operator: token.text.clone(),
                        position: i,
                    })?;
                pipeline.stages.push(current.finish(&token.text, i)?);
                pipeline.connectors.push(connector);
            }
        }
        i += 1;
    }

    if current.is_empty() {
        match pipeline.connectors.last().copied() {
            Some(Connector::Sequence) => {
                pipeline.connectors.pop();
            }
            Some(trailing) => {
                return Err(ParseError::EmptyStage {
                    operator: trailing.as_str().to_string(),
                    position: tokens.len(),
                });
            }
            None => {}
        }
    } else {
        let operator = current
            .redirections
            .first()
            .map(|r| r.operator.as_str())
            .unwrap_or_default();
        pipeline.stages.push(current.finish(operator, tokens.len())?);
    }

    Ok(pipeline)
}

/// Tokenize and decompose in one step.
pub fn parse_pipeline(input: &str) -> Result<Pipeline, ParseError> {
    decompose(&tokenize(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Pipeline {
        parse_pipeline(input).unwrap()
    }

    #[test]
    fn test_simple_command() {
        let pipeline = parse("ls -la");
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.stages[0].command, "ls");
        assert_eq!(pipeline.stages[0].args(), vec!["-la"]);
        assert!(pipeline.connectors.is_empty());
    }

    #[test]
    fn test_three_stage_pipe() {
        let pipeline = parse("ps aux | grep py | sort -u");
        assert_eq!(pipeline.commands(), vec!["ps", "grep", "sort"]);
        assert_eq!(pipeline.stages[0].args(), vec!["aux"]);
        assert_eq!(pipeline.stages[1].args(), vec!["py"]);
        assert_eq!(pipeline.stages[2].args(), vec!["-u"]);
        assert_eq!(pipeline.connectors, vec![Connector::Pipe, Connector::Pipe]);
        assert!(pipeline.stages.iter().all(|s| s.redirections.is_empty()));
    }

    #[test]
    fn test_stdout_and_stderr_redirects() {
        let pipeline = parse("cmd > out.txt 2> err.txt");
        assert_eq!(pipeline.len(), 1);
        let stage = &pipeline.stages[0];
        assert!(stage.arguments.is_empty());
        assert_eq!(
            stage.redirections,
            vec![
                RedirectionSpec::new(RedirectOp::Stdout, "out.txt"),
                RedirectionSpec::new(RedirectOp::Stderr, "err.txt"),
            ]
        );
    }

    #[test]
    fn test_redirects_interleave_with_args_and_pipes() {
        let pipeline = parse("cmd arg > out more 2> err | next");
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.stages[0].args(), vec!["arg", "more"]);
        assert_eq!(pipeline.stages[0].redirections.len(), 2);
        assert_eq!(pipeline.stages[1].command, "next");
        assert!(pipeline.stages[1].redirections.is_empty());
    }

    #[test]
    fn test_redirect_before_command() {
        let pipeline = parse("< input.txt sort");
        assert_eq!(pipeline.stages[0].command, "sort");
        assert_eq!(
            pipeline.stages[0].redirections,
            vec![RedirectionSpec::new(RedirectOp::Stdin, "input.txt")]
        );
    }

    #[test]
    fn test_connectors() {
        let pipeline = parse("make && make test || echo failed; ls");
        assert_eq!(pipeline.commands(), vec!["make", "make", "echo", "ls"]);
        assert_eq!(
            pipeline.connectors,
            vec![Connector::And, Connector::Or, Connector::Sequence]
        );
    }

    #[test]
    fn test_quoted_pipe_is_argument() {
        let pipeline = parse("grep 'a|b' file");
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.stages[0].args(), vec!["a|b", "file"]);
    }

    #[test]
    fn test_escaped_pipe_is_argument() {
        let pipeline = parse(r"echo a \| b");
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.stages[0].args(), vec!["a", "|", "b"]);
    }

    #[test]
    fn test_adjacent_pipes_are_empty_stage() {
        let err = parse_pipeline("cmd1 | | cmd2").unwrap_err();
        assert_eq!(
            err,
            ParseError::EmptyStage {
                operator: "|".to_string(),
                position: 2
            }
        );
    }

    #[test]
    fn test_leading_pipe_is_empty_stage() {
        let err = parse_pipeline("| grep x").unwrap_err();
        assert!(matches!(err, ParseError::EmptyStage { position: 0, .. }));
    }

    #[test]
    fn test_trailing_pipe_is_empty_stage() {
        let err = parse_pipeline("ls |").unwrap_err();
        assert!(matches!(err, ParseError::EmptyStage { position: 2, .. }));
        assert!(parse_pipeline("ls &&").is_err());
    }

    #[test]
    fn test_trailing_semicolon_is_allowed() {
        let pipeline = parse("ls;");
        assert_eq!(pipeline.len(), 1);
        assert!(pipeline.connectors.is_empty());
        assert!(parse_pipeline("ls ; ;").is_err());
    }

    #[test]
    fn test_redirect_only_stage_is_empty() {
        let err = parse_pipeline("> out | cat").unwrap_err();
        assert!(matches!(err, ParseError::EmptyStage { .. }));
        let err = parse_pipeline("> out").unwrap_err();
        assert_eq!(
            err,
            ParseError::EmptyStage {
                operator: ">".to_string(),
                position: 2
            }
        );
    }

    #[test]
    fn test_missing_redirect_target() {
        let err = parse_pipeline("echo hi >").unwrap_err();
        assert!(matches!(err, ParseError::MissingRedirectTarget { .. }));
        let err = parse_pipeline("echo hi > | cat").unwrap_err();
        assert!(matches!(err, ParseError::MissingRedirectTarget { position: 2, .. }));
    }

    #[test]
    fn test_unknown_operator_from_hand_built_tokens() {
        let tokens = vec![Token::word("a"), Token::operator("&"), Token::word("b")];
        assert!(matches!(
            decompose(&tokens).unwrap_err(),
            ParseError::UnknownOperator { .. }
        ));
    }

    #[test]
    fn test_empty_stream() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_render_and_reparse_is_stable() {
        let inputs = [
            "ps aux | grep py | sort -u",
            "cmd > out.txt 2> err.txt",
            "cat < in.txt | tr a-z A-Z >> 'my log.txt'",
            "make && make test || echo 'build failed'; ls",
            "echo \"it's \\\"ok\\\"\" | wc -c",
            "'' foo | cat",
            "\"\" && 'my tool' -x",
        ];
        for input in inputs {
            let original = parse(input);
            let reparsed = parse(&original.render());
            assert_eq!(reparsed.len(), original.len(), "stage count for {input:?}");
            assert_eq!(reparsed.commands(), original.commands());
            assert_eq!(reparsed.connectors, original.connectors);
        }
    }

    #[test]
    fn test_render_keeps_empty_command() {
        let pipeline = parse("'' foo | cat");
        assert_eq!(pipeline.commands(), vec!["", "cat"]);
        assert_eq!(pipeline.render(), "'' foo | cat");
    }

    #[test]
    fn test_render_moves_redirections_last() {
        let pipeline = parse("cmd > out arg");
        assert_eq!(pipeline.render(), "cmd arg > 'out'");
    }
}
