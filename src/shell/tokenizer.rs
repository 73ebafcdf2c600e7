//! Shell-style tokenization (quotes, escapes and operators).

use serde::Serialize;

use super::error::ParseError;

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// An unquoted word.
    Word,
    /// A word with at least one quoted region.
    QuotedWord,
    /// A connective: `|`, `||`, `&&`, `;`.
    Operator,
    /// A redirection: `>`, `>>`, `2>`, `2>>`, `<`.
    Redirect,
}

/// A token from shell parsing. `text` is the de-escaped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Word,
            text: text.into(),
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::QuotedWord,
            text: text.into(),
        }
    }

    pub fn operator(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Operator,
            text: text.into(),
        }
    }

    pub fn redirect(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Redirect,
            text: text.into(),
        }
    }

    /// True for plain and quoted words.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::QuotedWord)
    }

    /// Shell text that tokenizes back to this exact token.
    pub fn to_shell(&self) -> String {
        match self.kind {
            TokenKind::Operator | TokenKind::Redirect => self.text.clone(),
            TokenKind::QuotedWord => format!("'{}'", self.text.replace('\'', r"'\''")),
            TokenKind::Word => escape_word(&self.text),
        }
    }
}

/// Backslash-escape the characters the tokenizer treats specially.
pub(crate) fn escape_word(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() || matches!(c, '\\' | '\'' | '"' | '|' | '&' | ';' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The word currently being assembled.
#[derive(Default)]
struct WordBuffer {
    text: String,
    started: bool,
    quoted: bool,
}

impl WordBuffer {
    fn push(&mut self, c: char) {
        self.text.push(c);
        self.started = true;
    }

    fn open_quote(&mut self) {
        self.started = true;
        self.quoted = true;
    }

    fn flush_into(&mut self, tokens: &mut Vec<Token>) {
        if !self.started {
            return;
        }
        let text = std::mem::take(&mut self.text);
        tokens.push(if self.quoted {
            Token::quoted(text)
        } else {
            Token::word(text)
        });
        self.started = false;
        self.quoted = false;
    }
}

/// Tokenize a command line into words and operators, respecting quotes and escapes.
///
/// Operators are only recognized outside quotes and never merge into an
/// adjacent word; the longest operator wins (`>>` over `>`, `2>>` over `2>`).
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut word = WordBuffer::default();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => word.push(escaped),
                None => return Err(ParseError::DanglingEscape { position: pos }),
            },
            '\'' => {
                word.open_quote();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, ch)) => word.push(ch),
                        None => {
                            return Err(ParseError::UnterminatedQuote {
                                quote: '\'',
                                position: pos,
                            });
                        }
                    }
                }
            }
            '"' => {
                word.open_quote();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.peek() {
                            Some(&(_, next)) if matches!(next, '"' | '\\' | '`' | '$') => {
                                word.push(next);
                                chars.next();
                            }
                            // Any other sequence keeps its backslash
                            _ => word.push('\\'),
                        },
                        Some((_, ch)) => word.push(ch),
                        None => {
                            return Err(ParseError::UnterminatedQuote {
                                quote: '"',
                                position: pos,
                            });
                        }
                    }
                }
            }
            c if c.is_whitespace() => word.flush_into(&mut tokens),
            // `2>` only where a new word would start
            '2' if !word.started && matches!(chars.peek(), Some(&(_, '>'))) => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    tokens.push(Token::redirect("2>>"));
                } else {
                    tokens.push(Token::redirect("2>"));
                }
            }
            '>' => {
                word.flush_into(&mut tokens);
                if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    tokens.push(Token::redirect(">>"));
                } else {
                    tokens.push(Token::redirect(">"));
                }
            }
            '<' => {
                word.flush_into(&mut tokens);
                tokens.push(Token::redirect("<"));
            }
            '|' => {
                word.flush_into(&mut tokens);
                if matches!(chars.peek(), Some(&(_, '|'))) {
                    chars.next();
                    tokens.push(Token::operator("||"));
                } else {
                    tokens.push(Token::operator("|"));
                }
            }
            ';' => {
                word.flush_into(&mut tokens);
                tokens.push(Token::operator(";"));
            }
            '&' if matches!(chars.peek(), Some(&(_, '&'))) => {
                chars.next();
                word.flush_into(&mut tokens);
                tokens.push(Token::operator("&&"));
            }
            _ => word.push(c),
        }
    }

    word.flush_into(&mut tokens);
    Ok(tokens)
}

/// Join tokens back into shell text that tokenizes to the same stream.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::to_shell)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_simple_tokenize() {
        let tokens = tokenize("ls -la /tmp").unwrap();
        assert_eq!(
            tokens,
            vec![Token::word("ls"), Token::word("-la"), Token::word("/tmp")]
        );
    }

    #[test]
    fn test_single_quoted() {
        let tokens = tokenize("echo 'a b' c").unwrap();
        assert_eq!(
            tokens,
            vec![Token::word("echo"), Token::quoted("a b"), Token::word("c")]
        );
    }

    #[test]
    fn test_single_quotes_are_literal() {
        let tokens = tokenize(r"echo 'a\nb $HOME | x'").unwrap();
        assert_eq!(tokens[1], Token::quoted(r"a\nb $HOME | x"));
    }

    #[test]
    fn test_double_quoted_escapes() {
        let tokens = tokenize("echo \"it's \\\"ok\\\"\"").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1], Token::quoted("it's \"ok\""));
    }

    #[test]
    fn test_double_quoted_other_backslash_kept() {
        let tokens = tokenize(r#"printf "a\tb \$x \\ \`""#).unwrap();
        assert_eq!(tokens[1], Token::quoted(r"a\tb $x \ `"));
    }

    #[test]
    fn test_empty_quotes_make_a_word() {
        let tokens = tokenize("echo '' \"\"").unwrap();
        assert_eq!(
            tokens,
            vec![Token::word("echo"), Token::quoted(""), Token::quoted("")]
        );
    }

    #[test]
    fn test_mixed_quoting_is_one_word() {
        let tokens = tokenize(r#"grep --label="my file"x"#).unwrap();
        assert_eq!(tokens[1], Token::quoted("--label=my filex"));
    }

    #[test]
    fn test_escaped_space() {
        let tokens = tokenize("echo hello\\ world").unwrap();
        assert_eq!(tokens[1], Token::word("hello world"));
    }

    #[test]
    fn test_escaped_operator_is_literal() {
        let tokens = tokenize(r"echo a\|b \; \&\& c\>d").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "a|b", ";", "&&", "c>d"]);
        assert!(tokens.iter().all(Token::is_word));
    }

    #[test]
    fn test_operators_split_words() {
        let tokens = tokenize("a|b&&c;d||e").unwrap();
        assert_eq!(texts(&tokens), vec!["a", "|", "b", "&&", "c", ";", "d", "||", "e"]);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[7].kind, TokenKind::Operator);
    }

    #[test]
    fn test_quoted_operators() {
        let tokens = tokenize("echo '&&' \"a | b\" && ls").unwrap();
        assert_eq!(tokens[1], Token::quoted("&&"));
        assert_eq!(tokens[2], Token::quoted("a | b"));
        assert_eq!(tokens[3], Token::operator("&&"));
    }

    #[test]
    fn test_redirect_longest_match() {
        let tokens = tokenize("cmd >> log 2>> err > out 2> e2 < in").unwrap();
        let redirects: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Redirect)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(redirects, vec![">>", "2>>", ">", "2>", "<"]);
    }

    #[test]
    fn test_redirect_without_spaces() {
        let tokens = tokenize("cmd>out 2>err").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::word("cmd"),
                Token::redirect(">"),
                Token::word("out"),
                Token::redirect("2>"),
                Token::word("err"),
            ]
        );
    }

    #[test]
    fn test_digit_inside_word_is_not_stderr() {
        let tokens = tokenize("echo a2>x").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "a2", ">", "x"]);
    }

    #[test]
    fn test_stderr_to_stdout() {
        let tokens = tokenize("make 2>&1").unwrap();
        assert_eq!(
            tokens,
            vec![Token::word("make"), Token::redirect("2>"), Token::word("&1")]
        );
    }

    #[test]
    fn test_single_ampersand_stays_in_word() {
        let tokens = tokenize("sleep 1 &").unwrap();
        assert_eq!(texts(&tokens), vec!["sleep", "1", "&"]);
    }

    #[test]
    fn test_whitespace_runs_are_not_tokens() {
        let tokens = tokenize("  ls \t  -l\n ").unwrap();
        assert_eq!(texts(&tokens), vec!["ls", "-l"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_single_quote() {
        let err = tokenize("echo 'abc").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedQuote {
                quote: '\'',
                position: 5
            }
        );
    }

    #[test]
    fn test_unterminated_double_quote_with_trailing_backslash() {
        let err = tokenize("echo \"abc\\").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote { quote: '"', .. }));
    }

    #[test]
    fn test_dangling_escape() {
        let err = tokenize("cmd \\").unwrap_err();
        assert_eq!(err, ParseError::DanglingEscape { position: 4 });
    }

    #[test]
    fn test_render_round_trip() {
        let inputs = [
            "echo 'a b' c",
            "echo \"it's \\\"ok\\\"\"",
            "ps aux | grep py | sort -u",
            "cmd > out.txt 2> err.txt",
            r"echo a\|b hello\ world",
            "find . -name '*.rs' -exec wc -l {} \\; && echo done",
            "echo '' x",
            "a || b; c >> log",
        ];
        for input in inputs {
            let tokens = tokenize(input).unwrap();
            let rendered = render_tokens(&tokens);
            assert_eq!(tokenize(&rendered).unwrap(), tokens, "round trip of {input:?}");
        }
    }

    #[test]
    fn test_render_normalizes_whitespace() {
        let tokens = tokenize("ls    -l   |   wc").unwrap();
        assert_eq!(render_tokens(&tokens), "ls -l | wc");
    }
}
