//! Grammar tokenizer.
//!
//! Splits grammar source into positioned tokens for the statement parser.
//! The interesting cases:
//!
//! - `#` starts a comment running to end of line.
//! - A backslash immediately before a newline continues the logical line
//!   (both characters lex as whitespace).
//! - Quoted tags lex as one word token including quotes and trailing flag
//!   letters: `"<ran>"`, `"r.n"ri`.
//! - `-` and `+` are operator tokens only when they stand alone; inside a
//!   word (`BEFORE-SECTIONS`, `-1C`) they are ordinary characters.
//!
//! Every token carries the 1-based line and column it started at, so parser
//! diagnostics stay byte-accurate.

use crate::errors::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    LParen,
    RParen,
    Semicolon,
    Equals,
    Pipe,
    Minus,
    Plus,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Tokenize grammar source.
pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;
    let mut column = 1usize;

    macro_rules! bump {
        () => {{
            let c = chars.next();
            match c {
                Some('\n') => {
                    line += 1;
                    column = 1;
                }
                Some(_) => column += 1,
                None => {}
            }
            c
        }};
    }

    while let Some(&c) = chars.peek() {
        let (tok_line, tok_column) = (line, column);

        match c {
            '#' => {
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    bump!();
                }
            }
            '\\' => {
                bump!();
                match chars.peek() {
                    Some('\n') => {
                        bump!();
                    }
                    Some('\r') => {
                        bump!();
                        if chars.peek() == Some(&'\n') {
                            bump!();
                        }
                    }
                    _ => {
                        return Err(CompileError::Syntax {
                            line: tok_line,
                            column: tok_column,
                            message: "stray '\\' (line continuation must end the line)".into(),
                        });
                    }
                }
            }
            _ if c.is_whitespace() => {
                bump!();
            }
            '(' | ')' | ';' | '=' | '|' => {
                bump!();
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ';' => TokenKind::Semicolon,
                    '=' => TokenKind::Equals,
                    _ => TokenKind::Pipe,
                };
                tokens.push(Token { kind, text: c.to_string(), line: tok_line, column: tok_column });
            }
            '-' | '+' => {
                bump!();
                let standalone = match chars.peek() {
                    None => true,
                    Some(&n) => n.is_whitespace() || matches!(n, '(' | ')' | ';' | '=' | '|' | '#'),
                };
                if standalone {
                    let kind = if c == '-' { TokenKind::Minus } else { TokenKind::Plus };
                    tokens.push(Token { kind, text: c.to_string(), line: tok_line, column: tok_column });
                } else {
                    let mut text = String::new();
                    text.push(c);
                    read_word(&mut chars, &mut text, &mut column);
                    tokens.push(Token { kind: TokenKind::Word, text, line: tok_line, column: tok_column });
                }
            }
            '"' => {
                let mut text = String::new();
                text.push(bump!().unwrap());
                let mut closed = false;
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    text.push(bump!().unwrap());
                    if n == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(CompileError::Syntax {
                        line: tok_line,
                        column: tok_column,
                        message: "unterminated quoted tag".into(),
                    });
                }
                // Trailing flags and the rest of the token (e.g. `"x"ri`).
                read_word(&mut chars, &mut text, &mut column);
                tokens.push(Token { kind: TokenKind::Word, text, line: tok_line, column: tok_column });
            }
            _ => {
                let mut text = String::new();
                read_word(&mut chars, &mut text, &mut column);
                tokens.push(Token { kind: TokenKind::Word, text, line: tok_line, column: tok_column });
            }
        }
    }

    Ok(tokens)
}

/// Consume word characters into `text`, stopping before whitespace, a
/// delimiter, a comment, or a quote. Words never span lines.
fn read_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, text: &mut String, column: &mut usize) {
    while let Some(&n) = chars.peek() {
        if n.is_whitespace() || matches!(n, '(' | ')' | ';' | '=' | '|' | '#' | '"' | '\\') {
            break;
        }
        text.push(n);
        chars.next();
        *column += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn words(source: &str) -> Vec<String> {
        lex(source).unwrap().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn basic_statement() {
        assert_eq!(
            kinds("LIST N = n np ;"),
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Equals,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn comments_and_continuation() {
        let toks = words("LIST N = n \\\n  np ; # trailing comment\n# whole line\nSECTION");
        assert_eq!(toks, vec!["LIST", "N", "=", "n", "np", ";", "SECTION"]);
    }

    #[test]
    fn quoted_tags_keep_quotes_and_flags() {
        let toks = words("\"<ran>\" \"r.n\"ri \"run\"");
        assert_eq!(toks, vec!["\"<ran>\"", "\"r.n\"ri", "\"run\""]);
    }

    #[test]
    fn minus_is_operator_only_when_standalone() {
        let toks = lex("A - B -1C BEFORE-SECTIONS").unwrap();
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Word, TokenKind::Minus, TokenKind::Word, TokenKind::Word, TokenKind::Word]
        );
        assert_eq!(toks[3].text, "-1C");
        assert_eq!(toks[4].text, "BEFORE-SECTIONS");
    }

    #[test]
    fn positions_are_tracked() {
        let toks = lex("LIST\n  SET").unwrap();
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        match lex("LIST X = \"open ;") {
            Err(CompileError::Syntax { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
