//! Formula lexer
//!
//! Turns a formula string into a token stream. The grammar is small:
//! identifiers, parentheses, commas, and string/number/boolean literals.

use crate::error::{FormulaError, FormulaResult};

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Function name or field reference
    Ident,
    LParen,
    RParen,
    Comma,
    /// Double-quoted string literal (text field holds the unescaped value)
    Str,
    /// Numeric literal, optionally negative
    Number,
    /// `true` or `false` (case-insensitive)
    Bool,
}

/// A single token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text; for `Str` this is the unescaped content
    pub text: String,
    /// Byte offset of the token start in the input
    pub position: usize,
}

/// Tokenize a formula string.
///
/// Whitespace is skipped between tokens. Any character outside the grammar
/// yields [`FormulaError::Lex`] with its position.
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> FormulaResult<()> {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }

            let start = self.pos;
            match c {
                '(' => self.push_simple(TokenKind::LParen, "(", start),
                ')' => self.push_simple(TokenKind::RParen, ")", start),
                ',' => self.push_simple(TokenKind::Comma, ",", start),
                '"' => self.scan_string(start)?,
                '-' => {
                    // A minus is only valid as the sign of a numeric literal
                    if self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) {
                        self.scan_number(start);
                    } else {
                        return Err(FormulaError::Lex {
                            position: start,
                            ch: '-',
                        });
                    }
                }
                c if c.is_ascii_digit() => self.scan_number(start),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_ident(start),
                other => {
                    return Err(FormulaError::Lex {
                        position: start,
                        ch: other,
                    })
                }
            }
        }
        Ok(())
    }

    fn push_simple(&mut self, kind: TokenKind, text: &str, position: usize) {
        self.advance();
        self.tokens.push(Token {
            kind,
            text: text.to_string(),
            position,
        });
    }

    fn scan_string(&mut self, start: usize) -> FormulaResult<()> {
        self.advance(); // opening quote

        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => return Err(FormulaError::UnterminatedString { position: start }),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(other) => {
                            return Err(FormulaError::Lex {
                                position: self.pos,
                                ch: other,
                            })
                        }
                        None => return Err(FormulaError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::Str,
            text,
            position: start,
        });
        Ok(())
    }

    fn scan_number(&mut self, start: usize) {
        if self.peek_char() == Some('-') {
            self.advance();
        }
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::Number,
            text: self.input[start..self.pos].to_string(),
            position: start,
        });
    }

    fn scan_ident(&mut self, start: usize) {
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let kind = if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
            TokenKind::Bool
        } else {
            TokenKind::Ident
        };

        self.tokens.push(Token {
            kind,
            text: text.to_string(),
            position: start,
        });
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_call() {
        let tokens = tokenize("SUM(price, tax)").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["SUM", "(", "price", ",", "tax", ")"]
        );
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[2].position, 4);
    }

    #[test]
    fn test_tokenize_literals() {
        assert_eq!(
            kinds("F(1, -2.5, \"x\", true, FALSE)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Str,
                TokenKind::Comma,
                TokenKind::Bool,
                TokenKind::Comma,
                TokenKind::Bool,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_negative_number_text() {
        let tokens = tokenize("-12.75").unwrap();
        assert_eq!(tokens[0].text, "-12.75");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""say \"hi\"\n""#).unwrap();
        assert_eq!(tokens[0].text, "say \"hi\"\n");
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("CONCAT(\"oops"),
            Err(FormulaError::UnterminatedString { position: 7 })
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            tokenize("SUM(1 + 2)"),
            Err(FormulaError::Lex { position: 6, ch: '+' })
        );
    }

    #[test]
    fn test_bare_minus_is_invalid() {
        assert_eq!(
            tokenize("SUM(1, -)"),
            Err(FormulaError::Lex { position: 7, ch: '-' })
        );
    }

    #[test]
    fn test_whitespace_skipped() {
        assert_eq!(
            kinds("  IF ( a ,\n\t b )"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::RParen,
            ]
        );
    }
}
