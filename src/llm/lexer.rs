//! Tolerant JSON lexer
//!
//! Splits text into structural tokens without judging whether the result
//! is valid JSON. Strings may run off the end of the input, and anything
//! between structural characters is a single literal token. The repairer
//! decides what to do with them.

/// Token kinds; spans are byte offsets into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    /// A double-quoted string; `terminated` is false when input ended first
    Str { terminated: bool },
    /// Run of non-structural characters (`true`, `42`, stray prose)
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

fn is_structural(b: u8) -> bool {
    matches!(b, b'{' | b'}' | b'[' | b']' | b':' | b',' | b'"')
}

/// Iterator over the tokens of `src`, starting at a byte offset
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Start lexing at `offset`, which must be a char boundary
    pub fn starting_at(src: &'a str, offset: usize) -> Self {
        Self { src, pos: offset }
    }

    fn lex_string(&mut self, start: usize) -> Token {
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.pos = i + 1;
                    return Token {
                        kind: TokenKind::Str { terminated: true },
                        start,
                        end: i + 1,
                    };
                }
                _ => i += 1,
            }
        }
        self.pos = bytes.len();
        Token {
            kind: TokenKind::Str { terminated: false },
            start,
            end: bytes.len(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let single = |kind| Token {
            kind,
            start,
            end: start + 1,
        };
        let token = match bytes[start] {
            b'{' => single(TokenKind::LBrace),
            b'}' => single(TokenKind::RBrace),
            b'[' => single(TokenKind::LBracket),
            b']' => single(TokenKind::RBracket),
            b':' => single(TokenKind::Colon),
            b',' => single(TokenKind::Comma),
            b'"' => return Some(self.lex_string(start)),
            _ => {
                let mut end = start;
                while end < bytes.len()
                    && !is_structural(bytes[end])
                    && !bytes[end].is_ascii_whitespace()
                {
                    end += 1;
                }
                Token {
                    kind: TokenKind::Literal,
                    start,
                    end,
                }
            }
        };
        self.pos = token.end;
        Some(token)
    }
}

/// All tokens of `src`
pub fn tokenize(src: &str) -> Vec<Token> {
    Lexer::new(src).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_structural_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{"a": [1, true]}"#),
            vec![
                LBrace,
                Str { terminated: true },
                Colon,
                LBracket,
                Literal,
                Comma,
                Literal,
                RBracket,
                RBrace
            ]
        );
    }

    #[test]
    fn test_string_escapes_do_not_end_string() {
        let src = r#""di \"hola\" {no}""#;
        let tokens = tokenize(src);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str { terminated: true });
        assert_eq!(tokens[0].text(src), src);
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let src = r#"{"expl"#;
        let tokens = tokenize(src);
        assert_eq!(tokens[1].kind, TokenKind::Str { terminated: false });
        assert_eq!(tokens[1].end, src.len());
    }

    #[test]
    fn test_trailing_backslash_does_not_overrun() {
        let tokens = tokenize("\"abc\\");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].end, 5);
    }

    #[test]
    fn test_prose_becomes_literals() {
        let src = "Claro, aquí está";
        let texts: Vec<_> = tokenize(src).iter().map(|t| t.text(src).to_string()).collect();
        assert_eq!(texts, vec!["Claro", ",", "aquí", "está"]);
    }

    #[test]
    fn test_starting_offset() {
        let src = "texto {\"a\":1}";
        let first = Lexer::starting_at(src, 6).next().unwrap();
        assert_eq!(first.kind, TokenKind::LBrace);
        assert_eq!(first.start, 6);
    }
}
