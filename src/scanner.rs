//! Hand-written lexer: source bytes in, tokens out, one character of
//! lookahead. Shape grounded on `hinton-lang-Hinton/src/lexer/mod.rs` (the
//! `start`/`current`/`line` cursor fields, token-by-demand `scan_token`
//! entry point); keyword classification grounded on
//! `original_source/src/scanner.c`'s `identifierType` switch-on-first-byte
//! trie.

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,
    IDENTIFIER,
    STRING,
    NUMBER,
    AND,
    CLASS,
    ELSE,
    FALSE,
    FOR,
    FUN,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,
    ERR,
    EOF,
}

/// A lexeme is a slice of the original source plus the line it started on.
/// `ERR` tokens carry their message as the lexeme instead of a source slice.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub lexeme: &'a str,
    pub line: u32,
}

pub struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), start: 0, current: 0, line: 1 }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> &'a str {
        std::str::from_utf8(&self.source[self.start..self.current]).unwrap_or("")
    }

    fn make(&self, token_type: TokenType) -> Token<'a> {
        Token { token_type, lexeme: self.lexeme(), line: self.line }
    }

    fn error(&self, message: &'static str) -> Token<'a> {
        Token { token_type: TokenType::ERR, lexeme: message, line: self.line }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Token<'a> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return self.error("Unterminated string.");
        }

        self.advance();
        self.make(TokenType::STRING)
    }

    fn number(&mut self) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.make(TokenType::NUMBER)
    }

    /// Matches `rest` against the bytes following `start_offset` in the
    /// current lexeme; falls back to `IDENTIFIER` on any mismatch, including
    /// length.
    fn check_keyword(&self, start_offset: usize, rest: &str, token_type: TokenType) -> TokenType {
        let word = &self.source[self.start..self.current];
        let candidate = &word[start_offset..];
        if candidate == rest.as_bytes() {
            token_type
        } else {
            TokenType::IDENTIFIER
        }
    }

    fn identifier_type(&self) -> TokenType {
        let word = &self.source[self.start..self.current];
        match word[0] {
            b'a' => self.check_keyword(1, "nd", TokenType::AND),
            b'c' => self.check_keyword(1, "lass", TokenType::CLASS),
            b'e' => self.check_keyword(1, "lse", TokenType::ELSE),
            b'f' if word.len() > 1 => match word[1] {
                b'a' => self.check_keyword(2, "lse", TokenType::FALSE),
                b'o' => self.check_keyword(2, "r", TokenType::FOR),
                b'u' => self.check_keyword(2, "n", TokenType::FUN),
                _ => TokenType::IDENTIFIER,
            },
            b'i' => self.check_keyword(1, "f", TokenType::IF),
            b'n' => self.check_keyword(1, "il", TokenType::NIL),
            b'o' => self.check_keyword(1, "r", TokenType::OR),
            b'p' => self.check_keyword(1, "rint", TokenType::PRINT),
            b'r' => self.check_keyword(1, "eturn", TokenType::RETURN),
            b's' => self.check_keyword(1, "uper", TokenType::SUPER),
            b't' if word.len() > 1 => match word[1] {
                b'h' => self.check_keyword(2, "is", TokenType::THIS),
                b'r' => self.check_keyword(2, "ue", TokenType::TRUE),
                _ => TokenType::IDENTIFIER,
            },
            b'v' => self.check_keyword(1, "ar", TokenType::VAR),
            b'w' => self.check_keyword(1, "hile", TokenType::WHILE),
            _ => TokenType::IDENTIFIER,
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        self.make(self.identifier_type())
    }

    pub fn scan_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make(TokenType::EOF);
        }

        let c = self.advance();

        if c.is_ascii_alphabetic() || c == b'_' {
            return self.identifier();
        }
        if c.is_ascii_digit() {
            return self.number();
        }

        match c {
            b'(' => self.make(TokenType::LEFT_PAREN),
            b')' => self.make(TokenType::RIGHT_PAREN),
            b'{' => self.make(TokenType::LEFT_BRACE),
            b'}' => self.make(TokenType::RIGHT_BRACE),
            b';' => self.make(TokenType::SEMICOLON),
            b',' => self.make(TokenType::COMMA),
            b'.' => self.make(TokenType::DOT),
            b'-' => self.make(TokenType::MINUS),
            b'+' => self.make(TokenType::PLUS),
            b'/' => self.make(TokenType::SLASH),
            b'*' => self.make(TokenType::STAR),
            b'"' => self.string(),
            b'!' => {
                let t = if self.matches(b'=') { TokenType::BANG_EQUAL } else { TokenType::BANG };
                self.make(t)
            }
            b'=' => {
                let t = if self.matches(b'=') { TokenType::EQUAL_EQUAL } else { TokenType::EQUAL };
                self.make(t)
            }
            b'<' => {
                let t = if self.matches(b'=') { TokenType::LESS_EQUAL } else { TokenType::LESS };
                self.make(t)
            }
            b'>' => {
                let t =
                    if self.matches(b'=') { TokenType::GREATER_EQUAL } else { TokenType::GREATER };
                self.make(t)
            }
            _ => self.error("Unexpected character."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(src: &str) -> Vec<TokenType> {
        let mut s = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let t = s.scan_token();
            let done = t.token_type == TokenType::EOF;
            out.push(t.token_type);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let mut s = Scanner::new("  \n// hi\n  nil");
        let t = s.scan_token();
        assert_eq!(t.token_type, TokenType::NIL);
        assert_eq!(t.line, 3);
    }

    #[test]
    fn keywords_classify_exactly_sixteen_words() {
        assert_eq!(
            types("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenType::AND,
                TokenType::CLASS,
                TokenType::ELSE,
                TokenType::FALSE,
                TokenType::FOR,
                TokenType::FUN,
                TokenType::IF,
                TokenType::NIL,
                TokenType::OR,
                TokenType::PRINT,
                TokenType::RETURN,
                TokenType::SUPER,
                TokenType::THIS,
                TokenType::TRUE,
                TokenType::VAR,
                TokenType::WHILE,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_still_an_identifier() {
        assert_eq!(types("forest"), vec![TokenType::IDENTIFIER, TokenType::EOF]);
        assert_eq!(types("f"), vec![TokenType::IDENTIFIER, TokenType::EOF]);
        assert_eq!(types("th"), vec![TokenType::IDENTIFIER, TokenType::EOF]);
    }

    #[test]
    fn two_char_operators_are_greedy() {
        assert_eq!(
            types("!= == <= >= ! = < >"),
            vec![
                TokenType::BANG_EQUAL,
                TokenType::EQUAL_EQUAL,
                TokenType::LESS_EQUAL,
                TokenType::GREATER_EQUAL,
                TokenType::BANG,
                TokenType::EQUAL,
                TokenType::LESS,
                TokenType::GREATER,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn number_literal_consumes_fractional_part_only_with_following_digit() {
        let mut s = Scanner::new("1.5 1. 1");
        let a = s.scan_token();
        assert_eq!((a.token_type, a.lexeme), (TokenType::NUMBER, "1.5"));
        let b = s.scan_token();
        assert_eq!((b.token_type, b.lexeme), (TokenType::NUMBER, "1"));
        let dot = s.scan_token();
        assert_eq!(dot.token_type, TokenType::DOT);
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let mut s = Scanner::new("\"abc");
        let t = s.scan_token();
        assert_eq!(t.token_type, TokenType::ERR);
        assert_eq!(t.lexeme, "Unterminated string.");
    }

    #[test]
    fn multiline_string_tracks_line_number() {
        let mut s = Scanner::new("\"a\nb\" nil");
        let t = s.scan_token();
        assert_eq!(t.token_type, TokenType::STRING);
        let nil = s.scan_token();
        assert_eq!(nil.line, 2);
    }

    #[test]
    fn unknown_byte_is_an_error_token() {
        let mut s = Scanner::new("@");
        let t = s.scan_token();
        assert_eq!(t.token_type, TokenType::ERR);
        assert_eq!(t.lexeme, "Unexpected character.");
    }
}
