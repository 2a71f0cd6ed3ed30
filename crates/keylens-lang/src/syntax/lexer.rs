use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'=' => TokenKind::Eq,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'@' => TokenKind::At,
            b'\\' => TokenKind::Backslash,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'.' => {
                if self.peek() == b'.' && self.peek_next() == b'<' {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotLt
                } else {
                    TokenKind::Dot
                }
            }
            b'-' => {
                if self.peek() == b'>' { self.advance(); TokenKind::Arrow }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col,
                        "expected `->`, bare `-` is not valid"));
                }
            }
            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else if self.peek() == b'*' { self.skip_block_comment(); return Ok(None); }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col, "unexpected character `/`"));
                }
            }

            b'"' => TokenKind::StringLit(self.read_string(line, col)?),
            b'0'..=b'9' => self.read_number(ch, line, col)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance(); // *
                self.advance(); // /
                break;
            }
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut s = String::new();
        let mut error: Option<Error> = None;
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let ch = self.advance();
            if ch == b'"' { break; }
            if ch == b'\\' {
                let esc_line = self.line;
                let esc_col  = self.column;
                match self.advance() {
                    b'n'  => s.push('\n'),
                    b't'  => s.push('\t'),
                    b'"'  => s.push('"'),
                    b'\\' => s.push('\\'),
                    other => {
                        // Keep consuming so the rest of the string doesn't
                        // produce cascading errors.
                        if error.is_none() {
                            error = Some(Error::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{}`", other as char)));
                        }
                    }
                }
            } else {
                s.push(ch as char);
            }
        }
        if let Some(e) = error { return Err(e); }
        Ok(s)
    }

    fn read_number(&mut self, first: u8, line: usize, col: usize) -> Result<TokenKind, Error> {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
        // a decimal point only counts when a digit follows, so `0..<3`
        // and `x.0` style member chains stay intact
        if !self.is_at_end() && self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance() as char);
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
            return s.parse().map(TokenKind::Float).map_err(|_| {
                Error::new(ErrorCode::L004, line, col, format!("invalid float literal `{s}`"))
            });
        }
        s.parse().map(TokenKind::Int).map_err(|_| {
            Error::new(ErrorCode::L004, line, col, format!("integer literal `{s}` overflows Int"))
        })
    }

    fn read_ident(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            s.push(self.advance() as char);
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<Error> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.into())
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn int_and_float_literals() {
        assert_eq!(lex("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(lex("4.5"), vec![TokenKind::Float(4.5), TokenKind::Eof]);
    }

    #[test]
    fn range_is_not_a_decimal_point() {
        assert_eq!(
            lex("0..<3"),
            vec![TokenKind::Int(0), TokenKind::DotDotLt, TokenKind::Int(3), TokenKind::Eof]
        );
    }

    #[test]
    fn member_chain() {
        assert_eq!(
            lex("lens.topLeft.x"),
            vec![ident("lens"), TokenKind::Dot, ident("topLeft"), TokenKind::Dot, ident("x"), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("struct"),    vec![TokenKind::Struct,    TokenKind::Eof]);
        assert_eq!(lex("class"),     vec![TokenKind::Class,     TokenKind::Eof]);
        assert_eq!(lex("subscript"), vec![TokenKind::Subscript, TokenKind::Eof]);
        assert_eq!(lex("inout"),     vec![TokenKind::Inout,     TokenKind::Eof]);
        assert_eq!(lex("get set"),   vec![TokenKind::Get, TokenKind::Set, TokenKind::Eof]);
    }

    #[test]
    fn underscore_is_an_identifier() {
        assert_eq!(lex("_"), vec![ident("_"), TokenKind::Eof]);
    }

    #[test]
    fn attribute_and_key_path_tokens() {
        assert_eq!(
            lex("@dynamicMemberLookup \\Point.x"),
            vec![
                TokenKind::At, ident("dynamicMemberLookup"),
                TokenKind::Backslash, ident("Point"), TokenKind::Dot, ident("x"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn arrow_and_generics() {
        assert_eq!(
            lex("-> Lens<U>"),
            vec![TokenKind::Arrow, ident("Lens"), TokenKind::Lt, ident("U"), TokenKind::Gt, TokenKind::Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(lex("// hi\n/* block */ x"), vec![ident("x"), TokenKind::Eof]);
    }

    #[test]
    fn string_with_escape() {
        assert_eq!(lex(r#""a\"b""#), vec![TokenKind::StringLit("a\"b".into()), TokenKind::Eof]);
    }

    #[test]
    fn errors() {
        assert_eq!(lex_err("#")[0].code, ErrorCode::L001);
        assert_eq!(lex_err("\"open")[0].code, ErrorCode::L002);
        assert_eq!(lex_err(r#""\q""#)[0].code, ErrorCode::L003);
        assert_eq!(lex_err("a - b")[0].code, ErrorCode::L001);
    }

    #[test]
    fn integer_overflow_is_reported() {
        assert_eq!(lex("9223372036854775807"), vec![TokenKind::Int(i64::MAX), TokenKind::Eof]);

        let errs = lex_err("let a = 99999999999999999999999");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L004);
        assert_eq!((errs[0].line, errs[0].column), (1, 9));
        assert!(errs[0].message.contains("overflows Int"));
    }

    #[test]
    fn positions_are_tracked() {
        let toks = Lexer::new("let\n  x").tokenize().unwrap();
        assert_eq!((toks[1].line, toks[1].column), (2, 3));
    }
}
