#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),

    // Keywords
    Struct,
    Class,
    Let,
    Var,
    Fn,
    Subscript,
    Get,
    Set,
    Inout,

    // Operators
    Eq,         // =
    Arrow,      // ->
    Lt,         // <
    Gt,         // >
    DotDotLt,   // ..<
    At,         // @
    Backslash,  // \

    // Punctuation
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::StringLit(_))
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Struct | Self::Class | Self::Let | Self::Var | Self::Fn
            | Self::Subscript | Self::Get | Self::Set | Self::Inout
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "struct"    => TokenKind::Struct,
        "class"     => TokenKind::Class,
        "let"       => TokenKind::Let,
        "var"       => TokenKind::Var,
        "fn"        => TokenKind::Fn,
        "subscript" => TokenKind::Subscript,
        "get"       => TokenKind::Get,
        "set"       => TokenKind::Set,
        "inout"     => TokenKind::Inout,
        "true"      => TokenKind::Bool(true),
        "false"     => TokenKind::Bool(false),
        _           => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
