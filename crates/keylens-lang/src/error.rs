use thiserror::Error as ThisError;

use crate::syntax::ast::Span;
use crate::types::Ty;

/// Error codes prefixed by phase: L = lexer, P = parser, S = semantic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // integer literal out of range

    // Parser
    P001, // unexpected token
    P002, // missing expected token

    // Semantic / resolver
    S001, // undefined symbol
    S002, // type mismatch
    S003, // redeclaration in same scope
    S004, // assignment through immutable binding or read-only member
    S005, // unknown type
    S006, // wrong generic argument count
    S007, // invalid @dynamicMemberLookup declaration
    S008, // ambiguous member lookup
    S009, // no viable member or subscript
    S010, // unresolvable generic parameter
    S011, // key path step does not chain
    S012, // invalid inheritance
}

impl ErrorCode {
    /// All current codes are hard errors (not warnings).
    /// Extend this when warning codes are added.
    pub fn is_error(&self) -> bool { true }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
            Self::S005 => "S005",
            Self::S006 => "S006",
            Self::S007 => "S007",
            Self::S008 => "S008",
            Self::S009 => "S009",
            Self::S010 => "S010",
            Self::S011 => "S011",
            Self::S012 => "S012",
        }
    }
}

#[derive(Debug, Clone, ThisError)]
#[error("[{}] {line}:{column}: {message}", .code.as_str())]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }

    pub fn at(code: ErrorCode, span: &Span, message: impl Into<String>) -> Self {
        Self::new(code, span.line, span.column, message)
    }
}

// ─── Resolution failures ─────────────────────────────────────────────────────

/// Why a member access could not be resolved.
///
/// Returned by the lookup and overload resolvers; the checker turns these
/// into located diagnostics with [`LookupError::into_error`].
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum LookupError {
    /// A key path step was appended to a path whose leaf is a different type.
    /// Never user-facing in a well-formed pass.
    #[error("key path step applies to `{found}` but the path ends in `{expected}`")]
    TypeMismatch { expected: Ty, found: Ty },

    #[error("ambiguous use of `{member}` on `{base}`; candidates: {}", .candidates.join(", "))]
    AmbiguousLookup {
        base: Ty,
        member: String,
        candidates: Vec<String>,
    },

    #[error("value of type `{base}` has no member `{member}`{}", .reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    NoViableCandidate {
        base: Ty,
        member: String,
        reason: Option<String>,
    },

    #[error("cannot infer generic parameter `{param}` in {context}")]
    UnresolvableGeneric { param: String, context: String },
}

impl LookupError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TypeMismatch { .. }        => ErrorCode::S011,
            Self::AmbiguousLookup { .. }     => ErrorCode::S008,
            Self::NoViableCandidate { .. }   => ErrorCode::S009,
            Self::UnresolvableGeneric { .. } => ErrorCode::S010,
        }
    }

    /// Generic substitution failures abort the whole compilation unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnresolvableGeneric { .. })
    }

    pub fn into_error(self, span: &Span) -> Error {
        Error::at(self.code(), span, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclId, Ty};

    fn int() -> Ty {
        Ty::Nominal { id: DeclId(0), name: "Int".into(), args: vec![] }
    }

    #[test]
    fn display_includes_code_and_location() {
        let e = Error::new(ErrorCode::S009, 3, 7, "no member `z`");
        assert_eq!(e.to_string(), "[S009] 3:7: no member `z`");
    }

    #[test]
    fn lookup_errors_map_to_semantic_codes() {
        let amb = LookupError::AmbiguousLookup {
            base: int(),
            member: "x".into(),
            candidates: vec!["A.subscript".into(), "B.subscript".into()],
        };
        assert_eq!(amb.code(), ErrorCode::S008);
        assert!(amb.to_string().contains("A.subscript, B.subscript"));

        let none = LookupError::NoViableCandidate { base: int(), member: "q".into(), reason: None };
        assert_eq!(none.code(), ErrorCode::S009);
        assert_eq!(none.to_string(), "value of type `Int` has no member `q`");
        assert!(!none.is_fatal());

        let generic = LookupError::UnresolvableGeneric { param: "V".into(), context: "subscript".into() };
        assert_eq!(generic.code(), ErrorCode::S010);
        assert!(generic.is_fatal());
    }

    #[test]
    fn no_viable_reason_is_appended() {
        let e = LookupError::NoViableCandidate {
            base: int(),
            member: "x".into(),
            reason: Some("only get-only subscripts apply".into()),
        };
        assert!(e.to_string().ends_with("(only get-only subscripts apply)"));
    }
}
