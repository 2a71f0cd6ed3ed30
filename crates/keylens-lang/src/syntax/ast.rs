/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum Item {
    TypeDecl(TypeDecl),
    FnDef(FnDef),
    Stmt(Stmt),
}

// ─── Type declarations ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Struct,
    Class,
}

/// `@attr struct Name<T>: Super<T> { members }`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub attributes: Vec<Attribute>,
    pub kind: DeclKind,
    pub name: String,
    pub generics: Vec<String>,
    pub superclass: Option<TypeExpr>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl TypeDecl {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum MemberDecl {
    Property(PropertyDecl),
    Subscript(SubscriptDecl),
}

/// `let x: T`, `var y: T`, `var count: Int { get }`
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub is_var: bool,
    /// `None` for stored properties.
    pub accessors: Option<Accessors>,
    pub span: Span,
}

/// `subscript<U>(dynamicMember member: KeyPath<T, U>) -> Lens<U> { get set }`
#[derive(Debug, Clone)]
pub struct SubscriptDecl {
    pub generics: Vec<String>,
    pub params: Vec<SubscriptParam>,
    pub ret: TypeExpr,
    pub accessors: Accessors,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SubscriptParam {
    /// External argument label, e.g. `dynamicMember`.
    pub label: Option<String>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessors {
    pub set: bool,
}

// ─── Functions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub is_inout: bool,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let x: T`, `var x = expr`, `let x: T = expr`
    VarDecl(VarDecl),
    /// `target = value` where target is an identifier, `_`, or a member/subscript chain.
    Assign(Assign),
    /// A standalone expression.
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub is_var: bool,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64, Span),
    Float(f64, Span),
    Bool(bool, Span),
    StringLit(String, Span),
    Ident(String, Span),

    /// `expr.name`
    Member {
        expr: Box<Expr>,
        name: String,
        span: Span,
    },

    /// `expr[index]`
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `start ..< end`
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        span: Span,
    },

    /// `\Root.a.b[i]`
    KeyPath {
        root: TypeExpr,
        components: Vec<KeyPathComponent>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Int(_, s)            => s,
            Expr::Float(_, s)          => s,
            Expr::Bool(_, s)           => s,
            Expr::StringLit(_, s)      => s,
            Expr::Ident(_, s)          => s,
            Expr::Member { span, .. }  => span,
            Expr::Index { span, .. }   => span,
            Expr::Range { span, .. }   => span,
            Expr::KeyPath { span, .. } => span,
        }
    }

    /// `_` as an assignment target.
    pub fn is_discard(&self) -> bool {
        matches!(self, Expr::Ident(n, _) if n == "_")
    }
}

#[derive(Debug, Clone)]
pub enum KeyPathComponent {
    Member(String, Span),
    Index(Expr, Span),
}

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name` or `Name<A, B>`
    Named { name: String, args: Vec<TypeExpr>, span: Span },
    /// `[T]`
    Array(Box<TypeExpr>, Span),
    /// `[K: V]`
    Dictionary(Box<TypeExpr>, Box<TypeExpr>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> &Span {
        match self {
            TypeExpr::Named { span, .. }     => span,
            TypeExpr::Array(_, s)            => s,
            TypeExpr::Dictionary(_, _, s)    => s,
        }
    }

    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeExpr::Named { name: name.into(), args: Vec::new(), span }
    }
}
