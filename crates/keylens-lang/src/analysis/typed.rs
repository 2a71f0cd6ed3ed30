//! Typed tree produced by the checker.
//!
//! Every member access is already resolved here: a `Member` or `Subscript`
//! node for declared members, a `DynamicMember` node for synthesized
//! `subscript(dynamicMember:)` calls. The `Display` impls give a compact
//! s-expression dump used by tests and tooling.

use std::fmt;

use crate::types::Ty;
use super::keypath::KeyPath;
use super::lookup::{DynamicMemberArg, ResolvedMember, SynthesizedCall};

static ERROR_TY: Ty = Ty::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Get,
    Set,
    /// Read-modify-write of an intermediate value.
    Modify,
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Accessor::Get    => "get",
            Accessor::Set    => "set",
            Accessor::Modify => "modify",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

// ─── Expressions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpr {
    Literal { value: Literal, ty: Ty },
    Var { name: String, ty: Ty },
    Member {
        base: Box<TypedExpr>,
        member: ResolvedMember,
        accessor: Accessor,
    },
    Subscript {
        base: Box<TypedExpr>,
        index: Box<TypedExpr>,
        member: ResolvedMember,
        accessor: Accessor,
    },
    /// `base[dynamicMember: argument]`, with the index values any subscript
    /// step of the key path captures.
    DynamicMember {
        base: Box<TypedExpr>,
        call: SynthesizedCall,
        captures: Vec<TypedExpr>,
        accessor: Accessor,
    },
    KeyPath {
        path: KeyPath,
        captures: Vec<TypedExpr>,
        ty: Ty,
    },
    Range {
        start: Box<TypedExpr>,
        end: Box<TypedExpr>,
        ty: Ty,
    },
    /// A failed expression. Its type is `Ty::Error`.
    Error,
}

impl TypedExpr {
    pub fn ty(&self) -> &Ty {
        match self {
            TypedExpr::Literal { ty, .. }           => ty,
            TypedExpr::Var { ty, .. }               => ty,
            TypedExpr::Member { member, .. }        => &member.ty,
            TypedExpr::Subscript { member, .. }     => &member.ty,
            TypedExpr::DynamicMember { call, .. }   => &call.result,
            TypedExpr::KeyPath { ty, .. }           => ty,
            TypedExpr::Range { ty, .. }             => ty,
            TypedExpr::Error                        => &ERROR_TY,
        }
    }

    pub fn is_error(&self) -> bool {
        self.ty().is_error()
    }

    /// Every synthesized call in this expression, outermost first.
    pub fn dynamic_calls(&self) -> Vec<&SynthesizedCall> {
        let mut out = Vec::new();
        let mut current = self;
        loop {
            match current {
                TypedExpr::DynamicMember { base, call, .. } => { out.push(call); current = base.as_ref(); }
                TypedExpr::Member { base, .. } | TypedExpr::Subscript { base, .. } => current = base.as_ref(),
                _ => break,
            }
        }
        out
    }

    /// The accessor of the outermost access, if this is one.
    pub fn accessor(&self) -> Option<Accessor> {
        match self {
            TypedExpr::Member { accessor, .. }
            | TypedExpr::Subscript { accessor, .. }
            | TypedExpr::DynamicMember { accessor, .. } => Some(*accessor),
            _ => None,
        }
    }
}

fn decl_name(ty: &Ty) -> &str {
    match ty {
        Ty::Nominal { name, .. } => name,
        _ => "?",
    }
}

impl fmt::Display for TypedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedExpr::Literal { value, ty } => match value {
                Literal::Int(v)    => write!(f, "({v} : {ty})"),
                Literal::Float(v)  => write!(f, "({v} : {ty})"),
                Literal::Bool(v)   => write!(f, "({v} : {ty})"),
                Literal::String(s) => write!(f, "({s:?} : {ty})"),
            },
            TypedExpr::Var { name, ty } => write!(f, "({name} : {ty})"),
            TypedExpr::Member { base, member, accessor } => write!(
                f, "(member_ref {accessor} {base} #{}.{} : {})",
                decl_name(&member.owner), member.name, member.ty,
            ),
            TypedExpr::Subscript { base, index, member, accessor } => write!(
                f, "(subscript {accessor} {base} {index} #{}.subscript : {})",
                decl_name(&member.owner), member.ty,
            ),
            TypedExpr::DynamicMember { base, call, captures, accessor } => {
                write!(f, "(dynamic_member {accessor} {base} #{}.subscript(dynamicMember:)",
                    decl_name(&call.candidate.level))?;
                if !call.substitutions.is_empty() {
                    let subs: Vec<_> = call.substitutions.iter().map(|t| t.to_string()).collect();
                    write!(f, "<{}>", subs.join(", "))?;
                }
                match &call.argument {
                    DynamicMemberArg::KeyPath(path) => write!(f, " [{path}]")?,
                    DynamicMemberArg::Name(name)    => write!(f, " {name:?}")?,
                }
                for c in captures {
                    write!(f, " {c}")?;
                }
                write!(f, " : {})", call.result)
            }
            TypedExpr::KeyPath { path, captures, .. } => {
                write!(f, "[{path}]")?;
                for c in captures {
                    write!(f, " {c}")?;
                }
                Ok(())
            }
            TypedExpr::Range { start, end, ty } => write!(f, "(range {start} {end} : {ty})"),
            TypedExpr::Error => write!(f, "<error>"),
        }
    }
}

// ─── Statements and items ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Binding {
        name: String,
        mutable: bool,
        ty: Ty,
        initializer: Option<TypedExpr>,
    },
    Assign { target: TypedExpr, value: TypedExpr },
    /// `_ = value`
    Discard(TypedExpr),
    Expr(TypedExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedParam {
    pub name: String,
    pub ty: Ty,
    pub is_inout: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFn {
    pub name: String,
    pub params: Vec<TypedParam>,
    pub body: Vec<TypedStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedItem {
    Fn(TypedFn),
    Stmt(TypedStmt),
}

impl fmt::Display for TypedStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedStmt::Binding { name, mutable, ty, initializer } => {
                let kw = if *mutable { "var" } else { "let" };
                write!(f, "{kw} {name}: {ty}")?;
                if let Some(init) = initializer {
                    write!(f, " = {init}")?;
                }
                Ok(())
            }
            TypedStmt::Assign { target, value } => write!(f, "{target} = {value}"),
            TypedStmt::Discard(value)           => write!(f, "_ = {value}"),
            TypedStmt::Expr(e)                  => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for TypedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedItem::Stmt(s) => write!(f, "{s}"),
            TypedItem::Fn(func) => {
                let params: Vec<_> = func.params.iter()
                    .map(|p| format!("{}: {}{}", p.name, if p.is_inout { "inout " } else { "" }, p.ty))
                    .collect();
                writeln!(f, "fn {}({}) {{", func.name, params.join(", "))?;
                for s in &func.body {
                    writeln!(f, "  {s}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
