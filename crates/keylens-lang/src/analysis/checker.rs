//! Pass 2: Type Resolver
//!
//! Walks every statement and expression in order, types literals and
//! bindings, and sends each member access through the `LookupResolver`.
//! Resolutions become typed nodes via the accessor synthesizer.
//!
//! Failures are isolated per expression: a failed access yields
//! `TypedExpr::Error`, and accesses on an error-typed base report nothing
//! further. An unresolvable generic parameter stops the pass.

use rustc_hash::FxHashMap;

use crate::ReadPreference;
use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode, LookupError};
use crate::prelude;
use crate::types::{KeyPathKind, Ty};
use super::keypath::{KeyPath, StepKind};
use super::lookup::{AccessKind, LookupResolver, Resolution};
use super::scope::{Binding, BindingKind, ScopeKind, ScopeStack};
use super::symbols::SymbolTable;
use super::synth::{accessor_for, synthesize};
use super::typed::{Literal, TypedExpr, TypedFn, TypedItem, TypedParam, TypedStmt};

pub struct TypeResolver<'a> {
    table: &'a SymbolTable,
    lookup: LookupResolver<'a>,
    scopes: ScopeStack,
    pub errors: Vec<Error>,
    /// Set by a fatal resolution failure; remaining statements are skipped.
    aborted: bool,
}

impl<'a> TypeResolver<'a> {
    pub fn new(table: &'a SymbolTable, preference: ReadPreference) -> Self {
        Self {
            table,
            lookup: LookupResolver::new(table, preference),
            scopes: ScopeStack::new(),
            errors: Vec::new(),
            aborted: false,
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(items = program.items.len()))]
    pub fn run(mut self, program: &Program) -> (Vec<TypedItem>, Vec<Error>) {
        let mut items = Vec::new();
        for item in &program.items {
            if self.aborted {
                tracing::debug!("aborting after fatal resolution error");
                break;
            }
            match item {
                Item::TypeDecl(_) => {}
                Item::FnDef(f)    => items.push(TypedItem::Fn(self.check_fn(f))),
                Item::Stmt(s)     => items.push(TypedItem::Stmt(self.check_stmt(s))),
            }
        }
        (items, self.errors)
    }

    // ── Functions ─────────────────────────────────────────────────────────────

    fn check_fn(&mut self, f: &FnDef) -> TypedFn {
        self.scopes.push(ScopeKind::Function);

        let mut params = Vec::new();
        for p in &f.params {
            let ty = self.resolve_type(&p.ty);
            let kind = if p.is_inout { BindingKind::InoutParam } else { BindingKind::Param };
            if !self.scopes.declare(Binding::new(p.name.clone(), ty.clone(), kind, p.span.clone())) {
                self.errors.push(Error::at(
                    ErrorCode::S003, &p.span,
                    format!("parameter `{}` already declared", p.name),
                ));
            }
            params.push(TypedParam { name: p.name.clone(), ty, is_inout: p.is_inout });
        }

        let mut body = Vec::new();
        for stmt in &f.body {
            if self.aborted { break; }
            body.push(self.check_stmt(stmt));
        }

        self.scopes.pop();
        TypedFn { name: f.name.clone(), params, body }
    }

    // ── Statements ────────────────────────────────────────────────────────────

    fn check_stmt(&mut self, stmt: &Stmt) -> TypedStmt {
        match stmt {
            Stmt::VarDecl(v) => self.check_var_decl(v),
            Stmt::Assign(a)  => self.check_assign(a),
            Stmt::Expr(e)    => TypedStmt::Expr(self.check_expr(e)),
        }
    }

    fn check_var_decl(&mut self, v: &VarDecl) -> TypedStmt {
        let annotated = v.ty.as_ref().map(|t| self.resolve_type(t));
        let initializer = v.initializer.as_ref().map(|e| (self.check_expr(e), e.span()));

        let ty = match (&annotated, &initializer) {
            (Some(ann), Some((init, span))) => {
                self.expect_assignable(ann, init.ty(), span);
                ann.clone()
            }
            (Some(ann), None)       => ann.clone(),
            (None, Some((init, _))) => init.ty().clone(),
            (None, None)            => Ty::Error,
        };

        // `let _: T = expr` only checks the initializer
        if v.name != "_" {
            let kind = if v.is_var { BindingKind::Var } else { BindingKind::Let };
            if !self.scopes.declare(Binding::new(v.name.clone(), ty.clone(), kind, v.span.clone())) {
                self.errors.push(Error::at(
                    ErrorCode::S003, &v.span,
                    format!("`{}` already declared in this scope", v.name),
                ));
            }
        }

        TypedStmt::Binding {
            name: v.name.clone(),
            mutable: v.is_var,
            ty,
            initializer: initializer.map(|(e, _)| e),
        }
    }

    fn check_assign(&mut self, a: &Assign) -> TypedStmt {
        if a.target.is_discard() {
            return TypedStmt::Discard(self.check_expr(&a.value));
        }
        let target = self.check_place(&a.target, AccessKind::Assign);
        let value = self.check_expr(&a.value);
        self.expect_assignable(target.ty(), value.ty(), a.value.span());
        TypedStmt::Assign { target, value }
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &Expr) -> TypedExpr {
        match expr {
            Expr::Int(v, span)       => self.literal(Literal::Int(*v), prelude::INT, span),
            Expr::Float(v, span)     => self.literal(Literal::Float(*v), prelude::FLOAT, span),
            Expr::Bool(v, span)      => self.literal(Literal::Bool(*v), prelude::BOOL, span),
            Expr::StringLit(s, span) => self.literal(Literal::String(s.clone()), prelude::STRING, span),

            Expr::Ident(name, span) => match self.scopes.lookup(name) {
                Some(b) => TypedExpr::Var { name: name.clone(), ty: b.ty.clone() },
                None => {
                    self.errors.push(Error::at(ErrorCode::S001, span, format!("undefined symbol `{name}`")));
                    TypedExpr::Error
                }
            },

            Expr::Member { expr: base, name, span } => {
                let base = self.check_expr(base);
                self.access_member(base, name, span, AccessKind::Read)
            }

            Expr::Index { expr: base, index, span } => {
                let base = self.check_expr(base);
                let index = self.check_expr(index);
                self.access_subscript(base, index, span, AccessKind::Read)
            }

            Expr::Range { start, end, span } => self.check_range(start, end, span),

            Expr::KeyPath { root, components, span } => self.check_key_path(root, components, span),
        }
    }

    fn literal(&mut self, value: Literal, type_name: &str, span: &Span) -> TypedExpr {
        match self.table.builtin(type_name, Vec::new()) {
            Some(ty) => TypedExpr::Literal { value, ty },
            None => {
                self.errors.push(Error::at(
                    ErrorCode::S005, span,
                    format!("unknown type `{type_name}` for literal"),
                ));
                TypedExpr::Error
            }
        }
    }

    fn check_range(&mut self, start: &Expr, end: &Expr, span: &Span) -> TypedExpr {
        let start = self.check_expr(start);
        let end = self.check_expr(end);
        if start.is_error() || end.is_error() {
            return TypedExpr::Error;
        }
        if start.ty() != end.ty() {
            self.errors.push(Error::at(
                ErrorCode::S002, span,
                format!("range bounds must have the same type, found `{}` and `{}`", start.ty(), end.ty()),
            ));
            return TypedExpr::Error;
        }
        match self.table.builtin(prelude::RANGE, vec![start.ty().clone()]) {
            Some(ty) => TypedExpr::Range { start: Box::new(start), end: Box::new(end), ty },
            None => {
                self.errors.push(Error::at(ErrorCode::S005, span, format!("unknown type `{}`", prelude::RANGE)));
                TypedExpr::Error
            }
        }
    }

    fn check_key_path(&mut self, root: &TypeExpr, components: &[KeyPathComponent], span: &Span) -> TypedExpr {
        let root = self.resolve_type(root);
        if root.is_error() {
            return TypedExpr::Error;
        }

        let mut path: Option<KeyPath> = None;
        let mut captures = Vec::new();
        for component in components {
            let leaf = path.as_ref().map_or_else(|| root.clone(), |p| p.leaf().clone());
            let (step, at) = match component {
                KeyPathComponent::Member(name, at) => (self.lookup.property_step(&leaf, name), at),
                KeyPathComponent::Index(index, at) => {
                    let index = self.check_expr(index);
                    if index.is_error() {
                        return TypedExpr::Error;
                    }
                    let step = self.lookup.subscript_step(&leaf, index.ty());
                    captures.push(index);
                    (step, at)
                }
            };
            let next = step.and_then(|step| match &path {
                None    => KeyPath::build(root.clone(), step),
                Some(p) => p.extend(step),
            });
            match next {
                Ok(p) => path = Some(p),
                Err(e) => {
                    self.report(e, at);
                    return TypedExpr::Error;
                }
            }
        }

        match path {
            Some(path) => TypedExpr::KeyPath { ty: path.ty(), path, captures },
            None => {
                self.errors.push(Error::at(ErrorCode::P001, span, "key path needs at least one component"));
                TypedExpr::Error
            }
        }
    }

    // ── Member access ─────────────────────────────────────────────────────────

    fn access_member(&mut self, base: TypedExpr, name: &str, span: &Span, access: AccessKind) -> TypedExpr {
        if base.is_error() {
            return TypedExpr::Error;
        }
        match self.lookup.resolve_member(base.ty(), name, access) {
            Ok(resolution) => {
                if access.is_mutation() {
                    self.expect_writable(&resolution, name, span);
                }
                synthesize(base, None, resolution, accessor_for(access))
            }
            Err(e) => {
                self.report(e, span);
                TypedExpr::Error
            }
        }
    }

    fn access_subscript(&mut self, base: TypedExpr, index: TypedExpr, span: &Span, access: AccessKind) -> TypedExpr {
        if base.is_error() || index.is_error() {
            return TypedExpr::Error;
        }
        match self.lookup.resolve_subscript(base.ty(), index.ty(), access) {
            Ok(resolution) => {
                if access.is_mutation() {
                    self.expect_writable(&resolution, "subscript", span);
                }
                synthesize(base, Some(index), resolution, accessor_for(access))
            }
            Err(e) => {
                self.report(e, span);
                TypedExpr::Error
            }
        }
    }

    // ── Assignment targets ────────────────────────────────────────────────────

    /// Type an expression written to. `access` is `Assign` for the whole
    /// target and `Modify` for the components it goes through.
    fn check_place(&mut self, expr: &Expr, access: AccessKind) -> TypedExpr {
        match expr {
            Expr::Ident(name, span) => {
                let Some(b) = self.scopes.lookup(name) else {
                    self.errors.push(Error::at(ErrorCode::S001, span, format!("undefined symbol `{name}`")));
                    return TypedExpr::Error;
                };
                let node = TypedExpr::Var { name: name.clone(), ty: b.ty.clone() };
                if !b.is_mutable() {
                    let what = match b.kind {
                        BindingKind::Param => format!("parameter `{name}` is not `inout`"),
                        _                  => format!("`{name}` is a `let` constant"),
                    };
                    self.errors.push(Error::at(ErrorCode::S004, span, format!("cannot assign: {what}")));
                }
                node
            }
            Expr::Member { expr: base, name, span } => {
                let base = self.check_mutable_base(base);
                self.access_member(base, name, span, access)
            }
            Expr::Index { expr: base, index, span } => {
                let base = self.check_mutable_base(base);
                let index = self.check_expr(index);
                self.access_subscript(base, index, span, access)
            }
            other => {
                self.errors.push(Error::at(ErrorCode::S004, other.span(), "cannot assign to this expression"));
                TypedExpr::Error
            }
        }
    }

    /// The base of a mutated component. Class references are only read;
    /// value types are modified in place, so their own base must be mutable.
    fn check_mutable_base(&mut self, base: &Expr) -> TypedExpr {
        let mark = self.errors.len();
        let read = self.check_expr(base);
        if self.aborted || read.is_error() || self.table.is_class(read.ty()) {
            return read;
        }
        self.errors.truncate(mark);
        self.check_place(base, AccessKind::Modify)
    }

    fn expect_writable(&mut self, resolution: &Resolution, name: &str, span: &Span) {
        if resolution.mutability().is_writable() {
            return;
        }
        let why = match resolution {
            Resolution::Direct(m) if m.kind == StepKind::StoredProperty => "is a `let` constant",
            _ => "is get-only",
        };
        self.errors.push(Error::at(ErrorCode::S004, span, format!("cannot assign: `{name}` {why}")));
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn resolve_type(&mut self, texpr: &TypeExpr) -> Ty {
        match self.table.resolve_type_expr(texpr, &FxHashMap::default()) {
            Ok(ty) => ty,
            Err(e) => { self.errors.push(e); Ty::Error }
        }
    }

    fn report(&mut self, e: LookupError, span: &Span) {
        if e.is_fatal() {
            self.aborted = true;
        }
        self.errors.push(e.into_error(span));
    }

    fn expect_assignable(&mut self, target: &Ty, value: &Ty, span: &Span) {
        if !is_assignable(self.table, target, value) {
            self.errors.push(Error::at(
                ErrorCode::S002, span,
                format!("cannot assign value of type `{value}` to `{target}`"),
            ));
        }
    }
}

/// `value` can be stored into `target`: equal types, a value into its
/// `Optional`, or a writable key path where a read-only one is expected.
pub fn is_assignable(table: &SymbolTable, target: &Ty, value: &Ty) -> bool {
    if target.is_error() || value.is_error() || target == value {
        return true;
    }
    if table.optional_payload(target) == Some(value) {
        return true;
    }
    match (target, value) {
        (
            Ty::KeyPath { kind: KeyPathKind::ReadOnly, root: r1, value: v1 },
            Ty::KeyPath { kind: KeyPathKind::Writable, root: r2, value: v2 },
        ) => r1 == r2 && v1 == v2,
        _ => false,
    }
}
