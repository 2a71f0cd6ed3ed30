use rustc_hash::FxHashMap;

use crate::syntax::ast::Span;
use crate::types::Ty;

// ─── Binding ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Let,
    Var,
    Param,
    InoutParam,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub ty: Ty,
    pub kind: BindingKind,
    pub span: Span,
}

impl Binding {
    pub fn new(name: impl Into<String>, ty: Ty, kind: BindingKind, span: Span) -> Self {
        Self { name: name.into(), ty, kind, span }
    }

    /// Only `var` bindings and `inout` parameters may be assigned through.
    pub fn is_mutable(&self) -> bool {
        matches!(self.kind, BindingKind::Var | BindingKind::InoutParam)
    }
}

// ─── Scope ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
}

pub struct Scope {
    pub kind: ScopeKind,
    bindings: FxHashMap<String, Binding>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self { kind, bindings: FxHashMap::default() }
    }

    /// Returns `false` if a binding with the same name already exists in this scope.
    pub fn declare(&mut self, binding: Binding) -> bool {
        if self.bindings.contains_key(&binding.name) {
            return false;
        }
        self.bindings.insert(binding.name.clone(), binding);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

// ─── ScopeStack ───────────────────────────────────────────────────────────────

pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new(ScopeKind::Global)] }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare in the innermost scope. Returns `false` on redeclaration.
    pub fn declare(&mut self, binding: Binding) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => scope.declare(binding),
            None => false,
        }
    }

    /// Innermost scope to outermost.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self { Self::new() }
}
