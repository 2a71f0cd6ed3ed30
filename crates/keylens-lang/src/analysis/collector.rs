//! Pass 1: Symbol Collector
//!
//! Builds the symbol table from every type declaration in the prelude and the
//! program:
//! - Registers type names and their generic parameters (so declarations may
//!   refer to types declared later in the source)
//! - Resolves superclasses and member signatures
//! - Precomputes each declaration's ancestor linearization
//! - Records function names to catch redeclarations
//!
//! The table is frozen once this pass returns.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::syntax::ast::{self, DeclKind, Item, MemberDecl, Program};
use crate::error::{Error, ErrorCode};
use crate::types::subst::substitute;
use crate::types::{DeclId, Mutability, Ty};
use super::overload::shape_of;
use super::symbols::{Member, MemberKind, SubscriptParam, SubscriptSig, SymbolTable};

pub struct Collector {
    pub table: SymbolTable,
    pub errors: Vec<Error>,
}

impl Collector {
    pub fn new() -> Self {
        Self { table: SymbolTable::new(), errors: Vec::new() }
    }

    /// `programs` are processed in order; the prelude comes first.
    pub fn collect(mut self, programs: &[&Program]) -> (SymbolTable, Vec<Error>) {
        let mut decls = Vec::new();
        let mut fns = FxHashSet::default();

        // Names first, so member types can refer forward
        for item in programs.iter().flat_map(|p| p.items.iter()) {
            match item {
                Item::TypeDecl(d) => {
                    match self.table.declare(&d.name, d.kind, &d.generics, d.span.clone()) {
                        Some(id) => decls.push((id, d)),
                        None => self.errors.push(Error::at(
                            ErrorCode::S003, &d.span,
                            format!("type `{}` already declared", d.name),
                        )),
                    }
                }
                Item::FnDef(f) => {
                    if !fns.insert(f.name.as_str()) {
                        self.errors.push(Error::at(
                            ErrorCode::S003, &f.span,
                            format!("function `{}` already declared", f.name),
                        ));
                    }
                }
                Item::Stmt(_) => {}
            }
        }

        for (id, d) in &decls {
            self.collect_decl(*id, d);
        }

        for (id, _) in &decls {
            let chain = self.linearize(*id);
            self.table.decl_mut(*id).linearization = chain;
        }

        (self.table, self.errors)
    }

    // ── Declarations ──────────────────────────────────────────────────────────

    fn collect_decl(&mut self, id: DeclId, d: &ast::TypeDecl) {
        let env: FxHashMap<String, Ty> = self.table.decl(id).generics.iter()
            .map(|g| (g.name.clone(), g.ty()))
            .collect();

        for attr in &d.attributes {
            if attr.name != "dynamicMemberLookup" {
                tracing::warn!(attribute = %attr.name, decl = %d.name, "ignoring unknown attribute");
            }
        }

        let superclass = d.superclass.as_ref().and_then(|s| self.collect_superclass(d, s, &env));

        let mut members: Vec<Member> = Vec::new();
        for m in &d.members {
            match m {
                MemberDecl::Property(p) => {
                    if members.iter().any(|existing| existing.is_property() && existing.name == p.name) {
                        self.errors.push(Error::at(
                            ErrorCode::S003, &p.span,
                            format!("`{}` already declared in `{}`", p.name, d.name),
                        ));
                        continue;
                    }
                    let ty = match self.table.resolve_type_expr(&p.ty, &env) {
                        Ok(t) => t,
                        Err(e) => { self.errors.push(e); continue; }
                    };
                    let (kind, writable) = match p.accessors {
                        None            => (MemberKind::Stored, p.is_var),
                        Some(accessors) => (MemberKind::Computed, accessors.set),
                    };
                    let mutability = if writable { Mutability::ReadWrite } else { Mutability::ReadOnly };
                    members.push(Member { name: p.name.clone(), kind, ty, mutability, span: p.span.clone() });
                }
                MemberDecl::Subscript(s) => {
                    if let Some(member) = self.collect_subscript(s, &env) {
                        members.push(member);
                    }
                }
            }
        }

        let decl = self.table.decl_mut(id);
        decl.dynamic_member_lookup = d.has_attribute("dynamicMemberLookup");
        decl.superclass = superclass;
        decl.members = members;
    }

    fn collect_superclass(
        &mut self,
        d: &ast::TypeDecl,
        texpr: &ast::TypeExpr,
        env: &FxHashMap<String, Ty>,
    ) -> Option<Ty> {
        if d.kind == DeclKind::Struct {
            self.errors.push(Error::at(
                ErrorCode::S012, texpr.span(),
                format!("struct `{}` cannot inherit; only classes have superclasses", d.name),
            ));
            return None;
        }
        let ty = match self.table.resolve_type_expr(texpr, env) {
            Ok(t) => t,
            Err(e) => { self.errors.push(e); return None; }
        };
        if !self.table.is_class(&ty) {
            self.errors.push(Error::at(
                ErrorCode::S012, texpr.span(),
                format!("`{}` cannot inherit from non-class type `{ty}`", d.name),
            ));
            return None;
        }
        Some(ty)
    }

    fn collect_subscript(&mut self, s: &ast::SubscriptDecl, env: &FxHashMap<String, Ty>) -> Option<Member> {
        let generics: Vec<_> = s.generics.iter().map(|g| self.table.fresh_param(g)).collect();
        let mut env = env.clone();
        for g in &generics {
            env.insert(g.name.clone(), g.ty());
        }

        let mut params = Vec::new();
        for p in &s.params {
            match self.table.resolve_type_expr(&p.ty, &env) {
                Ok(ty) => params.push(SubscriptParam { label: p.label.clone(), name: p.name.clone(), ty }),
                Err(e) => { self.errors.push(e); return None; }
            }
        }
        let ty = match self.table.resolve_type_expr(&s.ret, &env) {
            Ok(t) => t,
            Err(e) => { self.errors.push(e); return None; }
        };

        let sig = SubscriptSig { generics, params, has_setter: s.accessors.set };

        if sig.mentions_dynamic_member() {
            let well_formed = sig.dynamic_member_param()
                .is_some_and(|param| shape_of(&self.table, param).is_some());
            if !well_formed {
                let found = sig.params.iter()
                    .map(|p| p.ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.errors.push(Error::at(
                    ErrorCode::S007, &s.span,
                    format!(
                        "`subscript(dynamicMember:)` takes exactly one `KeyPath`, `WritableKeyPath` or `String` parameter, found ({found})"
                    ),
                ));
                return None;
            }
        }

        let mutability = if sig.has_setter { Mutability::ReadWrite } else { Mutability::ReadOnly };
        Some(Member {
            name: "subscript".into(),
            kind: MemberKind::Subscript(sig),
            ty,
            mutability,
            span: s.span.clone(),
        })
    }

    // ── Linearization ─────────────────────────────────────────────────────────

    /// Self, then each superclass in turn, expressed in `id`'s own parameters.
    fn linearize(&mut self, id: DeclId) -> Vec<Ty> {
        let decl = self.table.decl(id);
        let mut chain = vec![decl.declared_ty()];
        let mut seen = vec![id];
        let mut current = decl.superclass.clone();

        while let Some(sup) = current {
            let Some(sup_id) = sup.decl_id() else { break };
            if seen.contains(&sup_id) {
                // report the cycle once, from the declaration it starts at
                if sup_id == id {
                    let decl = self.table.decl(id);
                    self.errors.push(Error::at(
                        ErrorCode::S012, &decl.span,
                        format!("class `{}` inherits from itself", decl.name),
                    ));
                }
                break;
            }
            seen.push(sup_id);
            let map = self.table.substitution_for(&sup);
            current = self.table.decl(sup_id).superclass.as_ref().map(|s| substitute(s, &map));
            chain.push(sup);
        }

        chain
    }
}

impl Default for Collector {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn collect(src: &str) -> (SymbolTable, Vec<Error>) {
        let prelude = parse(crate::prelude::SOURCE);
        let program = parse(src);
        Collector::new().collect(&[&prelude, &program])
    }

    fn codes(errors: &[Error]) -> Vec<ErrorCode> {
        errors.iter().map(|e| e.code.clone()).collect()
    }

    #[test]
    fn forward_references_resolve() {
        let (table, errors) = collect("struct Rectangle { var topLeft: Point }\nstruct Point { let x: Int }");
        assert!(errors.is_empty(), "{errors:?}");
        let rect = table.decl_by_name("Rectangle").unwrap();
        assert_eq!(rect.members[0].ty.to_string(), "Point");
        assert_eq!(rect.members[0].mutability, Mutability::ReadWrite);
        let point = table.decl_by_name("Point").unwrap();
        assert_eq!(point.members[0].mutability, Mutability::ReadOnly);
    }

    #[test]
    fn computed_property_mutability_follows_setter() {
        let (table, _) = collect("struct S { var a: Int { get }\n var b: Int { get set } }");
        let s = table.decl_by_name("S").unwrap();
        assert_eq!(s.members[0].kind, MemberKind::Computed);
        assert_eq!(s.members[0].mutability, Mutability::ReadOnly);
        assert_eq!(s.members[1].mutability, Mutability::ReadWrite);
    }

    #[test]
    fn linearization_is_instantiated_through_superclass_args() {
        let (table, errors) = collect("class A<T> {}\nclass B<U>: A<U> {}\nclass C: B<Int> {}");
        assert!(errors.is_empty(), "{errors:?}");
        let c = table.decl_by_name("C").unwrap();
        let chain: Vec<_> = c.linearization.iter().map(|t| t.to_string()).collect();
        assert_eq!(chain, vec!["C", "B<Int>", "A<Int>"]);
    }

    #[test]
    fn subscript_generics_are_fresh_per_subscript() {
        let (table, _) = collect("struct L<T> {\n subscript<U>(dynamicMember m: KeyPath<T, U>) -> U { get }\n subscript<U>(dynamicMember m: WritableKeyPath<T, U>) -> U { get set }\n}");
        let l = table.decl_by_name("L").unwrap();
        let a = l.members[0].subscript().unwrap().generics[0].id;
        let b = l.members[1].subscript().unwrap().generics[0].id;
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_type_and_member() {
        let (_, errors) = collect("struct P { let x: Int\n var x: Int }\nstruct P {}");
        assert_eq!(codes(&errors), vec![ErrorCode::S003, ErrorCode::S003]);
    }

    #[test]
    fn duplicate_function() {
        let (_, errors) = collect("fn f() {}\nfn f() {}");
        assert_eq!(codes(&errors), vec![ErrorCode::S003]);
    }

    #[test]
    fn inheritance_errors() {
        let (_, errors) = collect("struct P {}\nstruct S: P {}");
        assert_eq!(codes(&errors), vec![ErrorCode::S012]);

        let (_, errors) = collect("struct P {}\nclass K: P {}");
        assert_eq!(codes(&errors), vec![ErrorCode::S012]);

        let (table, errors) = collect("class X: Y {}\nclass Y: X {}");
        assert_eq!(codes(&errors), vec![ErrorCode::S012, ErrorCode::S012]);
        assert_eq!(table.decl_by_name("X").unwrap().linearization.len(), 2);
    }

    #[test]
    fn unknown_member_type() {
        let (_, errors) = collect("struct P { var q: Quux }");
        assert_eq!(codes(&errors), vec![ErrorCode::S005]);
    }

    #[test]
    fn malformed_dynamic_member_subscript() {
        let (table, errors) = collect("struct P { subscript(dynamicMember m: Int) -> Int { get } }");
        assert_eq!(codes(&errors), vec![ErrorCode::S007]);
        assert!(table.decl_by_name("P").unwrap().members.is_empty());
    }
}
