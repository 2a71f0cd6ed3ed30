use rustc_hash::FxHashMap;

use crate::error::{Error, ErrorCode};
use crate::prelude;
use crate::syntax::ast::{DeclKind, Span, TypeExpr};
use crate::types::subst::{build_substitution_map, substitute};
use crate::types::{DeclId, GenericParamId, KeyPathKind, Mutability, SubstitutionMap, Ty};

// ─── Declarations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub id: GenericParamId,
    pub name: String,
}

impl GenericParam {
    pub fn ty(&self) -> Ty {
        Ty::Param { id: self.id, name: self.name.clone() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptParam {
    pub label: Option<String>,
    pub name: String,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptSig {
    /// The subscript's own generic parameters, e.g. `U` in `subscript<U>`.
    pub generics: Vec<GenericParam>,
    pub params: Vec<SubscriptParam>,
    pub has_setter: bool,
}

impl SubscriptSig {
    pub fn generic_ids(&self) -> Vec<GenericParamId> {
        self.generics.iter().map(|g| g.id).collect()
    }

    /// The parameter type when this is a `subscript(dynamicMember:)`.
    pub fn dynamic_member_param(&self) -> Option<&Ty> {
        match self.params.as_slice() {
            [p] if p.label.as_deref() == Some("dynamicMember") => Some(&p.ty),
            _ => None,
        }
    }

    /// Whether any parameter carries the `dynamicMember` label, well formed or not.
    pub fn mentions_dynamic_member(&self) -> bool {
        self.params.iter().any(|p| p.label.as_deref() == Some("dynamicMember"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Stored,
    Computed,
    Subscript(SubscriptSig),
}

#[derive(Debug, Clone)]
pub struct Member {
    /// Property name, or `subscript` for subscripts.
    pub name: String,
    pub kind: MemberKind,
    /// Property type or subscript result type, in the owner's generic parameters.
    pub ty: Ty,
    pub mutability: Mutability,
    pub span: Span,
}

impl Member {
    pub fn is_property(&self) -> bool {
        !matches!(self.kind, MemberKind::Subscript(_))
    }

    pub fn subscript(&self) -> Option<&SubscriptSig> {
        match &self.kind {
            MemberKind::Subscript(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_dynamic_member(&self) -> bool {
        self.subscript().is_some_and(|s| s.dynamic_member_param().is_some())
    }
}

/// Reference to one member of one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub decl: DeclId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclKind,
    pub generics: Vec<GenericParam>,
    /// Classes only, in this declaration's generic parameters.
    pub superclass: Option<Ty>,
    pub dynamic_member_lookup: bool,
    pub members: Vec<Member>,
    /// Self followed by every ancestor, most-derived first, written in this
    /// declaration's generic parameters.
    pub linearization: Vec<Ty>,
    pub span: Span,
}

impl TypeDecl {
    /// `Name<T, U>` in its own parameters.
    pub fn declared_ty(&self) -> Ty {
        Ty::nominal(self.id, self.name.clone(), self.generics.iter().map(GenericParam::ty).collect())
    }

    pub fn is_class(&self) -> bool {
        self.kind == DeclKind::Class
    }
}

// ─── SymbolTable ──────────────────────────────────────────────────────────────

/// Per-type member registry. Built by the collector, read-only afterwards.
#[derive(Debug, Default)]
pub struct SymbolTable {
    decls: Vec<TypeDecl>,
    by_name: FxHashMap<String, DeclId>,
    next_param: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Building (collector only) ─────────────────────────────────────────────

    /// Register a type name. Returns `None` if the name is taken.
    pub(crate) fn declare(&mut self, name: &str, kind: DeclKind, generics: &[String], span: Span) -> Option<DeclId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = DeclId(self.decls.len() as u32);
        let generics = generics.iter().map(|g| self.fresh_param(g)).collect();
        self.decls.push(TypeDecl {
            id,
            name: name.to_string(),
            kind,
            generics,
            superclass: None,
            dynamic_member_lookup: false,
            members: Vec::new(),
            linearization: Vec::new(),
            span,
        });
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    pub(crate) fn fresh_param(&mut self, name: &str) -> GenericParam {
        let id = GenericParamId(self.next_param);
        self.next_param += 1;
        GenericParam { id, name: name.to_string() }
    }

    pub(crate) fn decl_mut(&mut self, id: DeclId) -> &mut TypeDecl {
        &mut self.decls[id.0 as usize]
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn decl(&self, id: DeclId) -> &TypeDecl {
        &self.decls[id.0 as usize]
    }

    pub fn decl_by_name(&self, name: &str) -> Option<&TypeDecl> {
        self.by_name.get(name).map(|id| self.decl(*id))
    }

    pub fn decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter()
    }

    pub fn member(&self, r: MemberRef) -> &Member {
        &self.decl(r.decl).members[r.index]
    }

    /// Declaration of a nominal type, `None` for anything else.
    pub fn decl_of(&self, ty: &Ty) -> Option<&TypeDecl> {
        ty.decl_id().map(|id| self.decl(id))
    }

    pub fn is_class(&self, ty: &Ty) -> bool {
        self.decl_of(ty).is_some_and(TypeDecl::is_class)
    }

    /// A property declared directly on `ty`'s declaration. Ancestors and
    /// subscripts are not consulted.
    pub fn lookup(&self, ty: &Ty, name: &str) -> Option<MemberRef> {
        let decl = self.decl_of(ty)?;
        let index = decl.members.iter().position(|m| m.is_property() && m.name == name)?;
        Some(MemberRef { decl: decl.id, index })
    }

    /// Bindings of `ty`'s declaration parameters to its arguments.
    pub fn substitution_for(&self, ty: &Ty) -> SubstitutionMap {
        match self.decl_of(ty) {
            Some(decl) => {
                let ids: Vec<_> = decl.generics.iter().map(|g| g.id).collect();
                build_substitution_map(&ids, ty.args())
            }
            None => SubstitutionMap::default(),
        }
    }

    /// `ty` and its ancestors, most-derived first, instantiated with `ty`'s arguments.
    pub fn linearize(&self, ty: &Ty) -> Vec<Ty> {
        let Some(decl) = self.decl_of(ty) else { return Vec::new() };
        let map = self.substitution_for(ty);
        decl.linearization.iter().map(|t| substitute(t, &map)).collect()
    }

    /// Type of `member` as seen from the instantiated `level`.
    pub fn member_ty(&self, level: &Ty, member: MemberRef) -> Ty {
        substitute(&self.member(member).ty, &self.substitution_for(level))
    }

    /// Look up a prelude type by name and instantiate it.
    pub fn builtin(&self, name: &str, args: Vec<Ty>) -> Option<Ty> {
        let decl = self.decl_by_name(name)?;
        Some(Ty::nominal(decl.id, decl.name.clone(), args))
    }

    /// `Optional<Wrapped>` → `Wrapped`.
    pub fn optional_payload<'t>(&self, ty: &'t Ty) -> Option<&'t Ty> {
        match ty {
            Ty::Nominal { name, args, .. } if name == prelude::OPTIONAL && args.len() == 1 => Some(&args[0]),
            _ => None,
        }
    }

    // ── Type expressions ──────────────────────────────────────────────────────

    /// Resolve a syntactic type. `env` maps generic parameter names in scope.
    pub fn resolve_type_expr(&self, texpr: &TypeExpr, env: &FxHashMap<String, Ty>) -> Result<Ty, Error> {
        match texpr {
            TypeExpr::Array(elem, span) => {
                let elem = self.resolve_type_expr(elem, env)?;
                self.sugar(prelude::ARRAY, vec![elem], span)
            }
            TypeExpr::Dictionary(key, value, span) => {
                let key = self.resolve_type_expr(key, env)?;
                let value = self.resolve_type_expr(value, env)?;
                self.sugar(prelude::DICTIONARY, vec![key, value], span)
            }
            TypeExpr::Named { name, args, span } => {
                if let Some(param) = env.get(name) {
                    if !args.is_empty() {
                        return Err(Error::at(ErrorCode::S006, span,
                            format!("generic parameter `{name}` takes no arguments")));
                    }
                    return Ok(param.clone());
                }

                let args = args.iter()
                    .map(|a| self.resolve_type_expr(a, env))
                    .collect::<Result<Vec<_>, _>>()?;

                let kind = match name.as_str() {
                    "KeyPath"         => Some(KeyPathKind::ReadOnly),
                    "WritableKeyPath" => Some(KeyPathKind::Writable),
                    _ => None,
                };
                if let Some(kind) = kind {
                    let [root, value]: [Ty; 2] = args.try_into().map_err(|args: Vec<Ty>| {
                        Error::at(ErrorCode::S006, span,
                            format!("`{name}` expects 2 generic arguments, found {}", args.len()))
                    })?;
                    return Ok(Ty::key_path(kind, root, value));
                }

                let Some(decl) = self.decl_by_name(name) else {
                    return Err(Error::at(ErrorCode::S005, span, format!("unknown type `{name}`")));
                };
                if decl.generics.len() != args.len() {
                    return Err(Error::at(ErrorCode::S006, span, format!(
                        "`{name}` expects {} generic argument(s), found {}",
                        decl.generics.len(), args.len(),
                    )));
                }
                Ok(Ty::nominal(decl.id, decl.name.clone(), args))
            }
        }
    }

    fn sugar(&self, name: &str, args: Vec<Ty>, span: &Span) -> Result<Ty, Error> {
        self.builtin(name, args)
            .ok_or_else(|| Error::at(ErrorCode::S005, span, format!("unknown type `{name}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0)
    }

    fn stored(name: &str, ty: Ty, m: Mutability) -> Member {
        Member { name: name.into(), kind: MemberKind::Stored, ty, mutability: m, span: span() }
    }

    /// `struct Int {}`, `struct Point { let x: Int }`, `struct Box<T> { var item: T }`
    fn table() -> SymbolTable {
        let mut t = SymbolTable::new();
        let int = t.declare("Int", DeclKind::Struct, &[], span()).unwrap();
        let point = t.declare("Point", DeclKind::Struct, &[], span()).unwrap();
        let bx = t.declare("Box", DeclKind::Struct, &["T".into()], span()).unwrap();
        let int_ty = Ty::nominal(int, "Int", vec![]);
        t.decl_mut(point).members.push(stored("x", int_ty, Mutability::ReadOnly));
        let param = t.decl(bx).generics[0].ty();
        t.decl_mut(bx).members.push(stored("item", param, Mutability::ReadWrite));
        for id in [int, point, bx] {
            let own = t.decl(id).declared_ty();
            t.decl_mut(id).linearization = vec![own];
        }
        t
    }

    #[test]
    fn redeclaration_is_rejected() {
        let mut t = table();
        assert!(t.declare("Point", DeclKind::Class, &[], span()).is_none());
    }

    #[test]
    fn lookup_finds_own_properties_only() {
        let t = table();
        let point = t.decl_by_name("Point").unwrap().declared_ty();
        assert!(t.lookup(&point, "x").is_some());
        assert!(t.lookup(&point, "y").is_none());
        assert!(t.lookup(&Ty::Error, "x").is_none());
    }

    #[test]
    fn member_ty_is_instantiated_per_level() {
        let t = table();
        let point = t.decl_by_name("Point").unwrap().declared_ty();
        let int = t.decl_by_name("Int").unwrap().declared_ty();
        let box_point = t.builtin("Box", vec![point.clone()]).unwrap();
        let box_int = t.builtin("Box", vec![int.clone()]).unwrap();
        let item = t.lookup(&box_point, "item").unwrap();
        assert_eq!(t.member_ty(&box_point, item), point);
        assert_eq!(t.member_ty(&box_int, item), int);
        assert_eq!(t.linearize(&box_int), vec![box_int.clone()]);
    }

    #[test]
    fn resolve_type_expr_errors() {
        let t = table();
        let env = FxHashMap::default();
        let unknown = TypeExpr::named("Nope", span());
        assert_eq!(t.resolve_type_expr(&unknown, &env).unwrap_err().code, ErrorCode::S005);

        let wrong_arity = TypeExpr::Named { name: "Box".into(), args: vec![], span: span() };
        assert_eq!(t.resolve_type_expr(&wrong_arity, &env).unwrap_err().code, ErrorCode::S006);

        let kp = TypeExpr::Named { name: "KeyPath".into(), args: vec![TypeExpr::named("Point", span())], span: span() };
        assert_eq!(t.resolve_type_expr(&kp, &env).unwrap_err().code, ErrorCode::S006);

        // no prelude loaded here, so `[Int]` has nothing to desugar to
        let arr = TypeExpr::Array(Box::new(TypeExpr::named("Int", span())), span());
        assert_eq!(t.resolve_type_expr(&arr, &env).unwrap_err().code, ErrorCode::S005);
    }

    #[test]
    fn resolve_key_path_type() {
        let t = table();
        let kp = TypeExpr::Named {
            name: "WritableKeyPath".into(),
            args: vec![TypeExpr::named("Point", span()), TypeExpr::named("Int", span())],
            span: span(),
        };
        let ty = t.resolve_type_expr(&kp, &FxHashMap::default()).unwrap();
        assert_eq!(ty.to_string(), "WritableKeyPath<Point, Int>");
    }
}
