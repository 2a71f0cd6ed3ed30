//! Overload resolution for member and subscript requests.
//!
//! Explicitly declared members always win. Only when no level of the
//! ancestor chain declares one are the `subscript(dynamicMember:)` candidates
//! of the chain collected, checked for applicability, partitioned by shape
//! and ranked.

use crate::ReadPreference;
use crate::error::LookupError;
use crate::prelude;
use crate::types::subst::{bind, substitute};
use crate::types::{KeyPathKind, Ty};
use super::keypath::{KeyPath, KeyPathStep, StepKind};
use super::lookup::{AccessKind, DynamicMemberArg, Resolution, ResolvedMember, SynthesizedCall};
use super::symbols::{MemberRef, SymbolTable};

// ─── Requests and candidates ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Request<'r> {
    /// `base.name`
    Member(&'r str),
    /// `base[index]` with the index expression's type.
    Subscript(&'r Ty),
}

impl Request<'_> {
    pub fn describe(&self) -> String {
        match self {
            Request::Member(name)     => name.to_string(),
            Request::Subscript(index) => format!("subscript({index})"),
        }
    }
}

/// Shape of a `subscript(dynamicMember:)` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateShape {
    KeyPathReadOnly,
    KeyPathWritable,
    PlainName,
}

/// Classify a `dynamicMember` parameter type. `None` if it is not one of
/// `KeyPath`, `WritableKeyPath` or `String`.
pub fn shape_of(table: &SymbolTable, param: &Ty) -> Option<CandidateShape> {
    match param {
        Ty::KeyPath { kind: KeyPathKind::ReadOnly, .. } => Some(CandidateShape::KeyPathReadOnly),
        Ty::KeyPath { kind: KeyPathKind::Writable, .. } => Some(CandidateShape::KeyPathWritable),
        Ty::Nominal { name, args, .. }
            if name == prelude::STRING && args.is_empty() && table.decl_by_name(prelude::STRING).is_some() =>
        {
            Some(CandidateShape::PlainName)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMemberCandidate {
    /// The instantiated ancestor level that declares the subscript.
    pub level: Ty,
    pub subscript: MemberRef,
    pub shape: CandidateShape,
    pub has_setter: bool,
}

impl DynamicMemberCandidate {
    /// `A<Point>.subscript(dynamicMember: KeyPath<Point, U>)`
    pub fn describe(&self, table: &SymbolTable) -> String {
        let param = table.member(self.subscript).subscript()
            .and_then(|s| s.dynamic_member_param())
            .map(|p| substitute(p, &table.substitution_for(&self.level)).to_string())
            .unwrap_or_default();
        format!("{}.subscript(dynamicMember: {param})", self.level)
    }
}

/// A candidate that fits the request, with its argument and bound generics.
struct Applied {
    candidate: DynamicMemberCandidate,
    argument: DynamicMemberArg,
    substitutions: Vec<Ty>,
    result: Result<Ty, LookupError>,
}

impl Applied {
    fn into_call(self) -> Result<SynthesizedCall, LookupError> {
        Ok(SynthesizedCall {
            result: self.result?,
            candidate: self.candidate,
            argument: self.argument,
            substitutions: self.substitutions,
        })
    }
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

pub struct OverloadResolver<'a> {
    table: &'a SymbolTable,
    preference: ReadPreference,
}

impl<'a> OverloadResolver<'a> {
    pub fn new(table: &'a SymbolTable, preference: ReadPreference) -> Self {
        Self { table, preference }
    }

    pub fn resolve_candidates(
        &self,
        base: &Ty,
        request: Request<'_>,
        access: AccessKind,
    ) -> Result<Resolution, LookupError> {
        // 1. explicit members anywhere in the chain
        if let Some(resolved) = self.find_explicit(base, request, access)? {
            return Ok(Resolution::Direct(resolved));
        }
        let mut active = vec![base.clone()];
        self.resolve_dynamic(base, request, access, &mut active).map(Resolution::Synthesized)
    }

    /// Steps 2 to 6 for `base`. `active` holds the roots whose key path
    /// components are being resolved, outermost first.
    fn resolve_dynamic(
        &self,
        base: &Ty,
        request: Request<'_>,
        access: AccessKind,
        active: &mut Vec<Ty>,
    ) -> Result<SynthesizedCall, LookupError> {
        // 2. applicable dynamic member candidates, partitioned by shape
        let mut read_only = Vec::new();
        let mut writable = Vec::new();
        let mut plain = Vec::new();
        for candidate in self.collect_candidates(base) {
            let Some(applied) = self.apply(candidate, request, active)? else { continue };
            match applied.candidate.shape {
                CandidateShape::KeyPathReadOnly => read_only.push(applied),
                CandidateShape::KeyPathWritable => writable.push(applied),
                CandidateShape::PlainName       => plain.push(applied),
            }
        }
        tracing::debug!(
            read_only = read_only.len(),
            writable = writable.len(),
            plain = plain.len(),
            "dynamic member candidates"
        );

        // 3. tie-break by access
        let no_viable = |reason: Option<&str>| LookupError::NoViableCandidate {
            base: base.clone(),
            member: request.describe(),
            reason: reason.map(str::to_string),
        };

        let chosen = if access.is_mutation() {
            let any_writable = !writable.is_empty();
            let settable: Vec<_> = writable.into_iter().filter(|a| a.candidate.has_setter).collect();
            if !settable.is_empty() {
                settable
            } else if any_writable {
                return Err(no_viable(Some("`subscript(dynamicMember:)` is get-only")));
            } else if !read_only.is_empty() {
                return Err(no_viable(Some("it is only reachable through a read-only key path")));
            } else {
                let any_plain = !plain.is_empty();
                let settable: Vec<_> = plain.into_iter().filter(|a| a.candidate.has_setter).collect();
                if settable.is_empty() && any_plain {
                    return Err(no_viable(Some("`subscript(dynamicMember:)` is get-only")));
                }
                settable
            }
        } else {
            let groups = match self.preference {
                ReadPreference::ReadOnlyFirst => [read_only, writable, plain],
                ReadPreference::MostSpecific  => [writable, read_only, plain],
            };
            groups.into_iter().find(|g| !g.is_empty()).unwrap_or_default()
        };

        // 4–6. exactly one survivor wins
        match chosen.len() {
            0 => Err(no_viable(None)),
            1 => {
                let Some(applied) = chosen.into_iter().next() else { return Err(no_viable(None)) };
                tracing::debug!(candidate = %applied.candidate.describe(self.table), "selected dynamic member");
                applied.into_call()
            }
            _ => Err(LookupError::AmbiguousLookup {
                base: base.clone(),
                member: request.describe(),
                candidates: chosen.iter().map(|a| a.candidate.describe(self.table)).collect(),
            }),
        }
    }

    /// Step 1: the first explicitly declared member matching `request`,
    /// most-derived level first.
    pub fn find_explicit(
        &self,
        base: &Ty,
        request: Request<'_>,
        access: AccessKind,
    ) -> Result<Option<ResolvedMember>, LookupError> {
        for level in self.table.linearize(base) {
            tracing::trace!(level = %level, "explicit member walk");
            match request {
                Request::Member(name) => {
                    if let Some(r) = self.table.lookup(&level, name) {
                        return Ok(Some(ResolvedMember::property(self.table, level, r)));
                    }
                }
                Request::Subscript(index) => {
                    if let Some(resolved) = self.match_regular_subscript(&level, index, access)? {
                        return Ok(Some(resolved));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Every `subscript(dynamicMember:)` across the chain, most-derived first.
    pub fn collect_candidates(&self, base: &Ty) -> Vec<DynamicMemberCandidate> {
        let mut out = Vec::new();
        for level in self.table.linearize(base) {
            let Some(decl) = self.table.decl_of(&level) else { continue };
            for (index, member) in decl.members.iter().enumerate() {
                let Some(sig) = member.subscript() else { continue };
                let Some(param) = sig.dynamic_member_param() else { continue };
                let Some(shape) = shape_of(self.table, param) else { continue };
                out.push(DynamicMemberCandidate {
                    level: level.clone(),
                    subscript: MemberRef { decl: decl.id, index },
                    shape,
                    has_setter: sig.has_setter,
                });
            }
        }
        out
    }

    /// The key path step `request` denotes on `root`, through explicit members only.
    pub fn explicit_step(&self, root: &Ty, request: Request<'_>) -> Result<Option<KeyPathStep>, LookupError> {
        Ok(self.find_explicit(root, request, AccessKind::Read)?.map(|r| r.to_step(root)))
    }

    /// The key path step `request` denotes on `root`: a declared member, or
    /// else a subscript step through `root`'s own `subscript(dynamicMember:)`.
    pub fn component_step(
        &self,
        root: &Ty,
        request: Request<'_>,
        access: AccessKind,
    ) -> Result<Option<KeyPathStep>, LookupError> {
        self.nested_step(root, request, access, &mut Vec::new())
    }

    fn nested_step(
        &self,
        root: &Ty,
        request: Request<'_>,
        access: AccessKind,
        active: &mut Vec<Ty>,
    ) -> Result<Option<KeyPathStep>, LookupError> {
        if let Some(step) = self.explicit_step(root, request)? {
            return Ok(Some(step));
        }
        // a root reachable from itself would never bottom out
        if active.contains(root) {
            return Ok(None);
        }
        active.push(root.clone());
        let nested = self.resolve_dynamic(root, request, access, active);
        active.pop();
        match nested {
            Ok(call) => {
                tracing::trace!(root = %root, "key path component through dynamic member");
                Ok(Some(call.to_step(self.table, root)))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::trace!(root = %root, error = %e, "no key path component");
                Ok(None)
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A regular subscript on `level` whose single parameter accepts `index`.
    fn match_regular_subscript(
        &self,
        level: &Ty,
        index: &Ty,
        access: AccessKind,
    ) -> Result<Option<ResolvedMember>, LookupError> {
        let Some(decl) = self.table.decl_of(level) else { return Ok(None) };
        for (i, member) in decl.members.iter().enumerate() {
            let Some(sig) = member.subscript() else { continue };
            if sig.mentions_dynamic_member() || sig.params.len() != 1 {
                continue;
            }
            if access.is_mutation() && !sig.has_setter {
                tracing::trace!(level = %level, "skipping get-only subscript in mutation");
                continue;
            }
            let mut map = self.table.substitution_for(level);
            let pattern = substitute(&sig.params[0].ty, &map);
            if !bind(&pattern, index, &sig.generic_ids(), &mut map) {
                continue;
            }
            let ty = substitute(&member.ty, &map);
            if let Some((_, param)) = ty.first_param() {
                return Err(LookupError::UnresolvableGeneric {
                    param: param.to_string(),
                    context: format!("`{level}` subscript"),
                });
            }
            return Ok(Some(ResolvedMember {
                owner: level.clone(),
                member: MemberRef { decl: decl.id, index: i },
                name: member.name.clone(),
                kind: StepKind::Subscript { index: index.clone() },
                ty,
                mutability: member.mutability,
            }));
        }
        Ok(None)
    }

    /// Check one candidate against the request. `None` when it does not apply.
    fn apply(
        &self,
        candidate: DynamicMemberCandidate,
        request: Request<'_>,
        active: &mut Vec<Ty>,
    ) -> Result<Option<Applied>, LookupError> {
        let member = self.table.member(candidate.subscript);
        let Some(sig) = member.subscript() else { return Ok(None) };
        let Some(param) = sig.dynamic_member_param() else { return Ok(None) };

        let mut map = self.table.substitution_for(&candidate.level);
        let pattern = substitute(param, &map);

        let argument = match (candidate.shape, request) {
            (CandidateShape::PlainName, Request::Member(name)) => DynamicMemberArg::Name(name.to_string()),
            (CandidateShape::PlainName, Request::Subscript(_)) => return Ok(None),
            (shape, _) => {
                let Ty::KeyPath { root, .. } = &pattern else { return Ok(None) };
                // a writable path needs every nested component settable
                let component_access = match shape {
                    CandidateShape::KeyPathWritable => AccessKind::Modify,
                    _ => AccessKind::Read,
                };
                let Some(step) = self.nested_step(root, request, component_access, active)? else { return Ok(None) };
                let path = KeyPath::build((**root).clone(), step)?;
                let path = match shape {
                    CandidateShape::KeyPathWritable if !path.mutability().is_writable() => return Ok(None),
                    CandidateShape::KeyPathWritable => path,
                    _ => path.as_read_only(),
                };
                if !bind(&pattern, &path.ty(), &sig.generic_ids(), &mut map) {
                    return Ok(None);
                }
                DynamicMemberArg::KeyPath(path)
            }
        };

        let substitutions = sig.generics.iter()
            .map(|g| map.get(&g.id).cloned().unwrap_or_else(|| g.ty()))
            .collect();
        let ty = substitute(&member.ty, &map);
        let result = match ty.first_param() {
            Some((_, param)) => Err(LookupError::UnresolvableGeneric {
                param: param.to_string(),
                context: format!("`{}`", candidate.describe(self.table)),
            }),
            None => Ok(ty),
        };

        tracing::trace!(candidate = %candidate.describe(self.table), "applicable");
        Ok(Some(Applied { candidate, argument, substitutions, result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::collector::Collector;
    use crate::syntax::ast::Program;
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;

    const SRC: &str = "
struct Point { let x: Int\n var y: Int }

@dynamicMemberLookup
class Base<T> {
    subscript<U>(dynamicMember member: KeyPath<T, U>) -> U { get }
    subscript(dynamicMember member: String) -> Int { get }
}

class Derived<T>: Base<T> {
    var own: Int
    subscript<U>(dynamicMember member: WritableKeyPath<T, U>) -> U { get set }
}

struct Table {
    subscript(key: String) -> Int { get }
}
";

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn table() -> SymbolTable {
        let prelude = parse(prelude::SOURCE);
        let program = parse(SRC);
        let (table, errors) = Collector::new().collect(&[&prelude, &program]);
        assert!(errors.is_empty(), "{errors:?}");
        table
    }

    fn derived_of_point(table: &SymbolTable) -> Ty {
        let point = table.builtin("Point", vec![]).expect("Point");
        table.builtin("Derived", vec![point]).expect("Derived")
    }

    #[test]
    fn candidates_most_derived_first() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let shapes: Vec<_> = resolver.collect_candidates(&derived_of_point(&table))
            .iter()
            .map(|c| (c.level.to_string(), c.shape))
            .collect();
        assert_eq!(shapes, vec![
            ("Derived<Point>".to_string(), CandidateShape::KeyPathWritable),
            ("Base<Point>".to_string(), CandidateShape::KeyPathReadOnly),
            ("Base<Point>".to_string(), CandidateShape::PlainName),
        ]);
    }

    #[test]
    fn describe_substitutes_level_arguments() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let candidates = resolver.collect_candidates(&derived_of_point(&table));
        assert_eq!(
            candidates[1].describe(&table),
            "Base<Point>.subscript(dynamicMember: KeyPath<Point, U>)",
        );
    }

    #[test]
    fn explicit_member_returns_direct() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let r = resolver.resolve_candidates(&derived_of_point(&table), Request::Member("own"), AccessKind::Read)
            .expect("own");
        assert!(!r.is_synthesized());
    }

    #[test]
    fn read_preference_orders_groups() {
        let table = table();
        let base = derived_of_point(&table);

        let ro = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst)
            .resolve_candidates(&base, Request::Member("y"), AccessKind::Read)
            .expect("y");
        let ws = OverloadResolver::new(&table, ReadPreference::MostSpecific)
            .resolve_candidates(&base, Request::Member("y"), AccessKind::Read)
            .expect("y");
        match (ro, ws) {
            (Resolution::Synthesized(a), Resolution::Synthesized(b)) => {
                assert_eq!(a.candidate.shape, CandidateShape::KeyPathReadOnly);
                assert_eq!(b.candidate.shape, CandidateShape::KeyPathWritable);
            }
            other => panic!("expected two synthesized calls, got {other:?}"),
        }
    }

    #[test]
    fn plain_name_only_without_key_path_candidates() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        match resolver.resolve_candidates(&derived_of_point(&table), Request::Member("zzz"), AccessKind::Read) {
            Ok(Resolution::Synthesized(call)) => {
                assert_eq!(call.argument, DynamicMemberArg::Name("zzz".into()));
                assert_eq!(call.result.to_string(), "Int");
            }
            other => panic!("expected plain-name call, got {other:?}"),
        }
    }

    #[test]
    fn mutation_uses_writable_with_setter() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let base = derived_of_point(&table);

        let y = resolver.resolve_candidates(&base, Request::Member("y"), AccessKind::Assign).expect("y");
        assert_eq!(y.mutability(), crate::types::Mutability::ReadWrite);

        let err = resolver.resolve_candidates(&base, Request::Member("x"), AccessKind::Assign)
            .expect_err("x is read-only");
        assert!(err.to_string().contains("read-only key path"), "{err}");
    }

    #[test]
    fn get_only_subscript_skipped_when_mutating() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let string = table.builtin(prelude::STRING, vec![]).expect("String");
        let t = table.builtin("Table", vec![]).expect("Table");

        let read = resolver.find_explicit(&t, Request::Subscript(&string), AccessKind::Read).expect("lookup");
        assert_eq!(read.map(|m| m.ty.to_string()), Some("Int".to_string()));

        let write = resolver.find_explicit(&t, Request::Subscript(&string), AccessKind::Assign).expect("lookup");
        assert!(write.is_none());
    }

    #[test]
    fn regular_subscript_binds_level_arguments() {
        let table = table();
        let resolver = OverloadResolver::new(&table, ReadPreference::ReadOnlyFirst);
        let string = table.builtin(prelude::STRING, vec![]).expect("String");
        let int = table.builtin(prelude::INT, vec![]).expect("Int");
        let dict = table.builtin(prelude::DICTIONARY, vec![string.clone(), int.clone()]).expect("Dictionary");

        let hit = resolver.find_explicit(&dict, Request::Subscript(&string), AccessKind::Assign).expect("lookup");
        assert_eq!(hit.map(|m| m.ty.to_string()), Some("Optional<Int>".to_string()));

        let miss = resolver.find_explicit(&dict, Request::Subscript(&int), AccessKind::Read).expect("lookup");
        assert!(miss.is_none());
    }

    #[test]
    fn shape_requires_plain_string() {
        let table = table();
        let int = table.builtin(prelude::INT, vec![]).expect("Int");
        let string = table.builtin(prelude::STRING, vec![]).expect("String");
        assert_eq!(shape_of(&table, &string), Some(CandidateShape::PlainName));
        assert_eq!(shape_of(&table, &int), None);
        let kp = Ty::key_path(KeyPathKind::Writable, int.clone(), int);
        assert_eq!(shape_of(&table, &kp), Some(CandidateShape::KeyPathWritable));
    }
}
