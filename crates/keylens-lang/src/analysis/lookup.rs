//! Member access resolution.
//!
//! Every `base.member` and `base[index]` the checker sees goes through the
//! `LookupResolver`:
//! 1. The base must be a nominal type
//! 2. A property declared directly on the base is returned without further work
//! 3. Everything else is handed to the `OverloadResolver`, which walks the
//!    ancestor chain and falls back to `subscript(dynamicMember:)` candidates
//!
//! It also resolves the individual steps of key path literals.

use crate::ReadPreference;
use crate::error::LookupError;
use crate::types::{Mutability, Ty};
use super::keypath::{KeyPath, KeyPathStep, StepKind};
use super::overload::{DynamicMemberCandidate, OverloadResolver, Request};
use super::symbols::{MemberKind, MemberRef, SymbolTable};

// ─── Access context ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Plain read.
    Read,
    /// Intermediate component of an assignment target (read-modify-write).
    Modify,
    /// Final component of an assignment target.
    Assign,
}

impl AccessKind {
    pub fn is_mutation(self) -> bool {
        !matches!(self, AccessKind::Read)
    }
}

// ─── Resolution ───────────────────────────────────────────────────────────────

/// An explicitly declared property or subscript.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    /// The instantiated level that declares the member.
    pub owner: Ty,
    pub member: MemberRef,
    pub name: String,
    pub kind: StepKind,
    /// Member type with every generic parameter substituted.
    pub ty: Ty,
    pub mutability: Mutability,
}

impl ResolvedMember {
    /// Property `member` as seen from the instantiated `owner`.
    pub fn property(table: &SymbolTable, owner: Ty, member: MemberRef) -> Self {
        let m = table.member(member);
        let kind = match m.kind {
            MemberKind::Computed => StepKind::ComputedProperty,
            _ => StepKind::StoredProperty,
        };
        Self {
            ty: table.member_ty(&owner, member),
            name: m.name.clone(),
            mutability: m.mutability,
            kind,
            member,
            owner,
        }
    }

    /// The key path step applying this member to `base`.
    pub fn to_step(&self, base: &Ty) -> KeyPathStep {
        KeyPathStep {
            base: base.clone(),
            declared_in: self.owner.clone(),
            member: self.member,
            name: self.name.clone(),
            kind: self.kind.clone(),
            value: self.ty.clone(),
            mutability: self.mutability,
        }
    }
}

/// What a `subscript(dynamicMember:)` call is given.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicMemberArg {
    KeyPath(KeyPath),
    /// The member name, for `String`-keyed subscripts.
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedCall {
    pub candidate: DynamicMemberCandidate,
    pub argument: DynamicMemberArg,
    /// Bound values of the subscript's own generic parameters, in order.
    pub substitutions: Vec<Ty>,
    pub result: Ty,
}

impl SynthesizedCall {
    /// This call as a key path step on `base`: a subscript step whose index
    /// is the dynamic member argument.
    pub fn to_step(&self, table: &SymbolTable, base: &Ty) -> KeyPathStep {
        let index = match &self.argument {
            DynamicMemberArg::KeyPath(path) => path.ty(),
            DynamicMemberArg::Name(_) => table.member(self.candidate.subscript).subscript()
                .and_then(|s| s.dynamic_member_param())
                .cloned()
                .unwrap_or(Ty::Error),
        };
        KeyPathStep {
            base: base.clone(),
            declared_in: self.candidate.level.clone(),
            member: self.candidate.subscript,
            name: "subscript(dynamicMember:)".into(),
            kind: StepKind::Subscript { index },
            value: self.result.clone(),
            mutability: if self.candidate.has_setter { Mutability::ReadWrite } else { Mutability::ReadOnly },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Direct(ResolvedMember),
    Synthesized(SynthesizedCall),
}

impl Resolution {
    pub fn ty(&self) -> &Ty {
        match self {
            Resolution::Direct(m)      => &m.ty,
            Resolution::Synthesized(c) => &c.result,
        }
    }

    /// Whether the resolved access can be written through.
    pub fn mutability(&self) -> Mutability {
        match self {
            Resolution::Direct(m) => m.mutability,
            Resolution::Synthesized(c) if c.candidate.has_setter => Mutability::ReadWrite,
            Resolution::Synthesized(_) => Mutability::ReadOnly,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Resolution::Synthesized(_))
    }
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

pub struct LookupResolver<'a> {
    table: &'a SymbolTable,
    overloads: OverloadResolver<'a>,
}

impl<'a> LookupResolver<'a> {
    pub fn new(table: &'a SymbolTable, preference: ReadPreference) -> Self {
        Self { table, overloads: OverloadResolver::new(table, preference) }
    }

    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// Resolve `base.name`.
    #[tracing::instrument(level = "debug", skip(self, base), fields(base = %base))]
    pub fn resolve_member(&self, base: &Ty, name: &str, access: AccessKind) -> Result<Resolution, LookupError> {
        self.expect_nominal(base, Request::Member(name))?;

        if let Some(r) = self.table.lookup(base, name) {
            tracing::trace!("declared on the base type");
            return Ok(Resolution::Direct(ResolvedMember::property(self.table, base.clone(), r)));
        }

        let resolution = self.overloads.resolve_candidates(base, Request::Member(name), access)?;
        tracing::debug!(synthesized = resolution.is_synthesized(), ty = %resolution.ty(), "resolved");
        Ok(resolution)
    }

    /// Resolve `base[index]` where `index` is the index expression's type.
    #[tracing::instrument(level = "debug", skip(self, base, index), fields(base = %base, index = %index))]
    pub fn resolve_subscript(&self, base: &Ty, index: &Ty, access: AccessKind) -> Result<Resolution, LookupError> {
        self.expect_nominal(base, Request::Subscript(index))?;

        let resolution = self.overloads.resolve_candidates(base, Request::Subscript(index), access)?;
        tracing::debug!(synthesized = resolution.is_synthesized(), ty = %resolution.ty(), "resolved");
        Ok(resolution)
    }

    /// `.name` applied to `base` inside a key path literal.
    pub fn property_step(&self, base: &Ty, name: &str) -> Result<KeyPathStep, LookupError> {
        self.step(base, Request::Member(name))
    }

    /// `[index]` applied to `base` inside a key path literal.
    pub fn subscript_step(&self, base: &Ty, index: &Ty) -> Result<KeyPathStep, LookupError> {
        self.step(base, Request::Subscript(index))
    }

    fn step(&self, base: &Ty, request: Request<'_>) -> Result<KeyPathStep, LookupError> {
        self.expect_nominal(base, request)?;
        self.overloads.component_step(base, request, AccessKind::Read)?.ok_or_else(|| LookupError::NoViableCandidate {
            base: base.clone(),
            member: request.describe(),
            reason: Some("no declared or dynamic member forms a key path component".into()),
        })
    }

    fn expect_nominal(&self, base: &Ty, request: Request<'_>) -> Result<(), LookupError> {
        match base {
            Ty::Nominal { .. } => Ok(()),
            _ => Err(LookupError::NoViableCandidate {
                base: base.clone(),
                member: request.describe(),
                reason: Some("only struct and class types have members".into()),
            }),
        }
    }
}
