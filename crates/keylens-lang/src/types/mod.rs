//! Semantic types shared by the symbol table, the resolvers and the typed tree.
//!
//! `Ty` carries declaration names alongside ids so that diagnostics and IR
//! dumps can print types without a symbol table at hand.

pub mod subst;

use std::fmt;

pub use subst::SubstitutionMap;

// ─── Ids ──────────────────────────────────────────────────────────────────────

/// Index of a nominal type declaration in the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Unique id of a generic parameter. Type-level and subscript-level
/// parameters share one id space, so two `T`s never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericParamId(pub u32);

// ─── Mutability ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    ReadOnly,
    ReadWrite,
}

impl Mutability {
    /// Read-write only when both sides are read-write.
    pub fn and(self, other: Mutability) -> Mutability {
        match (self, other) {
            (Self::ReadWrite, Self::ReadWrite) => Self::ReadWrite,
            _ => Self::ReadOnly,
        }
    }

    pub fn is_writable(self) -> bool {
        self == Self::ReadWrite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPathKind {
    ReadOnly,
    Writable,
}

impl KeyPathKind {
    pub fn from_mutability(m: Mutability) -> Self {
        match m {
            Mutability::ReadOnly  => Self::ReadOnly,
            Mutability::ReadWrite => Self::Writable,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "KeyPath",
            Self::Writable => "WritableKeyPath",
        }
    }
}

// ─── Ty ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A declared struct or class, possibly instantiated: `Lens<Rectangle>`.
    Nominal { id: DeclId, name: String, args: Vec<Ty> },
    /// A generic parameter that has not been substituted yet.
    Param { id: GenericParamId, name: String },
    /// `KeyPath<Root, Value>` or `WritableKeyPath<Root, Value>`.
    KeyPath { kind: KeyPathKind, root: Box<Ty>, value: Box<Ty> },
    /// Result of a failed expression. Absorbs further errors.
    Error,
}

impl Ty {
    pub fn nominal(id: DeclId, name: impl Into<String>, args: Vec<Ty>) -> Self {
        Ty::Nominal { id, name: name.into(), args }
    }

    pub fn key_path(kind: KeyPathKind, root: Ty, value: Ty) -> Self {
        Ty::KeyPath { kind, root: Box::new(root), value: Box::new(value) }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    pub fn decl_id(&self) -> Option<DeclId> {
        match self {
            Ty::Nominal { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Ty] {
        match self {
            Ty::Nominal { args, .. } => args,
            _ => &[],
        }
    }

    /// True if any generic parameter is still present.
    pub fn has_params(&self) -> bool {
        self.first_param().is_some()
    }

    /// The first unsubstituted generic parameter, depth-first.
    pub fn first_param(&self) -> Option<(GenericParamId, &str)> {
        match self {
            Ty::Param { id, name } => Some((*id, name.as_str())),
            Ty::Nominal { args, .. } => args.iter().find_map(|a| a.first_param()),
            Ty::KeyPath { root, value, .. } => root.first_param().or_else(|| value.first_param()),
            Ty::Error => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Nominal { name, args, .. } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 { write!(f, ", ")?; }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::Param { name, .. } => write!(f, "{name}"),
            Ty::KeyPath { kind, root, value } => write!(f, "{}<{root}, {value}>", kind.name()),
            Ty::Error => write!(f, "<error>"),
        }
    }
}
