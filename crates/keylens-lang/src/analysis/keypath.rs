//! Key path construction.
//!
//! A `KeyPath` is a root type plus a non-empty chain of steps, each applying
//! one property or subscript to the previous step's value. Paths are built
//! one step at a time and never reordered.

use std::fmt;

use crate::error::LookupError;
use crate::types::{KeyPathKind, Mutability, Ty};
use super::symbols::MemberRef;

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    StoredProperty,
    ComputedProperty,
    /// A regular subscript applied to a captured index of type `index`.
    Subscript { index: Ty },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPathStep {
    /// The type the step is applied to.
    pub base: Ty,
    /// The ancestor level that declares the member (equal to `base` unless inherited).
    pub declared_in: Ty,
    pub member: MemberRef,
    pub name: String,
    pub kind: StepKind,
    pub value: Ty,
    pub mutability: Mutability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPath {
    root: Ty,
    steps: Vec<KeyPathStep>,
    kind: KeyPathKind,
}

impl KeyPath {
    /// Single-step path rooted at `root`.
    pub fn build(root: Ty, step: KeyPathStep) -> Result<KeyPath, LookupError> {
        if step.base != root {
            return Err(LookupError::TypeMismatch { expected: root, found: step.base });
        }
        let kind = KeyPathKind::from_mutability(step.mutability);
        Ok(KeyPath { root, steps: vec![step], kind })
    }

    /// Append `step`; its base must be the current leaf type.
    pub fn extend(&self, step: KeyPathStep) -> Result<KeyPath, LookupError> {
        if &step.base != self.leaf() {
            return Err(LookupError::TypeMismatch { expected: self.leaf().clone(), found: step.base });
        }
        let mut steps = self.steps.clone();
        steps.push(step);
        let kind = KeyPathKind::from_mutability(mutability_of(&steps));
        Ok(KeyPath { root: self.root.clone(), steps, kind })
    }

    /// The same path typed as a read-only `KeyPath`. A writable path can
    /// always be passed where a read-only one is expected.
    pub fn as_read_only(&self) -> KeyPath {
        KeyPath { kind: KeyPathKind::ReadOnly, ..self.clone() }
    }

    pub fn root(&self) -> &Ty {
        &self.root
    }

    pub fn steps(&self) -> &[KeyPathStep] {
        &self.steps
    }

    /// Value type of the last step.
    pub fn leaf(&self) -> &Ty {
        // steps is never empty: build() creates one and extend() only appends
        &self.steps[self.steps.len() - 1].value
    }

    /// Read-write only if every step is read-write.
    pub fn mutability(&self) -> Mutability {
        mutability_of(&self.steps)
    }

    pub fn kind(&self) -> KeyPathKind {
        self.kind
    }

    /// `KeyPath<Root, Leaf>` or `WritableKeyPath<Root, Leaf>`.
    pub fn ty(&self) -> Ty {
        Ty::key_path(self.kind, self.root.clone(), self.leaf().clone())
    }
}

fn mutability_of(steps: &[KeyPathStep]) -> Mutability {
    steps.iter().fold(Mutability::ReadWrite, |acc, s| acc.and(s.mutability))
}

/// `keypath $KeyPath<Point3D, Int>, (root $Point3D; stored_property #Point3D.z : $Int)`
impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keypath ${}, (root ${}", self.ty(), self.root)?;
        for step in &self.steps {
            let owner = match &step.declared_in {
                Ty::Nominal { name, .. } => name.as_str(),
                _ => "?",
            };
            match step.kind {
                StepKind::StoredProperty => {
                    write!(f, "; stored_property #{owner}.{} : ${}", step.name, step.value)?;
                }
                StepKind::ComputedProperty | StepKind::Subscript { .. } => {
                    let accessor = if step.mutability.is_writable() { "settable_property" } else { "gettable_property" };
                    write!(f, "; {accessor} ${},  id #{owner}.{}", step.value, step.name)?;
                }
            }
        }
        write!(f, ")")
    }
}
