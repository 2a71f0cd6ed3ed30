//! Accessor synthesis: turns a `Resolution` into a typed access node.
//! Never re-runs resolution.

use super::keypath::StepKind;
use super::lookup::{AccessKind, Resolution};
use super::typed::{Accessor, TypedExpr};

/// The accessor a component uses in the given access context.
pub fn accessor_for(access: AccessKind) -> Accessor {
    match access {
        AccessKind::Read   => Accessor::Get,
        AccessKind::Modify => Accessor::Modify,
        AccessKind::Assign => Accessor::Set,
    }
}

/// Build the node for `base.member` (`index` is `None`) or `base[index]`.
pub fn synthesize(
    base: TypedExpr,
    index: Option<TypedExpr>,
    resolution: Resolution,
    accessor: Accessor,
) -> TypedExpr {
    let base = Box::new(base);
    match resolution {
        Resolution::Direct(member) => {
            let is_subscript = matches!(member.kind, StepKind::Subscript { .. });
            match (is_subscript, index) {
                (true, Some(index)) => TypedExpr::Subscript { base, index: Box::new(index), member, accessor },
                (true, None) => unreachable!("declared subscript `{}` resolved for a member access", member.name),
                (false, _) => TypedExpr::Member { base, member, accessor },
            }
        }
        Resolution::Synthesized(call) => TypedExpr::DynamicMember {
            base,
            call,
            captures: index.into_iter().collect(),
            accessor,
        },
    }
}
