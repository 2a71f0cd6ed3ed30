//! Generic substitution.
//!
//! A `SubstitutionMap` is the explicit environment binding generic parameter
//! ids to concrete types. Every lookup threads one through; nothing is bound
//! implicitly.

use rustc_hash::FxHashMap;

use super::{GenericParamId, Ty};

/// Map from generic parameter id to the type bound to it.
pub type SubstitutionMap = FxHashMap<GenericParamId, Ty>;

/// Build a map binding `params` positionally to `args`.
/// Callers check arity; extra entries on either side are ignored.
pub fn build_substitution_map(params: &[GenericParamId], args: &[Ty]) -> SubstitutionMap {
    params.iter().copied().zip(args.iter().cloned()).collect()
}

/// Replace every bound parameter in `ty`. Unbound parameters are left in place.
pub fn substitute(ty: &Ty, map: &SubstitutionMap) -> Ty {
    if map.is_empty() {
        return ty.clone();
    }
    match ty {
        Ty::Param { id, .. } => map.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Ty::Nominal { id, name, args } => Ty::Nominal {
            id: *id,
            name: name.clone(),
            args: args.iter().map(|a| substitute(a, map)).collect(),
        },
        Ty::KeyPath { kind, root, value } => Ty::KeyPath {
            kind: *kind,
            root: Box::new(substitute(root, map)),
            value: Box::new(substitute(value, map)),
        },
        Ty::Error => Ty::Error,
    }
}

/// Structurally match `pattern` against the concrete `actual`, binding any
/// parameter listed in `bindable`. Returns `false` on a structural mismatch
/// or a conflicting binding. Parameters not in `bindable` must already equal
/// `actual` exactly.
pub fn bind(pattern: &Ty, actual: &Ty, bindable: &[GenericParamId], map: &mut SubstitutionMap) -> bool {
    match (pattern, actual) {
        (Ty::Param { id, .. }, _) if bindable.contains(id) => match map.get(id) {
            Some(bound) => bound == actual,
            None => {
                map.insert(*id, actual.clone());
                true
            }
        },
        (
            Ty::Nominal { id: a, args: pa, .. },
            Ty::Nominal { id: b, args: qa, .. },
        ) => {
            a == b
                && pa.len() == qa.len()
                && pa.iter().zip(qa).all(|(p, q)| bind(p, q, bindable, map))
        }
        (
            Ty::KeyPath { kind: k1, root: r1, value: v1 },
            Ty::KeyPath { kind: k2, root: r2, value: v2 },
        ) => k1 == k2 && bind(r1, r2, bindable, map) && bind(v1, v2, bindable, map),
        _ => pattern == actual,
    }
}
