//! Pass 3: Semantic Validator
//!
//! Declaration-level checks that need the finished symbol table:
//! - a `@dynamicMemberLookup` type declares or inherits a
//!   `subscript(dynamicMember:)`
//! - a `subscript(dynamicMember:)` sits on a type that is marked
//!   `@dynamicMemberLookup`, directly or through an ancestor

use crate::error::{Error, ErrorCode};
use super::symbols::{SymbolTable, TypeDecl};

pub struct Validator<'a> {
    table: &'a SymbolTable,
    pub errors: Vec<Error>,
}

impl<'a> Validator<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table, errors: Vec::new() }
    }

    pub fn validate(mut self) -> Vec<Error> {
        let table = self.table;
        for decl in table.decls() {
            self.check_attribute_has_subscript(decl);
            self.check_subscript_has_attribute(decl);
        }
        self.errors
    }

    fn check_attribute_has_subscript(&mut self, decl: &TypeDecl) {
        if !decl.dynamic_member_lookup {
            return;
        }
        let provides = chain(self.table, decl).any(|d| d.members.iter().any(|m| m.is_dynamic_member()));
        if !provides {
            self.errors.push(Error::at(
                ErrorCode::S007, &decl.span,
                format!(
                    "`@dynamicMemberLookup` type `{}` must declare or inherit a `subscript(dynamicMember:)`",
                    decl.name,
                ),
            ));
        }
    }

    fn check_subscript_has_attribute(&mut self, decl: &TypeDecl) {
        if chain(self.table, decl).any(|d| d.dynamic_member_lookup) {
            return;
        }
        for m in decl.members.iter().filter(|m| m.is_dynamic_member()) {
            self.errors.push(Error::at(
                ErrorCode::S007, &m.span,
                format!("`subscript(dynamicMember:)` on `{}` requires `@dynamicMemberLookup`", decl.name),
            ));
        }
    }
}

/// `decl` and its ancestors.
fn chain<'t>(table: &'t SymbolTable, decl: &'t TypeDecl) -> impl Iterator<Item = &'t TypeDecl> + 't {
    decl.linearization.iter().filter_map(move |t| table.decl_of(t))
}
