pub mod symbols;
pub mod scope;
pub mod collector;
pub mod keypath;
pub mod overload;
pub mod lookup;
pub mod synth;
pub mod typed;
pub mod checker;
pub mod validator;


use crate::ReadPreference;
use crate::syntax::ast;
use crate::error::Error;
use collector::Collector;
use checker::TypeResolver;
use validator::Validator;
pub use symbols::SymbolTable;
pub use typed::TypedItem;

// ─── Result ───────────────────────────────────────────────────────────────────

pub struct ResolveResult {
    pub symbol_table: SymbolTable,
    pub items: Vec<TypedItem>,
    pub warnings: Vec<Error>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Full resolver pipeline:
/// 1. Collector: build and freeze the symbol table from all declarations
/// 2. TypeResolver: type every statement, resolve every member access
/// 3. Validator: declaration-level `@dynamicMemberLookup` checks
///
/// `prelude`, when given, is collected before `program`.
/// Returns `Ok(ResolveResult)` if there are no errors, `Err(errors)` otherwise.
pub fn resolve(
    program: &ast::Program,
    prelude: Option<&ast::Program>,
    preference: ReadPreference,
) -> Result<ResolveResult, Vec<Error>> {
    let mut all_errors: Vec<Error> = Vec::new();

    // ── Pass 1: collect declarations ──────────────────────────────────────────
    let mut inputs = Vec::with_capacity(2);
    inputs.extend(prelude);
    inputs.push(program);
    let (table, collect_errors) = Collector::new().collect(&inputs);
    all_errors.extend(collect_errors);

    // ── Pass 2: type checking and member resolution ───────────────────────────
    let (items, type_errors) = TypeResolver::new(&table, preference).run(program);
    all_errors.extend(type_errors);

    // ── Pass 3: declaration validation ────────────────────────────────────────
    let validate_errors = Validator::new(&table).validate();
    all_errors.extend(validate_errors);

    // ─────────────────────────────────────────────────────────────────────────
    let (errors, warnings): (Vec<_>, Vec<_>) = all_errors
        .into_iter()
        .partition(|e| e.code.is_error());

    if errors.is_empty() {
        Ok(ResolveResult { symbol_table: table, items, warnings })
    } else {
        Err(errors)
    }
}
