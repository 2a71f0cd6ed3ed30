pub mod syntax;
pub mod types;
pub mod analysis;
pub mod error;
pub mod prelude;

pub use error::{Error, ErrorCode, LookupError};
pub use syntax::token::{Token, TokenKind};
pub use types::Ty;
pub use analysis::SymbolTable;
pub use analysis::typed::{TypedExpr, TypedItem, TypedStmt};

use analysis::resolve;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which `subscript(dynamicMember:)` shape a plain read prefers when both a
/// read-only and a writable key path subscript apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    /// `KeyPath` first, then `WritableKeyPath`, then `String`.
    #[default]
    ReadOnlyFirst,
    /// `WritableKeyPath` first, as the more specific overload.
    MostSpecific,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub read_preference: ReadPreference,
    /// Include the standard declarations (`Int`, `Array`, `Dictionary`, ...).
    pub prelude: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { read_preference: ReadPreference::default(), prelude: true }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_preference(mut self, preference: ReadPreference) -> Self {
        self.read_preference = preference;
        self
    }

    pub fn prelude(mut self, enabled: bool) -> Self {
        self.prelude = enabled;
        self
    }
}

// ─── Public API types ─────────────────────────────────────────────────────────

/// A checked program. Produced by `compile`.
pub struct Program {
    symbols: SymbolTable,
    items: Vec<TypedItem>,
    warnings: Vec<Error>,
}

impl Program {
    /// The frozen symbol table, prelude declarations included.
    pub fn symbols(&self) -> &SymbolTable { &self.symbols }

    /// Top-level functions and statements in source order, fully typed.
    pub fn items(&self) -> &[TypedItem] { &self.items }

    pub fn warnings(&self) -> &[Error] { &self.warnings }

    /// One line per top-level statement (functions span several).
    pub fn dump(&self) -> String {
        self.items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("\n")
    }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Parse and check source text with default options.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    compile_with(source, &CompileOptions::default())
}

/// Parse and check source text.
pub fn compile_with(source: &str, options: &CompileOptions) -> Result<Program, Vec<Error>> {
    let ast = parse(source)?;
    let prelude = if options.prelude { Some(parse(prelude::SOURCE)?) } else { None };
    let result = resolve(&ast, prelude.as_ref(), options.read_preference)?;
    Ok(Program { symbols: result.symbol_table, items: result.items, warnings: result.warnings })
}

fn parse(source: &str) -> Result<syntax::ast::Program, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    syntax::parser::Parser::new(tokens).parse()
}
