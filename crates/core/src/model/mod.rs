//! Leaf data model: symbols, their flags, and the arena that owns them.
//!
//! Symbols are pushed into a [`SymbolTableBuilder`] by the symbol extractor,
//! annotated, and then frozen into an immutable, shareable [`SymbolTable`].
//! Alias groups (symbols occupying the same bytes, e.g. after identical code
//! folding) are arena entries referenced by handle from each member.

pub mod symbol;
pub mod table;

pub use symbol::{section_name_for, BaseSymbol, Symbol, SymbolFlags};
pub use table::{AliasGroupId, RawSymbol, SymbolId, SymbolTable, SymbolTableBuilder};
