//! binsize-core
//!
//! Core data model for binary size analysis.
//!
//! This crate models an already-extracted set of symbol facts for a compiled
//! binary and transforms it: filtering, sorting, grouping, clustering of
//! split symbols, and structural diffs between two snapshots.
//!
//! Parsing binaries, rendering reports, and persisting results are left to
//! the frontends built on top of this crate.

pub mod config;
pub mod diff;
pub mod error;
pub mod group;
pub mod match_util;
pub mod metadata;
pub mod model;
pub mod size_info;

pub use config::PathGrouping;
pub use diff::{DiffCounts, DiffStatus, DiffView};
pub use error::{SizeError, SizeResult};
pub use group::{GroupLabel, NodeId, NodeRef, SymbolGroup};
pub use metadata::Metadata;
pub use model::{
    BaseSymbol, RawSymbol, Symbol, SymbolFlags, SymbolId, SymbolTable, SymbolTableBuilder,
};
pub use size_info::{RawSnapshot, SizeInfo, SizeInfoDiff};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
