//! Snapshot containers: all size information for one binary, and the diff of two.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::diff::{diff_with, NameMatcher, SymbolMatcher};
use crate::error::SizeResult;
use crate::group::SymbolGroup;
use crate::metadata::Metadata;
use crate::model::{RawSymbol, SymbolTableBuilder};

/// Snapshot facts as handed over by the symbol extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Section name -> total size in bytes.
    #[serde(default)]
    pub section_sizes: BTreeMap<String, i64>,
    #[serde(default)]
    pub symbols: Vec<RawSymbol>,
    /// Alias groups, each given as positions into `symbols`.
    #[serde(default)]
    pub alias_groups: Vec<Vec<usize>>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// All size information for a single binary.
///
/// `symbols` is the clustered default view of `raw_symbols`; it is computed
/// on first access and may be replaced to show custom groupings while still
/// reporting metadata and section sizes.
#[derive(Debug)]
pub struct SizeInfo {
    /// Section name -> size, e.g. `{".text": 0}`.
    pub section_sizes: BTreeMap<String, i64>,
    /// All top-level symbols, ungrouped.
    pub raw_symbols: SymbolGroup,
    pub metadata: Metadata,
    symbols: OnceCell<SymbolGroup>,
}

impl SizeInfo {
    pub fn new(
        section_sizes: BTreeMap<String, i64>,
        raw_symbols: SymbolGroup,
        metadata: Metadata,
    ) -> Self {
        Self { section_sizes, raw_symbols, metadata, symbols: OnceCell::new() }
    }

    /// Builds the symbol table, alias groups included, from extractor output.
    pub fn from_raw(raw: RawSnapshot) -> SizeResult<Self> {
        let mut builder = SymbolTableBuilder::new();
        for symbol in raw.symbols {
            builder.push(symbol)?;
        }
        for positions in &raw.alias_groups {
            let members =
                positions.iter().map(|pos| builder.id_at(*pos)).collect::<SizeResult<Vec<_>>>()?;
            builder.add_alias_group(&members)?;
        }
        let raw_symbols = SymbolGroup::from_table(builder.freeze());
        Ok(Self::new(raw.section_sizes, raw_symbols, raw.metadata))
    }

    /// The clustered default view, computed once.
    pub fn symbols(&self) -> &SymbolGroup {
        self.symbols.get_or_init(|| self.raw_symbols.clustered())
    }

    /// Replaces the default view.
    pub fn set_symbols(&mut self, symbols: SymbolGroup) {
        self.symbols = OnceCell::with_value(symbols);
    }
}

/// What you get when diffing two [`SizeInfo`]s.
#[derive(Debug)]
pub struct SizeInfoDiff {
    /// Section name -> size delta, over the union of both sides' sections.
    pub section_sizes: BTreeMap<String, i64>,
    /// Diff of the raw symbol lists.
    pub raw_symbols: SymbolGroup,
    pub before_metadata: Metadata,
    pub after_metadata: Metadata,
    symbols: OnceCell<SymbolGroup>,
}

impl SizeInfoDiff {
    pub fn new(before: &SizeInfo, after: &SizeInfo) -> SizeResult<Self> {
        Self::with_matcher(before, after, &NameMatcher)
    }

    pub fn with_matcher(
        before: &SizeInfo,
        after: &SizeInfo,
        matcher: &dyn SymbolMatcher,
    ) -> SizeResult<Self> {
        let mut section_sizes = BTreeMap::new();
        for name in before.section_sizes.keys().chain(after.section_sizes.keys()) {
            let old = before.section_sizes.get(name).copied().unwrap_or(0);
            let new = after.section_sizes.get(name).copied().unwrap_or(0);
            section_sizes.insert(name.clone(), new - old);
        }
        let raw_symbols = diff_with(&before.raw_symbols, &after.raw_symbols, matcher)?;
        Ok(Self {
            section_sizes,
            raw_symbols,
            before_metadata: before.metadata.clone(),
            after_metadata: after.metadata.clone(),
            symbols: OnceCell::new(),
        })
    }

    /// The clustered diff view, computed once.
    pub fn symbols(&self) -> &SymbolGroup {
        self.symbols.get_or_init(|| self.raw_symbols.clustered())
    }

    pub fn set_symbols(&mut self, symbols: SymbolGroup) {
        self.symbols = OnceCell::with_value(symbols);
    }
}
