use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SizeError, SizeResult};
use crate::model::symbol::{BaseSymbol, PssDelta, Symbol, SymbolFlags};

/// Arena index of a symbol inside its [`SymbolTable`].
///
/// Two nodes are "the same symbol" exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for SymbolId {
    type Error = SizeError;

    /// Fails once the arena outgrows 32-bit handles.
    fn try_from(index: usize) -> SizeResult<Self> {
        u32::try_from(index).map(SymbolId).map_err(|_| SizeError::TableFull(index))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Handle of an alias group inside its [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliasGroupId(pub(crate) u32);

/// Symbol facts as handed over by the symbol extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymbol {
    pub section_name: String,
    /// Size in bytes, including `padding`.
    pub size: i64,
    #[serde(default)]
    pub padding: i64,
    #[serde(default)]
    pub address: u64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub template_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub object_path: String,
    /// Raw flag bits; unknown bits are dropped.
    #[serde(default)]
    pub flags: u32,
}

impl RawSymbol {
    pub fn new(section_name: impl Into<String>, size: i64) -> Self {
        Self { section_name: section_name.into(), size, ..Default::default() }
    }

    /// Builder-style helper setting all three names to `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.full_name = name.clone();
        self.template_name = name.clone();
        self.name = name;
        self
    }

    pub fn at(mut self, address: u64) -> Self {
        self.address = address;
        self
    }

    pub fn with_padding(mut self, padding: i64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_paths(
        mut self,
        source_path: impl Into<String>,
        object_path: impl Into<String>,
    ) -> Self {
        self.source_path = source_path.into();
        self.object_path = object_path.into();
        self
    }

    pub fn with_flags(mut self, flags: SymbolFlags) -> Self {
        self.flags = flags.bits();
        self
    }

    /// Copies the facts of an existing symbol, dropping its identity and aliases.
    pub fn from_symbol(symbol: &Symbol) -> Self {
        Self {
            section_name: symbol.section_name().to_string(),
            size: symbol.size(),
            padding: symbol.padding(),
            address: symbol.address(),
            full_name: symbol.full_name().to_string(),
            template_name: symbol.template_name().to_string(),
            name: symbol.name().to_string(),
            source_path: symbol.source_path().to_string(),
            object_path: symbol.object_path().to_string(),
            flags: symbol.flags().bits(),
        }
    }
}

/// Frozen arena owning every symbol and alias group of one snapshot.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    alias_groups: Vec<Vec<SymbolId>>,
}

impl SymbolTable {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// Ids are only minted by the builder of this table, so indexing is in bounds.
    pub(crate) fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.iter().map(|s| s.id)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Members of an alias group, in declaration order.
    pub fn alias_group(&self, id: AliasGroupId) -> &[SymbolId] {
        self.alias_groups.get(id.0 as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols sharing the address of `id`, including `id` itself.
    pub fn aliases_of(&self, id: SymbolId) -> Vec<&Symbol> {
        match self.get(id) {
            Some(symbol) => match symbol.aliases {
                Some(group) => self.alias_group(group).iter().map(|m| self.symbol(*m)).collect(),
                None => vec![symbol],
            },
            None => Vec::new(),
        }
    }

    pub fn alias_group_count(&self) -> usize {
        self.alias_groups.len()
    }
}

/// Mutable staging area used by the symbol extractor and annotation passes.
///
/// All mutation (alias declarations, the `generated_source` bit) happens here;
/// [`SymbolTableBuilder::freeze`] hands out the immutable table.
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    symbols: Vec<Symbol>,
    alias_groups: Vec<Vec<SymbolId>>,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn push(&mut self, raw: RawSymbol) -> SizeResult<SymbolId> {
        let id = SymbolId::try_from(self.symbols.len())?;
        self.symbols.push(Symbol {
            id,
            address: raw.address,
            size: raw.size,
            padding: raw.padding,
            section_name: raw.section_name,
            full_name: raw.full_name,
            template_name: raw.template_name,
            name: raw.name,
            source_path: raw.source_path,
            object_path: raw.object_path,
            flags: SymbolFlags::from_bits_truncate(raw.flags),
            aliases: None,
            num_aliases: 1,
            pss_delta: None,
        });
        Ok(id)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// Resolves a position in the pushed sequence to its id.
    pub fn id_at(&self, index: usize) -> SizeResult<SymbolId> {
        self.symbols.get(index).map(|s| s.id).ok_or(SizeError::UnknownSymbol(index))
    }

    /// Declares that `members` occupy the same bytes.
    ///
    /// Members must share one address, number at least two, and not already
    /// belong to another alias group.
    pub fn add_alias_group(&mut self, members: &[SymbolId]) -> SizeResult<AliasGroupId> {
        if members.len() < 2 {
            return Err(SizeError::AliasGroup(format!(
                "needs at least 2 members, got {}",
                members.len()
            )));
        }
        let mut address = None;
        for (pos, id) in members.iter().enumerate() {
            let symbol = self.symbol(*id).ok_or(SizeError::UnknownSymbol(id.index()))?;
            if symbol.aliases.is_some() {
                return Err(SizeError::AliasGroup(format!("{:?} is already aliased", symbol)));
            }
            if members[..pos].contains(id) {
                return Err(SizeError::AliasGroup(format!("{:?} listed twice", symbol)));
            }
            match address {
                None => address = Some(symbol.address),
                Some(expected) if expected != symbol.address => {
                    return Err(SizeError::AliasGroup(format!(
                        "address {:#x} does not match {:#x}",
                        symbol.address, expected
                    )));
                }
                Some(_) => {}
            }
        }

        let count = self.alias_groups.len();
        let group = u32::try_from(count)
            .map(AliasGroupId)
            .map_err(|_| SizeError::TableFull(count))?;
        for id in members {
            let symbol = &mut self.symbols[id.index()];
            symbol.aliases = Some(group);
            symbol.num_aliases = members.len();
        }
        self.alias_groups.push(members.to_vec());
        Ok(group)
    }

    /// Annotation pass hook: marks or clears the generated-source bit.
    pub fn set_generated_source(&mut self, id: SymbolId, value: bool) -> SizeResult<()> {
        let symbol =
            self.symbols.get_mut(id.index()).ok_or(SizeError::UnknownSymbol(id.index()))?;
        symbol.flags.set(SymbolFlags::GENERATED_SOURCE, value);
        Ok(())
    }

    /// Replaces the derived `pss` of a delta symbol with explicit values.
    pub(crate) fn set_pss_delta(
        &mut self,
        id: SymbolId,
        pss: f64,
        pss_without_padding: f64,
    ) -> SizeResult<()> {
        let symbol =
            self.symbols.get_mut(id.index()).ok_or(SizeError::UnknownSymbol(id.index()))?;
        symbol.pss_delta = Some(PssDelta { pss, pss_without_padding });
        Ok(())
    }

    pub fn freeze(self) -> Arc<SymbolTable> {
        log::debug!(
            "Freezing symbol table: {} symbols, {} alias groups",
            self.symbols.len(),
            self.alias_groups.len()
        );
        Arc::new(SymbolTable { symbols: self.symbols, alias_groups: self.alias_groups })
    }
}
