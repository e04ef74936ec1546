use std::fmt;

use bitflags::bitflags;

use crate::model::table::{AliasGroupId, SymbolId};

bitflags! {
    /// Per-symbol attribute bits recorded by the symbol extractor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u32 {
        /// Symbol lives in an anonymous namespace (stripped from its names).
        const ANONYMOUS = 1;
        const STARTUP = 2;
        const UNLIKELY = 4;
        const REL = 8;
        const REL_LOCAL = 16;
        /// Symbol comes from a generated source file.
        const GENERATED_SOURCE = 32;
        const CLONE = 64;
    }
}

/// Maps a one-letter section abbreviation to its full section name.
pub fn section_name_for(section: char) -> Option<&'static str> {
    match section {
        'b' => Some(".bss"),
        'd' => Some(".data"),
        'r' => Some(".rodata"),
        't' => Some(".text"),
        _ => None,
    }
}

/// Read API shared by leaf symbols and symbol groups.
///
/// Field meanings:
/// - `address`: start address; may be 0 (e.g. for `.bss` or for groups).
/// - `size`: bytes taken up, including padding that comes before `address`.
/// - `padding`: bytes of padding before `address`.
/// - `num_aliases`: number of symbols at the same address, including self.
/// - `pss`: `size / num_aliases`.
/// - `name`: name with templates and parameter list removed.
/// - `template_name`: name with parameter list removed.
/// - `full_name`: name with templates and parameter list.
/// - `section_name`: e.g. ".text", ".rodata", ".data.rel.local".
pub trait BaseSymbol {
    fn address(&self) -> u64;
    fn size(&self) -> i64;
    fn padding(&self) -> i64;
    fn pss(&self) -> f64;
    fn section_name(&self) -> &str;
    fn full_name(&self) -> &str;
    fn template_name(&self) -> &str;
    fn name(&self) -> &str;
    fn source_path(&self) -> &str;
    fn object_path(&self) -> &str;
    fn flags(&self) -> SymbolFlags;
    fn num_aliases(&self) -> usize;
    fn is_group(&self) -> bool;

    /// One-letter section, e.g. `r` for ".rodata".
    fn section(&self) -> char {
        self.section_name().chars().nth(1).unwrap_or('?')
    }

    fn size_without_padding(&self) -> i64 {
        self.size() - self.padding()
    }

    fn end_address(&self) -> u64 {
        self.address().wrapping_add_signed(self.size_without_padding())
    }

    fn is_anonymous(&self) -> bool {
        self.flags().contains(SymbolFlags::ANONYMOUS)
    }

    fn generated_source(&self) -> bool {
        self.flags().contains(SymbolFlags::GENERATED_SOURCE)
    }

    fn is_bss(&self) -> bool {
        self.section_name() == ".bss"
    }

    /// Heuristic for compiler-generated names such as thunks or guard variables.
    fn is_generated_by_toolchain(&self) -> bool {
        let name = self.name();
        name.contains('.') || (name.ends_with(']') && !name.ends_with("[]"))
    }

    /// Compact diagnostic rendering of the flag bits, e.g. `{anon,startup,2 aliases}`.
    fn flags_string(&self) -> String {
        let flags = self.flags();
        let aliased = self.num_aliases() > 1;
        if flags.is_empty() && !aliased {
            return "{}".to_string();
        }
        let labels = [
            (SymbolFlags::ANONYMOUS, "anon"),
            (SymbolFlags::STARTUP, "startup"),
            (SymbolFlags::UNLIKELY, "unlikely"),
            (SymbolFlags::REL, "rel"),
            (SymbolFlags::REL_LOCAL, "rel.loc"),
            (SymbolFlags::GENERATED_SOURCE, "gen"),
            (SymbolFlags::CLONE, "clone"),
        ];
        let mut parts: Vec<String> = labels
            .iter()
            .filter(|(flag, _)| flags.contains(*flag))
            .map(|(_, label)| label.to_string())
            .collect();
        if aliased {
            parts.push(format!("{} aliases", self.num_aliases()));
        }
        format!("{{{}}}", parts.join(","))
    }
}

/// Explicit proportional size of a delta symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PssDelta {
    pub(crate) pss: f64,
    pub(crate) pss_without_padding: f64,
}

/// A single symbol within a binary.
///
/// Symbols are created through [`crate::model::SymbolTableBuilder`] and are
/// immutable once the table is frozen.
#[derive(Clone, PartialEq)]
pub struct Symbol {
    pub(crate) id: SymbolId,
    pub(crate) address: u64,
    pub(crate) size: i64,
    pub(crate) padding: i64,
    pub(crate) section_name: String,
    pub(crate) full_name: String,
    pub(crate) template_name: String,
    pub(crate) name: String,
    pub(crate) source_path: String,
    pub(crate) object_path: String,
    pub(crate) flags: SymbolFlags,
    pub(crate) aliases: Option<AliasGroupId>,
    pub(crate) num_aliases: usize,
    pub(crate) pss_delta: Option<PssDelta>,
}

impl Symbol {
    /// Stable arena identity of this symbol within its table.
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Handle of the alias group this symbol belongs to, if any.
    pub fn aliases(&self) -> Option<AliasGroupId> {
        self.aliases
    }

    pub fn pss_without_padding(&self) -> f64 {
        match self.pss_delta {
            Some(delta) => delta.pss_without_padding,
            None => self.size_without_padding() as f64 / self.num_aliases as f64,
        }
    }
}

impl BaseSymbol for Symbol {
    fn address(&self) -> u64 {
        self.address
    }

    fn size(&self) -> i64 {
        self.size
    }

    fn padding(&self) -> i64 {
        self.padding
    }

    fn pss(&self) -> f64 {
        match self.pss_delta {
            Some(delta) => delta.pss,
            None => self.size as f64 / self.num_aliases as f64,
        }
    }

    fn section_name(&self) -> &str {
        &self.section_name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn template_name(&self) -> &str {
        &self.template_name
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn object_path(&self) -> &str {
        &self.object_path
    }

    fn flags(&self) -> SymbolFlags {
        self.flags
    }

    fn num_aliases(&self) -> usize {
        self.num_aliases
    }

    fn is_group(&self) -> bool {
        false
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:x}(size_without_padding={},padding={},full_name={},object_path={},\
             source_path={},flags={})",
            self.section_name,
            self.address,
            self.size_without_padding(),
            self.padding,
            self.full_name,
            self.object_path,
            self.source_path,
            self.flags_string()
        )
    }
}
