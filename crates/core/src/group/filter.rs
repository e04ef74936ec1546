use fancy_regex::Regex;

use crate::error::{SizeError, SizeResult};
use crate::group::{parse_hex_address, Node, NodeRef, SymbolGroup};
use crate::match_util::compile_pattern;
use crate::model::{section_name_for, BaseSymbol};

/// Backtracking patterns can fail at match time, not only when compiled.
fn found(regex: &Regex, text: &str) -> SizeResult<bool> {
    Ok(regex.is_match(text)?)
}

impl SymbolGroup {
    /// Stable partition into kept members and filtered-out members.
    ///
    /// The filtered-out side is retained so that [`SymbolGroup::inverted`]
    /// can return the complement of this filter.
    pub fn filter<F>(&self, mut keep: F) -> SymbolGroup
    where
        F: FnMut(NodeRef<'_>) -> bool,
    {
        let (kept, filtered): (Vec<Node>, Vec<Node>) =
            self.nodes.iter().cloned().partition(|node| keep(node.resolve(self.table())));
        self.create_transformed(kept, filtered, self.section_label(), self.is_sorted)
    }

    /// Like [`SymbolGroup::filter`], for predicates that can fail.
    ///
    /// The member the predicate failed on is logged and the error returned;
    /// no partial result is produced.
    pub fn try_filter<F, E>(&self, mut keep: F) -> Result<SymbolGroup, E>
    where
        F: FnMut(NodeRef<'_>) -> Result<bool, E>,
    {
        let mut kept = Vec::new();
        let mut filtered = Vec::new();
        for node in &self.nodes {
            let member = node.resolve(self.table());
            match keep(member) {
                Ok(true) => kept.push(node.clone()),
                Ok(false) => filtered.push(node.clone()),
                Err(err) => {
                    log::warn!("Filter failed on symbol {:?}", member);
                    return Err(err);
                }
            }
        }
        Ok(self.create_transformed(kept, filtered, self.section_label(), self.is_sorted))
    }

    /// Returns the members that were filtered out by the previous filter.
    ///
    /// Only meaningful when this group is the result of a filter, e.g.
    /// `symbols.where_path_matches("third_party")?.inverted()` yields the
    /// symbols outside third_party.
    pub fn inverted(&self) -> SymbolGroup {
        self.create_transformed(
            self.filtered.clone(),
            self.nodes.clone(),
            self.section_label(),
            false,
        )
    }

    pub fn where_is_group(&self) -> SymbolGroup {
        self.filter(|n| n.is_group())
    }

    pub fn where_size_bigger_than(&self, min_size: i64) -> SymbolGroup {
        self.filter(|n| n.size() >= min_size)
    }

    pub fn where_pss_bigger_than(&self, min_pss: f64) -> SymbolGroup {
        self.filter(|n| n.pss() >= min_pss)
    }

    /// Keeps members of one section, given either as a one-letter
    /// abbreviation (`"t"`) or a full section name (`".text"`).
    pub fn where_in_section(&self, section: &str) -> SizeResult<SymbolGroup> {
        let mut letters = section.chars();
        let (mut ret, section_name) = match (letters.next(), letters.next()) {
            (Some(letter), None) => {
                let section_name = section_name_for(letter)
                    .ok_or_else(|| SizeError::UnknownSection(section.to_string()))?;
                (self.filter(|n| n.section() == letter), section_name.to_string())
            }
            _ => (self.filter(|n| n.section_name() == section), section.to_string()),
        };
        ret.section_name = section_name;
        Ok(ret)
    }

    pub fn where_is_template(&self) -> SymbolGroup {
        self.filter(|n| n.template_name() != n.name())
    }

    pub fn where_source_is_generated(&self) -> SymbolGroup {
        self.filter(|n| n.generated_source())
    }

    pub fn where_generated_by_toolchain(&self) -> SymbolGroup {
        self.filter(|n| n.is_generated_by_toolchain())
    }

    pub fn where_full_name_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| found(&regex, n.full_name()))
    }

    pub fn where_template_name_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| found(&regex, n.template_name()))
    }

    pub fn where_name_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| found(&regex, n.name()))
    }

    pub fn where_object_path_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| found(&regex, n.object_path()))
    }

    pub fn where_source_path_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| found(&regex, n.source_path()))
    }

    pub fn where_path_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| -> SizeResult<bool> {
            Ok(found(&regex, n.source_path())? || found(&regex, n.object_path())?)
        })
    }

    /// Looks for `pattern` within all paths and names.
    pub fn where_matches(&self, pattern: &str) -> SizeResult<SymbolGroup> {
        let regex = compile_pattern(pattern)?;
        self.try_filter(|n| -> SizeResult<bool> {
            Ok(found(&regex, n.source_path())?
                || found(&regex, n.object_path())?
                || found(&regex, n.full_name())?
                || (n.template_name() != n.full_name() && found(&regex, n.template_name())?)
                || (n.name() != n.full_name() && found(&regex, n.name())?))
        })
    }

    /// Members whose address lies in `[start, end)`; `end` defaults to `start + 1`.
    pub fn where_address_in_range(&self, start: u64, end: Option<u64>) -> SymbolGroup {
        let end = end.unwrap_or_else(|| start.saturating_add(1));
        self.filter(|n| n.address() >= start && n.address() < end)
    }

    /// [`SymbolGroup::where_address_in_range`] with hex-text bounds.
    pub fn where_hex_address_in_range(
        &self,
        start: &str,
        end: Option<&str>,
    ) -> SizeResult<SymbolGroup> {
        let start = parse_hex_address(start)?;
        let end = end.map(parse_hex_address).transpose()?;
        Ok(self.where_address_in_range(start, end))
    }

    pub fn where_has_path(&self) -> SymbolGroup {
        self.filter(|n| !n.source_path().is_empty() || !n.object_path().is_empty())
    }

    pub fn where_has_any_attribution(&self) -> SymbolGroup {
        self.filter(|n| {
            !n.full_name().is_empty() || !n.source_path().is_empty() || !n.object_path().is_empty()
        })
    }
}
