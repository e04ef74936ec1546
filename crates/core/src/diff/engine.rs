use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diff::matcher::{NameMatcher, SymbolMatcher, SymbolPairing};
use crate::diff::{DiffSets, DiffState};
use crate::error::{SizeError, SizeResult};
use crate::group::{GroupLabel, Node, SymbolGroup};
use crate::model::{
    AliasGroupId, BaseSymbol, RawSymbol, Symbol, SymbolId, SymbolTable, SymbolTableBuilder,
};

/// Diffs two trees using [`NameMatcher`].
pub fn diff(before: &SymbolGroup, after: &SymbolGroup) -> SizeResult<SymbolGroup> {
    diff_with(before, after, &NameMatcher)
}

/// Diffs the leaf symbols of two trees into one annotated tree.
///
/// Leaves of the result are fresh delta symbols: paired symbols take the
/// "after" facts with `size`/`padding` replaced by `after - before`; added
/// symbols keep their "after" facts; removed symbols keep their "before"
/// facts with negated `size`/`padding`. Every delta carries `pss = after.pss
/// - before.pss` (a missing side counts as 0).
///
/// Alias groups survive only when their membership does: a group whose
/// members were all added, all removed, or all paired with exactly one
/// complete alias group on the other side is re-created among the deltas.
/// Any other delta of an aliased symbol stands alone and uses its integer
/// share of the group's bytes, so the root `size` stays `after - before`.
/// The result lists added, then removed, then paired symbols.
pub fn diff_with(
    before: &SymbolGroup,
    after: &SymbolGroup,
    matcher: &dyn SymbolMatcher,
) -> SizeResult<SymbolGroup> {
    let pairing = matcher.pair(before, after);
    let before_table = before.table();
    let after_table = after.table();
    let kept = KeptAliases::find(&pairing, before_table, after_table)?;

    let mut builder = SymbolTableBuilder::new();
    let mut sets = DiffSets::default();
    // Kept source alias group -> delta symbols, per side.
    let mut after_aliases: IndexMap<AliasGroupId, Vec<SymbolId>> = IndexMap::new();
    let mut before_aliases: IndexMap<AliasGroupId, Vec<SymbolId>> = IndexMap::new();
    let mut nodes = Vec::with_capacity(
        pairing.added.len() + pairing.removed.len() + pairing.similar.len(),
    );

    for id in &pairing.added {
        let new = lookup(after_table, *id)?;
        let group = new.aliases().filter(|g| kept.after.contains(g));
        let delta = push_delta(&mut builder, None, Some((after_table, new)), group.is_some())?;
        if let Some(group) = group {
            after_aliases.entry(group).or_default().push(delta);
        }
        sets.added.insert(delta);
        nodes.push(Node::Symbol(delta));
    }
    for id in &pairing.removed {
        let old = lookup(before_table, *id)?;
        let group = old.aliases().filter(|g| kept.before.contains(g));
        let delta = push_delta(&mut builder, Some((before_table, old)), None, group.is_some())?;
        if let Some(group) = group {
            before_aliases.entry(group).or_default().push(delta);
        }
        sets.removed.insert(delta);
        nodes.push(Node::Symbol(delta));
    }
    for (before_id, after_id) in &pairing.similar {
        let old = lookup(before_table, *before_id)?;
        let new = lookup(after_table, *after_id)?;
        let group = new.aliases().filter(|g| kept.after.contains(g));
        let whole = group.is_some() || (old.aliases().is_none() && new.aliases().is_none());
        let delta =
            push_delta(&mut builder, Some((before_table, old)), Some((after_table, new)), whole)?;
        if let Some(group) = group {
            after_aliases.entry(group).or_default().push(delta);
        }
        nodes.push(Node::Symbol(delta));
    }
    for members in after_aliases.values().chain(before_aliases.values()) {
        if members.len() > 1 {
            builder.add_alias_group(members)?;
        }
    }

    log::debug!(
        "Diff ({} matcher): {} added, {} removed, {} paired, {} alias groups kept",
        matcher.name(),
        pairing.added.len(),
        pairing.removed.len(),
        pairing.similar.len(),
        kept.after.len() + kept.before.len()
    );

    let table = builder.freeze();
    let state = DiffState::new(Arc::new(sets), &table, &nodes);
    let label = GroupLabel::default();
    Ok(SymbolGroup::from_parts(table, nodes, Vec::new(), label, false, Some(state)))
}

/// Source alias groups whose membership is the same on both sides of a diff.
#[derive(Debug, Default)]
struct KeptAliases {
    /// "after" groups whose members were all added, or all paired with one
    /// complete "before" group.
    after: HashSet<AliasGroupId>,
    /// "before" groups whose members were all removed.
    before: HashSet<AliasGroupId>,
}

impl KeptAliases {
    fn find(
        pairing: &SymbolPairing,
        before_table: &SymbolTable,
        after_table: &SymbolTable,
    ) -> SizeResult<Self> {
        let added: HashSet<SymbolId> = pairing.added.iter().copied().collect();
        let removed: HashSet<SymbolId> = pairing.removed.iter().copied().collect();
        let partners: HashMap<SymbolId, SymbolId> =
            pairing.similar.iter().map(|(old, new)| (*new, *old)).collect();

        let mut kept = Self::default();
        for id in pairing.added.iter().chain(partners.keys()) {
            let Some(group) = lookup(after_table, *id)?.aliases() else {
                continue;
            };
            if kept.after.contains(&group) {
                continue;
            }
            let members = after_table.alias_group(group);
            if members.iter().all(|m| added.contains(m))
                || same_membership(members, &partners, before_table)
            {
                kept.after.insert(group);
            }
        }
        for id in &pairing.removed {
            let Some(group) = lookup(before_table, *id)?.aliases() else {
                continue;
            };
            if before_table.alias_group(group).iter().all(|m| removed.contains(m)) {
                kept.before.insert(group);
            }
        }
        Ok(kept)
    }
}

/// Whether every member of an "after" group is paired, and the partners are
/// exactly the members of one "before" group.
fn same_membership(
    members: &[SymbolId],
    partners: &HashMap<SymbolId, SymbolId>,
    before_table: &SymbolTable,
) -> bool {
    let mut old_group = None;
    for member in members {
        let Some(old) = partners.get(member).and_then(|id| before_table.get(*id)) else {
            return false;
        };
        let Some(group) = old.aliases() else {
            return false;
        };
        match old_group {
            None => old_group = Some(group),
            Some(expected) if expected != group => return false,
            Some(_) => {}
        }
    }
    old_group.is_some_and(|group| before_table.alias_group(group).len() == members.len())
}

/// Pushes the delta of `old -> new`, with facts taken from `new` when present.
///
/// With `whole`, size and padding are full differences; otherwise each side
/// contributes only its share of its alias group's bytes.
fn push_delta(
    builder: &mut SymbolTableBuilder,
    old: Option<(&SymbolTable, &Symbol)>,
    new: Option<(&SymbolTable, &Symbol)>,
    whole: bool,
) -> SizeResult<SymbolId> {
    let amount = |side: Option<(&SymbolTable, &Symbol)>, value: fn(&Symbol) -> i64| match side {
        None => 0,
        Some((_, symbol)) if whole => value(symbol),
        Some((table, symbol)) => alias_share(table, symbol, value(symbol)),
    };
    let pss = |side: Option<(&SymbolTable, &Symbol)>, value: fn(&Symbol) -> f64| {
        side.map_or(0.0, |(_, symbol)| value(symbol))
    };

    let mut raw = match new.or(old) {
        Some((_, symbol)) => RawSymbol::from_symbol(symbol),
        None => return Err(SizeError::UnknownSymbol(0)),
    };
    raw.size = amount(new, |s| s.size()) - amount(old, |s| s.size());
    raw.padding = amount(new, |s| s.padding()) - amount(old, |s| s.padding());
    let delta = builder.push(raw)?;
    builder.set_pss_delta(
        delta,
        pss(new, |s| s.pss()) - pss(old, |s| s.pss()),
        pss(new, Symbol::pss_without_padding) - pss(old, Symbol::pss_without_padding),
    )?;
    Ok(delta)
}

/// Integer share of `value` owned by `symbol` within its alias group.
///
/// Shares of one group add up to `value` exactly; the remainder goes to the
/// first members.
fn alias_share(table: &SymbolTable, symbol: &Symbol, value: i64) -> i64 {
    let Some(group) = symbol.aliases() else {
        return value;
    };
    let members = table.alias_group(group);
    if members.is_empty() {
        return value;
    }
    let count = members.len() as i64;
    let position = members.iter().position(|m| *m == symbol.id()).unwrap_or(0) as i64;
    value.div_euclid(count) + i64::from(position < value.rem_euclid(count))
}

fn lookup(table: &SymbolTable, id: SymbolId) -> SizeResult<&Symbol> {
    table.get(id).ok_or(SizeError::UnknownSymbol(id.index()))
}
