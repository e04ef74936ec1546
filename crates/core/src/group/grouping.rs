use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::PathGrouping;
use crate::group::{GroupLabel, Node, NodeRef, SymbolGroup};
use crate::model::BaseSymbol;

const NAME_SEPARATOR: &str = "::";
const PATH_SEPARATOR: &str = "/";

/// Default sort policy: non-bss before bss, then by |pss| descending, then by name.
pub fn default_order(a: &NodeRef<'_>, b: &NodeRef<'_>) -> Ordering {
    a.is_bss()
        .cmp(&b.is_bss())
        .then_with(|| b.pss().abs().total_cmp(&a.pss().abs()))
        .then_with(|| a.name().cmp(b.name()))
}

impl SymbolGroup {
    /// Stable sort by `compare`. With `reverse`, the ordering is flipped while
    /// equal members keep their relative order.
    pub fn sorted<F>(&self, mut compare: F, reverse: bool) -> SymbolGroup
    where
        F: FnMut(&NodeRef<'_>, &NodeRef<'_>) -> Ordering,
    {
        let table = self.table();
        let mut nodes = self.nodes.clone();
        nodes.sort_by(|a, b| {
            let ordering = compare(&a.resolve(table), &b.resolve(table));
            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
        self.create_transformed(nodes, self.filtered.clone(), self.section_label(), true)
    }

    /// Sorts with [`default_order`].
    pub fn sorted_default(&self, reverse: bool) -> SymbolGroup {
        self.sorted(default_order, reverse)
    }

    /// Sorts by an owned key extracted from each member.
    pub fn sorted_by_key<K, F>(&self, mut key: F, reverse: bool) -> SymbolGroup
    where
        K: Ord,
        F: FnMut(&NodeRef<'_>) -> K,
    {
        self.sorted(|a, b| key(a).cmp(&key(b)), reverse)
    }

    pub fn sorted_by_name(&self, reverse: bool) -> SymbolGroup {
        self.sorted(|a, b| a.name().cmp(b.name()), reverse)
    }

    /// Sorts by address, then object path, then name.
    pub fn sorted_by_address(&self, reverse: bool) -> SymbolGroup {
        self.sorted(
            |a, b| {
                (a.address(), a.object_path(), a.name()).cmp(&(
                    b.address(),
                    b.object_path(),
                    b.name(),
                ))
            },
            reverse,
        )
    }

    /// Sorts by child count, largest first unless `reverse`.
    pub fn sorted_by_count(&self, reverse: bool) -> SymbolGroup {
        self.sorted_by_key(|n| n.child_count(), !reverse)
    }

    /// Groups members by the token `token_fn` assigns them.
    ///
    /// Members mapped to `None` are moved to the filtered-out side. Groups
    /// appear in first-seen token order and keep their members' relative
    /// order. A token shared by fewer than `|min_count|` members is not
    /// grouped: its members stay in place when `min_count >= 0` and are
    /// filtered out when `min_count < 0`.
    pub fn grouped_by<F>(&self, token_fn: F, min_count: i32) -> SymbolGroup
    where
        F: FnMut(NodeRef<'_>) -> Option<String>,
    {
        let section_name = self.section_name.clone();
        self.grouped_by_with(token_fn, min_count, |token, _| {
            GroupLabel::named(token).in_section(section_name.as_str())
        })
    }

    /// [`SymbolGroup::grouped_by`] with a custom `factory` naming each created group.
    pub fn grouped_by_with<F, G>(
        &self,
        mut token_fn: F,
        min_count: i32,
        mut factory: G,
    ) -> SymbolGroup
    where
        F: FnMut(NodeRef<'_>) -> Option<String>,
        G: FnMut(&str, &[NodeRef<'_>]) -> GroupLabel,
    {
        let table = self.table();
        let mut filtered = Vec::new();
        let mut by_token: IndexMap<String, Vec<Node>> = IndexMap::new();
        for node in &self.nodes {
            match token_fn(node.resolve(table)) {
                Some(token) => by_token.entry(token).or_default().push(node.clone()),
                None => filtered.push(node.clone()),
            }
        }

        let include_singles = min_count >= 0;
        let threshold = min_count.unsigned_abs() as usize;
        let mut nodes = Vec::with_capacity(by_token.len());
        for (token, members) in by_token {
            if members.len() >= threshold {
                let label = {
                    let resolved: Vec<NodeRef<'_>> =
                        members.iter().map(|n| n.resolve(table)).collect();
                    factory(&token, &resolved)
                };
                let group = self.create_transformed(members, Vec::new(), label, self.is_sorted);
                nodes.push(Node::Group(Arc::new(group)));
            } else if include_singles {
                nodes.extend(members);
            } else {
                filtered.extend(members);
            }
        }
        self.create_transformed(nodes, filtered, self.section_label(), self.is_sorted)
    }

    pub fn grouped_by_section_name(&self) -> SymbolGroup {
        self.grouped_by(|n| Some(n.section_name().to_string()), 0)
    }

    /// Groups by symbol name, where `depth` controls how many `::` parts to keep.
    ///
    /// - `0`: the entire name (useful for grouping templates).
    /// - `> 0`: this many leading parts (`1` → `std`, `2` → `std::map`).
    /// - `< 0`: the entire name minus this many trailing parts.
    pub fn grouped_by_name(&self, depth: i32, min_count: i32) -> SymbolGroup {
        self.grouped_by(
            |n| {
                let name = n.name();
                let parts = depth.unsigned_abs() as usize;
                let token = if depth >= 0 {
                    prefix_before_separator(name, NAME_SEPARATOR, parts)
                } else {
                    prefix_without_trailing_parts(name, NAME_SEPARATOR, parts)
                };
                Some(token.to_string())
            },
            min_count,
        )
    }

    /// Groups by source path truncated to `options.depth` leading directories.
    pub fn grouped_by_path(&self, options: &PathGrouping) -> SymbolGroup {
        self.grouped_by(
            |n| {
                let mut path = n.source_path();
                if options.fallback_to_object_path && path.is_empty() {
                    path = n.object_path();
                }
                if path.is_empty() {
                    path = options.fallback.as_str();
                }
                Some(prefix_before_separator(path, PATH_SEPARATOR, options.depth).to_string())
            },
            options.min_count,
        )
    }
}

/// The text before the `count`-th occurrence of `separator`; everything when
/// `count` is 0 or there are fewer occurrences.
pub(crate) fn prefix_before_separator<'s>(text: &'s str, separator: &str, count: usize) -> &'s str {
    let mut end = None;
    let mut from = 0;
    for _ in 0..count {
        match text[from..].find(separator) {
            Some(pos) => {
                end = Some(from + pos);
                from += pos + separator.len();
            }
            None => break,
        }
    }
    end.map_or(text, |end| &text[..end])
}

/// `text` with its last `count` `separator`-delimited parts removed.
pub(crate) fn prefix_without_trailing_parts<'s>(
    text: &'s str,
    separator: &str,
    count: usize,
) -> &'s str {
    let mut end = text.len();
    for _ in 0..count {
        match text[..end].rfind(separator) {
            Some(pos) => end = pos,
            None => break,
        }
        if end == 0 {
            break;
        }
    }
    &text[..end]
}
