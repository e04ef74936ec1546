//! Structural diffs between two symbol trees.
//!
//! A diff tree is an ordinary [`SymbolGroup`] whose leaves are delta symbols
//! (`size` is `after - before`) and which carries diff bookkeeping through
//! every transformation. [`SymbolGroup::as_diff`] exposes that bookkeeping as
//! a [`DiffView`].

pub mod engine;
pub mod matcher;

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::group::{Node, NodeRef, SymbolGroup};
use crate::model::{BaseSymbol, Symbol, SymbolId, SymbolTable};

pub use engine::{diff, diff_with};
pub use matcher::{NameMatcher, SymbolMatcher, SymbolPairing};

/// Classification of a node within a diff tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Unchanged,
    Changed,
    Added,
    Removed,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Changed => "changed",
            DiffStatus::Added => "added",
            DiffStatus::Removed => "removed",
        }
    }
}

/// Leaf tallies of a diff tree; the four counts partition its leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub unchanged: usize,
}

impl DiffCounts {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.changed + self.unchanged
    }
}

/// Identities of the added and removed delta symbols of one diff run.
#[derive(Debug, Default)]
pub(crate) struct DiffSets {
    pub(crate) added: HashSet<SymbolId>,
    pub(crate) removed: HashSet<SymbolId>,
}

impl DiffSets {
    fn leaf_status(&self, symbol: &Symbol) -> DiffStatus {
        if self.added.contains(&symbol.id()) {
            DiffStatus::Added
        } else if self.removed.contains(&symbol.id()) {
            DiffStatus::Removed
        } else if symbol.size() != 0 {
            DiffStatus::Changed
        } else {
            DiffStatus::Unchanged
        }
    }
}

/// Per-group diff bookkeeping, rebuilt by every transformation.
#[derive(Debug, Clone)]
pub(crate) struct DiffState {
    sets: Arc<DiffSets>,
    status: DiffStatus,
    counts: OnceCell<DiffCounts>,
}

impl DiffState {
    pub(crate) fn new(sets: Arc<DiffSets>, table: &SymbolTable, nodes: &[Node]) -> Self {
        let status = combined_status(&sets, table, nodes);
        Self { sets, status, counts: OnceCell::new() }
    }

    /// Bookkeeping for a group built from `nodes` within the same diff run.
    pub(crate) fn derive(&self, table: &SymbolTable, nodes: &[Node]) -> Self {
        Self::new(Arc::clone(&self.sets), table, nodes)
    }

    fn node_status(&self, node: NodeRef<'_>) -> DiffStatus {
        node_status(&self.sets, node)
    }
}

fn node_status(sets: &DiffSets, node: NodeRef<'_>) -> DiffStatus {
    match node {
        NodeRef::Symbol(symbol) => sets.leaf_status(symbol),
        // Groups store their own status, computed when they were created.
        NodeRef::Group(group) => match &group.diff {
            Some(state) => state.status,
            None => DiffStatus::Unchanged,
        },
    }
}

/// The common status of all `nodes`, `Changed` when they disagree.
fn combined_status(sets: &DiffSets, table: &SymbolTable, nodes: &[Node]) -> DiffStatus {
    let mut statuses = nodes.iter().map(|node| node_status(sets, node.resolve(table)));
    match statuses.next() {
        None => DiffStatus::Unchanged,
        Some(first) => {
            if statuses.all(|status| status == first) {
                first
            } else {
                DiffStatus::Changed
            }
        }
    }
}

/// Diff accessors of a group that belongs to a diff tree.
#[derive(Clone, Copy)]
pub struct DiffView<'a> {
    group: &'a SymbolGroup,
    state: &'a DiffState,
}

impl<'a> DiffView<'a> {
    pub(crate) fn new(group: &'a SymbolGroup, state: &'a DiffState) -> Self {
        Self { group, state }
    }

    /// Status of the group itself.
    pub fn status(&self) -> DiffStatus {
        self.state.status
    }

    pub fn status_of(&self, node: NodeRef<'_>) -> DiffStatus {
        self.state.node_status(node)
    }

    pub fn is_added(&self, node: NodeRef<'_>) -> bool {
        self.status_of(node) == DiffStatus::Added
    }

    pub fn is_removed(&self, node: NodeRef<'_>) -> bool {
        self.status_of(node) == DiffStatus::Removed
    }

    pub fn is_changed(&self, node: NodeRef<'_>) -> bool {
        self.status_of(node) == DiffStatus::Changed
    }

    pub fn is_unchanged(&self, node: NodeRef<'_>) -> bool {
        self.status_of(node) == DiffStatus::Unchanged
    }

    /// Leaf tallies for the whole subtree, computed once per group.
    pub fn counts(&self) -> DiffCounts {
        *self.state.counts.get_or_init(|| {
            let mut counts = DiffCounts::default();
            for symbol in self.group.iter_leaf_symbols() {
                match self.state.sets.leaf_status(symbol) {
                    DiffStatus::Added => counts.added += 1,
                    DiffStatus::Removed => counts.removed += 1,
                    DiffStatus::Changed => counts.changed += 1,
                    DiffStatus::Unchanged => counts.unchanged += 1,
                }
            }
            counts
        })
    }

    pub fn added_count(&self) -> usize {
        self.counts().added
    }

    pub fn removed_count(&self) -> usize {
        self.counts().removed
    }

    pub fn changed_count(&self) -> usize {
        self.counts().changed
    }

    pub fn unchanged_count(&self) -> usize {
        self.counts().unchanged
    }

    /// Members whose status is anything but unchanged.
    pub fn where_not_unchanged(&self) -> SymbolGroup {
        let state = self.state;
        self.group.filter(|n| state.node_status(n) != DiffStatus::Unchanged)
    }
}
