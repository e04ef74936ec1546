//! Symbol groups: immutable, ordered composites of symbols and nested groups.
//!
//! A [`SymbolGroup`] exposes the same [`BaseSymbol`] surface as a single
//! symbol by aggregating its members. Every filter, sort, grouping, or
//! clustering call returns a new group; nothing is mutated in place.
//!
//! Identity matters: set algebra and diff bookkeeping compare nodes by
//! [`NodeId`] (arena index for symbols, allocation for nested groups), never
//! by value.

pub mod cluster;
pub mod filter;
pub mod grouping;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::diff::{DiffState, DiffView};
use crate::error::{SizeError, SizeResult};
use crate::model::{BaseSymbol, Symbol, SymbolFlags, SymbolId, SymbolTable};

pub use grouping::default_order;

/// Section name used by groups whose members span several sections.
pub const MIXED_SECTION_NAME: &str = ".*";

/// Stored child of a group.
#[derive(Clone)]
pub(crate) enum Node {
    Symbol(SymbolId),
    Group(Arc<SymbolGroup>),
}

impl Node {
    pub(crate) fn id(&self) -> NodeId {
        match self {
            Node::Symbol(id) => NodeId::Symbol(*id),
            Node::Group(group) => NodeId::Group(Arc::as_ptr(group) as usize),
        }
    }

    pub(crate) fn resolve<'a>(&'a self, table: &'a SymbolTable) -> NodeRef<'a> {
        match self {
            Node::Symbol(id) => NodeRef::Symbol(table.symbol(*id)),
            Node::Group(group) => NodeRef::Group(group),
        }
    }
}

/// Identity of a node within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Symbol(SymbolId),
    Group(usize),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Symbol(id) => write!(f, "{}", id),
            NodeId::Group(addr) => write!(f, "g{:x}", addr),
        }
    }
}

/// Borrowed view of one child: either a leaf symbol or a nested group.
#[derive(Clone, Copy)]
pub enum NodeRef<'a> {
    Symbol(&'a Symbol),
    Group(&'a SymbolGroup),
}

impl<'a> NodeRef<'a> {
    pub fn as_symbol(self) -> Option<&'a Symbol> {
        match self {
            NodeRef::Symbol(symbol) => Some(symbol),
            NodeRef::Group(_) => None,
        }
    }

    pub fn as_group(self) -> Option<&'a SymbolGroup> {
        match self {
            NodeRef::Symbol(_) => None,
            NodeRef::Group(group) => Some(group),
        }
    }

    pub fn id(self) -> NodeId {
        match self {
            NodeRef::Symbol(symbol) => NodeId::Symbol(symbol.id()),
            NodeRef::Group(group) => NodeId::Group(group as *const SymbolGroup as usize),
        }
    }

    /// Number of direct children; a leaf counts as one.
    pub fn child_count(self) -> usize {
        match self {
            NodeRef::Symbol(_) => 1,
            NodeRef::Group(group) => group.len(),
        }
    }

    /// The node as a trait object living as long as the tree.
    pub fn base(self) -> &'a dyn BaseSymbol {
        match self {
            NodeRef::Symbol(symbol) => symbol,
            NodeRef::Group(group) => group,
        }
    }
}

impl BaseSymbol for NodeRef<'_> {
    fn address(&self) -> u64 {
        self.base().address()
    }

    fn size(&self) -> i64 {
        self.base().size()
    }

    fn padding(&self) -> i64 {
        self.base().padding()
    }

    fn pss(&self) -> f64 {
        self.base().pss()
    }

    fn section_name(&self) -> &str {
        self.base().section_name()
    }

    fn full_name(&self) -> &str {
        self.base().full_name()
    }

    fn template_name(&self) -> &str {
        self.base().template_name()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn source_path(&self) -> &str {
        self.base().source_path()
    }

    fn object_path(&self) -> &str {
        self.base().object_path()
    }

    fn flags(&self) -> SymbolFlags {
        self.base().flags()
    }

    fn num_aliases(&self) -> usize {
        self.base().num_aliases()
    }

    fn is_group(&self) -> bool {
        matches!(self, NodeRef::Group(_))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Symbol(symbol) => fmt::Debug::fmt(symbol, f),
            NodeRef::Group(group) => fmt::Debug::fmt(group, f),
        }
    }
}

/// Names describing a group that stands in for a merged symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupLabel {
    pub full_name: String,
    pub template_name: String,
    pub name: String,
    /// `None` means members may span several sections.
    pub section_name: Option<String>,
}

impl GroupLabel {
    /// Label using `name` for all three name fields.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { full_name: name.clone(), template_name: name.clone(), name, section_name: None }
    }

    pub fn in_section(mut self, section_name: impl Into<String>) -> Self {
        self.section_name = Some(section_name.into());
        self
    }
}

/// An immutable group of symbols using the same interface as [`Symbol`].
#[derive(Clone)]
pub struct SymbolGroup {
    table: Arc<SymbolTable>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) filtered: Vec<Node>,
    pub(crate) full_name: String,
    pub(crate) template_name: String,
    pub(crate) name: String,
    pub(crate) section_name: String,
    pub(crate) is_sorted: bool,
    pub(crate) diff: Option<DiffState>,
    size: OnceCell<i64>,
    pss: OnceCell<f64>,
    padding: OnceCell<i64>,
}

impl SymbolGroup {
    /// Group holding the given symbols of `table`, in order.
    pub fn new(
        table: Arc<SymbolTable>,
        ids: impl IntoIterator<Item = SymbolId>,
    ) -> SizeResult<Self> {
        let mut nodes = Vec::new();
        for id in ids {
            if table.get(id).is_none() {
                return Err(SizeError::UnknownSymbol(id.index()));
            }
            nodes.push(Node::Symbol(id));
        }
        Ok(Self::from_parts(table, nodes, Vec::new(), GroupLabel::default(), false, None))
    }

    /// Flat group holding every symbol of `table` in insertion order.
    pub fn from_table(table: Arc<SymbolTable>) -> Self {
        let nodes = table.ids().map(Node::Symbol).collect();
        Self::from_parts(table, nodes, Vec::new(), GroupLabel::default(), false, None)
    }

    pub(crate) fn from_parts(
        table: Arc<SymbolTable>,
        nodes: Vec<Node>,
        filtered: Vec<Node>,
        label: GroupLabel,
        is_sorted: bool,
        diff: Option<DiffState>,
    ) -> Self {
        Self {
            table,
            nodes,
            filtered,
            full_name: label.full_name,
            template_name: label.template_name,
            name: label.name,
            section_name: label.section_name.unwrap_or_else(|| MIXED_SECTION_NAME.to_string()),
            is_sorted,
            diff,
            size: OnceCell::new(),
            pss: OnceCell::new(),
            padding: OnceCell::new(),
        }
    }

    /// Builds a sibling group over the same table, carrying diff bookkeeping along.
    pub(crate) fn create_transformed(
        &self,
        nodes: Vec<Node>,
        filtered: Vec<Node>,
        label: GroupLabel,
        is_sorted: bool,
    ) -> SymbolGroup {
        let diff = self.diff.as_ref().map(|state| state.derive(&self.table, &nodes));
        Self::from_parts(Arc::clone(&self.table), nodes, filtered, label, is_sorted, diff)
    }

    /// Label that keeps only this group's section name.
    pub(crate) fn section_label(&self) -> GroupLabel {
        GroupLabel { section_name: Some(self.section_name.clone()), ..GroupLabel::default() }
    }

    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.nodes.iter().map(move |node| node.resolve(&self.table))
    }

    /// Members removed by the filter that produced this group.
    pub fn filtered_out(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.filtered.iter().map(move |node| node.resolve(&self.table))
    }

    pub fn get(&self, index: usize) -> Option<NodeRef<'_>> {
        self.nodes.get(index).map(|node| node.resolve(&self.table))
    }

    /// The single member starting at `address`.
    pub fn by_address(&self, address: u64) -> SizeResult<NodeRef<'_>> {
        let found: Vec<NodeRef<'_>> = self.iter().filter(|n| n.address() == address).collect();
        match found.as_slice() {
            [one] => Ok(*one),
            _ => Err(SizeError::AddressLookup { count: found.len(), address }),
        }
    }

    /// Same as [`SymbolGroup::by_address`], with the address given as hex text (`"0x1234"`).
    pub fn by_hex_address(&self, address: &str) -> SizeResult<NodeRef<'_>> {
        self.by_address(parse_hex_address(address)?)
    }

    /// Yields all members, but only one from each alias group.
    pub fn iter_unique_symbols(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        let mut seen = HashSet::new();
        self.iter().filter(move |node| match node {
            NodeRef::Symbol(symbol) => match symbol.aliases() {
                Some(group) => seen.insert(group),
                None => true,
            },
            NodeRef::Group(_) => true,
        })
    }

    /// Yields all symbols, recursing into subgroups.
    pub fn iter_leaf_symbols(&self) -> LeafSymbols<'_> {
        LeafSymbols { stack: vec![(&*self.table, self.nodes.iter())] }
    }

    pub fn count_unique_symbols(&self) -> usize {
        self.iter_unique_symbols().count()
    }

    /// Members of `self` whose identity does not appear in `other`.
    pub fn difference(&self, other: &SymbolGroup) -> SizeResult<SymbolGroup> {
        self.check_same_table(other)?;
        let other_ids: HashSet<NodeId> = other.nodes.iter().map(Node::id).collect();
        let nodes = self.nodes.iter().filter(|n| !other_ids.contains(&n.id())).cloned().collect();
        Ok(self.create_transformed(nodes, Vec::new(), self.section_label(), self.is_sorted))
    }

    /// Members of `self` followed by members of `other` not already present.
    pub fn union(&self, other: &SymbolGroup) -> SizeResult<SymbolGroup> {
        self.check_same_table(other)?;
        let self_ids: HashSet<NodeId> = self.nodes.iter().map(Node::id).collect();
        let mut nodes = self.nodes.clone();
        nodes.extend(other.nodes.iter().filter(|n| !self_ids.contains(&n.id())).cloned());
        Ok(self.create_transformed(nodes, Vec::new(), self.section_label(), false))
    }

    fn check_same_table(&self, other: &SymbolGroup) -> SizeResult<()> {
        if Arc::ptr_eq(&self.table, &other.table) {
            Ok(())
        } else {
            Err(SizeError::ForeignTable)
        }
    }

    /// Diff bookkeeping, when this group is part of a diff tree.
    pub fn as_diff(&self) -> Option<DiffView<'_>> {
        self.diff.as_ref().map(|state| DiffView::new(self, state))
    }

    pub fn is_diff(&self) -> bool {
        self.diff.is_some()
    }

    /// The common value of `value` over all members, or `default` when they disagree.
    fn unanimous<'a, T, F>(&'a self, value: F, default: T) -> T
    where
        T: PartialEq,
        F: Fn(NodeRef<'a>) -> T,
    {
        let mut members = self.iter();
        match members.next() {
            None => default,
            Some(first) => {
                let first = value(first);
                if members.all(|node| value(node) == first) {
                    first
                } else {
                    default
                }
            }
        }
    }
}

impl BaseSymbol for SymbolGroup {
    fn address(&self) -> u64 {
        self.unanimous(|n| n.address(), 0)
    }

    fn size(&self) -> i64 {
        *self.size.get_or_init(|| {
            if self.is_bss() {
                self.iter().map(|n| n.size()).sum()
            } else {
                self.iter_unique_symbols().map(|n| n.size()).sum()
            }
        })
    }

    fn padding(&self) -> i64 {
        *self.padding.get_or_init(|| self.iter_unique_symbols().map(|n| n.padding()).sum())
    }

    fn pss(&self) -> f64 {
        *self.pss.get_or_init(|| {
            if self.is_bss() {
                self.iter().map(|n| n.pss()).sum()
            } else {
                self.iter().filter(|n| !n.is_bss()).map(|n| n.pss()).sum()
            }
        })
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
        self.unanimous(|n| n.base().source_path(), "")
    }

    fn object_path(&self) -> &str {
        self.unanimous(|n| n.base().object_path(), "")
    }

    fn flags(&self) -> SymbolFlags {
        self.unanimous(|n| n.flags(), SymbolFlags::empty())
    }

    fn num_aliases(&self) -> usize {
        1
    }

    fn is_group(&self) -> bool {
        true
    }
}

impl fmt::Debug for SymbolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_diff() {
            Some(diff) => write!(
                f,
                "SymbolGroup({} added, {} removed, {} changed, {} unchanged, size={})",
                diff.added_count(),
                diff.removed_count(),
                diff.changed_count(),
                diff.unchanged_count(),
                self.size()
            ),
            None => write!(
                f,
                "Group(full_name={},count={},size={})",
                self.full_name,
                self.len(),
                self.size()
            ),
        }
    }
}

/// Depth-first iterator over the leaf symbols of a tree.
pub struct LeafSymbols<'a> {
    stack: Vec<(&'a SymbolTable, std::slice::Iter<'a, Node>)>,
}

impl<'a> Iterator for LeafSymbols<'a> {
    type Item = &'a Symbol;

    fn next(&mut self) -> Option<&'a Symbol> {
        loop {
            let (table, members) = self.stack.last_mut()?;
            let table: &'a SymbolTable = *table;
            match members.next() {
                Some(Node::Symbol(id)) => return Some(table.symbol(*id)),
                Some(Node::Group(group)) => {
                    let group: &'a SymbolGroup = group;
                    self.stack.push((&*group.table, group.nodes.iter()));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Parses `"0x1234"` or `"1234"` as a hex address.
pub(crate) fn parse_hex_address(text: &str) -> SizeResult<u64> {
    let trimmed = text.trim();
    let digits =
        trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|_| SizeError::InvalidAddress(text.to_string()))
}
