use once_cell::sync::Lazy;
use regex::Regex;

use crate::group::{GroupLabel, NodeRef, SymbolGroup};
use crate::model::BaseSymbol;

/// Trailing counter of synthetic names: "** symbol gap 3 (end of section)".
static TRAILING_COUNTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\d+( \(.*\))?$").expect("valid counter regex"));

/// Key under which fragments of one logical symbol are merged.
///
/// Nameless members get a key unique to their identity so they are never
/// merged; `*`-prefixed synthetic names lose their numeric counter.
pub(crate) fn cluster_key(node: NodeRef<'_>) -> String {
    let name = node.full_name();
    if name.is_empty() {
        // "&" keeps these apart from real symbol names.
        return format!("&{}", node.id());
    }
    if name.starts_with('*') {
        return TRAILING_COUNTER.replace(name, "s").into_owned();
    }
    name.to_string()
}

fn cluster_label(key: &str, members: &[NodeRef<'_>]) -> GroupLabel {
    let Some(first) = members.first() else {
        return GroupLabel::named(key);
    };
    if key.starts_with('*') {
        return GroupLabel::named(key).in_section(first.section_name());
    }
    GroupLabel {
        full_name: key.to_string(),
        template_name: first.template_name().to_string(),
        name: first.name().to_string(),
        section_name: Some(first.section_name().to_string()),
    }
}

impl SymbolGroup {
    /// Returns a new group with split fragments moved into subgroups.
    ///
    /// Symbols that were broken into several parts (cold/hot splits, numbered
    /// filler entries like "** symbol gap 3") end up under one group that
    /// once again looks like a single symbol. Clustering never crosses a
    /// section and leaves totals untouched. [`crate::SizeInfo::symbols`]
    /// caches this view.
    pub fn clustered(&self) -> SymbolGroup {
        let sections = self.grouped_by_section_name();
        let mut nodes = Vec::with_capacity(self.len());
        for section in sections.iter().filter_map(NodeRef::as_group) {
            let clusters = section.grouped_by_with(|n| Some(cluster_key(n)), 2, cluster_label);
            nodes.extend(clusters.nodes);
        }
        let ret = self.create_transformed(nodes, Vec::new(), Default::default(), self.is_sorted);
        log::debug!(
            "Clustered {} symbols into {} nodes ({} groups)",
            self.len(),
            ret.len(),
            ret.iter().filter(|n| n.is_group()).count()
        );
        ret
    }
}
