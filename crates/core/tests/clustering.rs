mod common;

use std::collections::BTreeMap;
use std::collections::HashSet;

use binsize_core::{BaseSymbol, Metadata, NodeRef, RawSymbol, SizeInfo, SymbolGroup, SymbolId};

fn leaf_ids(group: &SymbolGroup) -> HashSet<SymbolId> {
    group.iter_leaf_symbols().map(|s| s.id()).collect()
}

fn full_names(group: &SymbolGroup) -> Vec<String> {
    group.iter().map(|n| n.full_name().to_string()).collect()
}

fn raw() -> SymbolGroup {
    common::group_of(vec![
        common::text("foo", 100),
        RawSymbol::new(".rodata", 30).named("** symbol gap 0"),
        common::text("bar", 20),
        RawSymbol::new(".rodata", 10).named("** symbol gap 1"),
        RawSymbol::new(".rodata", 6).named("** symbol gap 2 (end of section)"),
        common::text("foo", 12),
        RawSymbol::new(".rodata", 8).named("foo"),
        RawSymbol::new(".data", 4),
        RawSymbol::new(".data", 4),
    ])
}

#[test]
fn numbered_synthetic_names_merge_into_one_cluster() {
    common::init_logging();
    let clustered = raw().clustered();

    let gaps = clustered
        .iter()
        .filter_map(NodeRef::as_group)
        .find(|g| g.full_name() == "** symbol gaps")
        .expect("gap cluster");
    assert_eq!(gaps.len(), 3);
    assert_eq!(gaps.size(), 46);
    assert_eq!(gaps.section_name(), ".rodata");
}

#[test]
fn single_star_markers_cluster_too() {
    let input = common::group_of(vec![
        common::text("* symbol gap 1", 3),
        common::text("* symbol gap 2", 5),
    ]);
    let clustered = input.clustered();
    assert_eq!(clustered.len(), 1);

    let gaps = clustered.get(0).and_then(NodeRef::as_group).expect("gap cluster");
    assert_eq!(gaps.full_name(), "* symbol gaps");
    assert_eq!(gaps.name(), "* symbol gaps");
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps.size(), 8);
}

#[test]
fn clusters_stay_within_one_section() {
    let clustered = raw().clustered();

    let text_foo = clustered
        .iter()
        .filter_map(NodeRef::as_group)
        .find(|g| g.full_name() == "foo")
        .expect("foo cluster");
    assert_eq!(text_foo.section_name(), ".text");
    assert_eq!(text_foo.len(), 2);
    assert_eq!(text_foo.size(), 112);
    assert_eq!(text_foo.name(), "foo");

    // The .rodata "foo" has no partner in its own section.
    let rodata_foo: Vec<NodeRef<'_>> =
        clustered.iter().filter(|n| !n.is_group() && n.full_name() == "foo").collect();
    assert_eq!(rodata_foo.len(), 1);
    assert_eq!(rodata_foo[0].section_name(), ".rodata");
}

#[test]
fn nameless_symbols_are_never_merged() {
    let clustered = raw().clustered();
    let nameless = clustered.iter().filter(|n| n.full_name().is_empty()).count();
    assert_eq!(nameless, 2);
    assert!(clustered.iter().filter(|n| n.full_name().is_empty()).all(|n| !n.is_group()));
}

#[test]
fn clustering_preserves_totals_and_leaves() {
    let input = raw();
    let clustered = input.clustered();

    assert_eq!(clustered.size(), input.size());
    assert_eq!(clustered.pss(), input.pss());
    assert_eq!(leaf_ids(&clustered), leaf_ids(&input));
    assert_eq!(clustered.iter_leaf_symbols().count(), input.len());
    // foo(.text), gaps, bar, foo(.rodata), two nameless .data symbols.
    assert_eq!(clustered.len(), 6);
}

#[test]
fn clustering_is_idempotent() {
    let once = raw().clustered();
    let twice = once.clustered();
    assert_eq!(twice.len(), once.len());
    assert_eq!(full_names(&twice), full_names(&once));
    assert_eq!(twice.size(), once.size());
}

#[test]
fn size_info_clusters_lazily_and_accepts_replacement() {
    let raw_symbols = raw();
    let mut info = SizeInfo::new(BTreeMap::new(), raw_symbols, Metadata::new());

    let first: *const SymbolGroup = info.symbols();
    let second: *const SymbolGroup = info.symbols();
    assert_eq!(first, second);
    assert_eq!(info.symbols().len(), 6);

    let only_text = info.raw_symbols.where_in_section("t").expect("text");
    info.set_symbols(only_text);
    assert_eq!(full_names(info.symbols()), vec!["foo", "bar", "foo"]);
}
