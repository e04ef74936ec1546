mod common;

use binsize_core::{BaseSymbol, DiffCounts, RawSnapshot, SizeError, SizeInfo, SizeInfoDiff};
use chrono::Datelike;

#[test]
fn snapshot_loads_symbols_aliases_and_metadata() -> anyhow::Result<()> {
    common::init_logging();
    let info = common::load_snapshot("before.json")?;

    assert_eq!(info.raw_symbols.len(), 6);
    assert_eq!(info.raw_symbols.table().alias_group_count(), 1);
    // Foo and Bar share 40 bytes.
    assert_eq!(info.raw_symbols.size(), 120);
    assert_eq!(info.raw_symbols.pss(), 104.0);
    assert_eq!(info.section_sizes.get(".rodata"), Some(&40));

    let counter = info.raw_symbols.where_in_section("b")?;
    assert_eq!(counter.len(), 1);
    assert!(counter.get(0).map(|n| n.is_anonymous()).unwrap_or(false));
    assert_eq!(counter.get(0).map(|n| n.flags_string()), Some("{anon}".to_string()));

    let metadata = &info.metadata;
    assert_eq!(metadata.git_revision(), Some("4f2c1e9"));
    assert_eq!(metadata.elf_architecture(), Some("arm"));
    assert_eq!(metadata.elf_file_name(), Some("libmain.so"));
    assert_eq!(metadata.elf_mtime().map(|t| t.year()), Some(2017));
    assert_eq!(metadata.gn_args(), vec!["is_debug=false", "symbol_level=1"]);
    assert_eq!(metadata.tool_prefix(), None);
    Ok(())
}

#[test]
fn aliased_address_lookup_is_ambiguous() -> anyhow::Result<()> {
    let info = common::load_snapshot("before.json")?;
    match info.raw_symbols.by_hex_address("0x1000") {
        Err(SizeError::AddressLookup { count, .. }) => assert_eq!(count, 2),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(node) => panic!("expected an ambiguous lookup, got {:?}", node),
    }
    assert_eq!(info.raw_symbols.by_hex_address("0x2000")?.name(), "Baz");
    Ok(())
}

#[test]
fn snapshot_symbols_are_clustered() -> anyhow::Result<()> {
    let info = common::load_snapshot("before.json")?;
    let symbols = info.symbols();

    // Foo, Bar, Baz, the gap cluster and g_counter.
    assert_eq!(symbols.len(), 5);
    assert_eq!(symbols.size(), info.raw_symbols.size());
    let gaps = symbols.iter().find(|n| n.full_name() == "** symbol gaps").expect("gap cluster");
    assert!(gaps.is_group());
    assert_eq!(gaps.size(), 40);
    Ok(())
}

#[test]
fn snapshot_diff_matches_expected_counts() -> anyhow::Result<()> {
    let before = common::load_snapshot("before.json")?;
    let after = common::load_snapshot("after.json")?;
    let delta = SizeInfoDiff::new(&before, &after)?;

    let expected = DiffCounts { added: 1, removed: 1, changed: 3, unchanged: 2 };
    let raw_view = delta.raw_symbols.as_diff().expect("diff tree");
    assert_eq!(raw_view.counts(), expected);
    let clustered_view = delta.symbols().as_diff().expect("diff tree");
    assert_eq!(clustered_view.counts(), expected);

    // +16 Qux, -24 Baz, +8 shared by Foo and Bar, +4 gap.
    assert_eq!(delta.raw_symbols.size(), 4);
    assert_eq!(delta.section_sizes.get(".rodata"), Some(&4));
    assert_eq!(delta.section_sizes.get(".text"), Some(&0));
    assert_eq!(delta.before_metadata.git_revision(), Some("4f2c1e9"));
    assert_eq!(delta.after_metadata.git_revision(), Some("9d07a3b"));

    let changed = raw_view.where_not_unchanged();
    assert_eq!(changed.len(), 5);
    Ok(())
}

#[test]
fn malformed_alias_groups_are_rejected() -> anyhow::Result<()> {
    let path = common::fixture_path("before.json");
    let mut raw: RawSnapshot = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    raw.alias_groups = vec![vec![0, 2]];
    assert!(matches!(SizeInfo::from_raw(raw.clone()), Err(SizeError::AliasGroup(_))));

    raw.alias_groups = vec![vec![0, 42]];
    assert!(matches!(SizeInfo::from_raw(raw), Err(SizeError::UnknownSymbol(42))));
    Ok(())
}
