mod common;

use binsize_core::{
    BaseSymbol, RawSymbol, SizeError, SymbolFlags, SymbolGroup, SymbolId, SymbolTableBuilder,
};

#[test]
fn symbol_derived_fields() {
    let mut builder = SymbolTableBuilder::new();
    let raw = RawSymbol::new(".text", 40)
        .named("foo")
        .at(0x100)
        .with_padding(4)
        .with_paths("base/foo.cc", "obj/base/foo.o");
    let id = builder.push(raw).expect("push");
    let table = builder.freeze();
    let symbol = table.get(id).expect("symbol");

    assert_eq!(symbol.section(), 't');
    assert_eq!(symbol.size_without_padding(), 36);
    assert_eq!(symbol.end_address(), 0x100 + 36);
    assert_eq!(symbol.num_aliases(), 1);
    assert_eq!(symbol.pss(), 40.0);
    assert_eq!(symbol.pss_without_padding(), 36.0);
    assert!(!symbol.is_bss());
    assert!(!symbol.is_group());
    assert_eq!(
        format!("{:?}", symbol),
        ".text@100(size_without_padding=36,padding=4,full_name=foo,\
         object_path=obj/base/foo.o,source_path=base/foo.cc,flags={})"
    );
}

#[test]
fn flags_string_lists_present_flags_in_order() {
    let mut builder = SymbolTableBuilder::new();
    let plain = builder.push(RawSymbol::new(".text", 4).named("plain")).expect("push");
    let flags = SymbolFlags::CLONE | SymbolFlags::ANONYMOUS | SymbolFlags::REL_LOCAL;
    let flagged =
        builder.push(RawSymbol::new(".text", 4).named("flagged").with_flags(flags)).expect("push");
    let a = builder.push(RawSymbol::new(".text", 8).named("a").at(0x40)).expect("push");
    let b = builder.push(RawSymbol::new(".text", 8).named("b").at(0x40)).expect("push");
    builder.add_alias_group(&[a, b]).expect("alias group");
    let table = builder.freeze();

    assert_eq!(table.get(plain).expect("plain").flags_string(), "{}");
    assert_eq!(table.get(flagged).expect("flagged").flags_string(), "{anon,rel.loc,clone}");
    assert_eq!(table.get(a).expect("a").flags_string(), "{2 aliases}");
}

#[test]
fn raw_flag_bits_are_truncated_to_known_flags() {
    let mut builder = SymbolTableBuilder::new();
    let mut raw = RawSymbol::new(".text", 4).named("f");
    raw.flags = 2 | 1024;
    let id = builder.push(raw).expect("push");
    let table = builder.freeze();
    assert_eq!(table.get(id).expect("symbol").flags(), SymbolFlags::STARTUP);
}

#[test]
fn aliases_share_size_without_double_counting() {
    let mut builder = SymbolTableBuilder::new();
    let a = builder.push(RawSymbol::new(".text", 40).named("a").at(0x100)).expect("push");
    let b = builder.push(RawSymbol::new(".text", 40).named("b").at(0x100)).expect("push");
    let c = builder.push(RawSymbol::new(".text", 10).named("c").at(0x200)).expect("push");
    let group = builder.add_alias_group(&[a, b]).expect("alias group");
    let table = builder.freeze();

    let sym_a = table.get(a).expect("a");
    assert_eq!(sym_a.num_aliases(), 2);
    assert_eq!(sym_a.pss(), 20.0);
    assert_eq!(sym_a.aliases(), Some(group));
    assert_eq!(table.alias_group(group), &[a, b]);
    assert_eq!(table.aliases_of(b).len(), 2);
    assert_eq!(table.aliases_of(c).len(), 1);
    assert_eq!(table.alias_group_count(), 1);

    let all = SymbolGroup::from_table(table);
    assert_eq!(all.size(), 50);
    assert_eq!(all.pss(), 50.0);
    assert_eq!(all.count_unique_symbols(), 2);
    assert_eq!(all.len(), 3);
}

#[test]
fn alias_group_declarations_are_validated() {
    let mut builder = SymbolTableBuilder::new();
    let a = builder.push(RawSymbol::new(".text", 4).named("a").at(0x10)).expect("push");
    let b = builder.push(RawSymbol::new(".text", 4).named("b").at(0x10)).expect("push");
    let c = builder.push(RawSymbol::new(".text", 4).named("c").at(0x20)).expect("push");
    let d = builder.push(RawSymbol::new(".text", 4).named("d").at(0x10)).expect("push");

    assert!(matches!(builder.add_alias_group(&[a]), Err(SizeError::AliasGroup(_))));
    assert!(matches!(builder.add_alias_group(&[a, c]), Err(SizeError::AliasGroup(_))));
    assert!(matches!(builder.add_alias_group(&[a, a]), Err(SizeError::AliasGroup(_))));

    builder.add_alias_group(&[a, b]).expect("valid group");
    assert!(matches!(builder.add_alias_group(&[b, d]), Err(SizeError::AliasGroup(_))));
    assert!(matches!(builder.id_at(9), Err(SizeError::UnknownSymbol(9))));
}

#[test]
fn generated_source_is_set_by_annotation_pass() {
    let mut builder = SymbolTableBuilder::new();
    let id = builder.push(RawSymbol::new(".rodata", 12).named("kTable")).expect("push");
    builder.set_generated_source(id, true).expect("known symbol");
    let table = builder.freeze();

    let symbol = table.get(id).expect("symbol");
    assert!(symbol.generated_source());
    assert_eq!(symbol.flags_string(), "{gen}");
    assert_eq!(symbol.section(), 'r');
}

#[test]
fn toolchain_generated_names() {
    let group = common::group_of(vec![
        common::text("foo.cold.1", 4),
        common::text("vtable[abi:cxx11]", 4),
        common::text("operator[]", 4),
        common::text("Bar", 4),
    ]);
    let names: Vec<String> = group
        .where_generated_by_toolchain()
        .iter()
        .map(|n| n.name().to_string())
        .collect();
    assert_eq!(names, vec!["foo.cold.1", "vtable[abi:cxx11]"]);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn symbol_ids_are_limited_to_32_bits() {
    let id = SymbolId::try_from(7usize).expect("small index");
    assert_eq!(id.index(), 7);
    let largest = u32::MAX as usize;
    assert_eq!(SymbolId::try_from(largest).map(SymbolId::index).ok(), Some(largest));

    let too_big = u32::MAX as usize + 1;
    match SymbolId::try_from(too_big) {
        Err(SizeError::TableFull(count)) => assert_eq!(count, too_big),
        other => panic!("expected a full table, got {:?}", other),
    }
}
