use binsize_core::{version, SizeInfo, SizeInfoDiff, SymbolGroup, SymbolTable};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

#[test]
fn trees_and_snapshots_can_be_shared_across_threads() {
    assert_send_sync::<SymbolTable>();
    assert_send_sync::<SymbolGroup>();
    assert_send_sync::<SizeInfo>();
    assert_send_sync::<SizeInfoDiff>();
}
