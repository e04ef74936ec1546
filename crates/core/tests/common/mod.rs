#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Context;
use binsize_core::{RawSnapshot, RawSymbol, SizeInfo, SymbolGroup, SymbolTableBuilder};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Flat group over a fresh table holding `symbols` in order.
pub fn group_of(symbols: Vec<RawSymbol>) -> SymbolGroup {
    let mut builder = SymbolTableBuilder::new();
    for symbol in symbols {
        builder.push(symbol).expect("push");
    }
    SymbolGroup::from_table(builder.freeze())
}

pub fn text(name: &str, size: i64) -> RawSymbol {
    RawSymbol::new(".text", size).named(name)
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

pub fn load_snapshot(name: &str) -> anyhow::Result<SizeInfo> {
    let path = fixture_path(name);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let raw: RawSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing fixture {}", path.display()))?;
    Ok(SizeInfo::from_raw(raw)?)
}
