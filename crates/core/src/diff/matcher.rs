use std::collections::{HashMap, HashSet, VecDeque};

use crate::group::SymbolGroup;
use crate::model::{BaseSymbol, Symbol, SymbolId};

/// Correspondence between the leaf symbols of two trees.
///
/// `before` ids refer to the first tree's table, `after` ids to the second's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolPairing {
    /// `(before, after)` pairs of the same logical symbol.
    pub similar: Vec<(SymbolId, SymbolId)>,
    /// Symbols present only in the second tree.
    pub added: Vec<SymbolId>,
    /// Symbols present only in the first tree.
    pub removed: Vec<SymbolId>,
}

/// Trait implemented by symbol pairing strategies fed into the diff engine.
pub trait SymbolMatcher: Send + Sync {
    fn pair(&self, before: &SymbolGroup, after: &SymbolGroup) -> SymbolPairing;
    fn name(&self) -> &'static str;
}

/// Default matcher: pairs symbols by section and full name.
///
/// Nameless symbols fall back to section, object path and address. When
/// several symbols share a key they are paired in first-seen order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher;

#[derive(Debug, PartialEq, Eq, Hash)]
enum MatchKey<'a> {
    Named { section_name: &'a str, full_name: &'a str },
    Unnamed { section_name: &'a str, object_path: &'a str, address: u64 },
}

impl<'a> MatchKey<'a> {
    fn of(symbol: &'a Symbol) -> Self {
        if symbol.full_name().is_empty() {
            MatchKey::Unnamed {
                section_name: symbol.section_name(),
                object_path: symbol.object_path(),
                address: symbol.address(),
            }
        } else {
            MatchKey::Named { section_name: symbol.section_name(), full_name: symbol.full_name() }
        }
    }
}

impl SymbolMatcher for NameMatcher {
    fn pair(&self, before: &SymbolGroup, after: &SymbolGroup) -> SymbolPairing {
        let mut buckets: HashMap<MatchKey<'_>, VecDeque<SymbolId>> = HashMap::new();
        for symbol in before.iter_leaf_symbols() {
            buckets.entry(MatchKey::of(symbol)).or_default().push_back(symbol.id());
        }

        let mut pairing = SymbolPairing::default();
        let mut matched = HashSet::new();
        for symbol in after.iter_leaf_symbols() {
            let partner =
                buckets.get_mut(&MatchKey::of(symbol)).and_then(|bucket| bucket.pop_front());
            match partner {
                Some(before_id) => {
                    matched.insert(before_id);
                    pairing.similar.push((before_id, symbol.id()));
                }
                None => pairing.added.push(symbol.id()),
            }
        }
        pairing.removed = before
            .iter_leaf_symbols()
            .map(Symbol::id)
            .filter(|id| !matched.contains(id))
            .collect();
        pairing
    }

    fn name(&self) -> &'static str {
        "name"
    }
}
