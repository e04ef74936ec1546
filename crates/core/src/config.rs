use serde::{Deserialize, Serialize};

/// Placeholder group name for symbols with neither a source nor an object path.
pub const NO_PATH_PLACEHOLDER: &str = "{no path}";

/// Options for [`crate::SymbolGroup::grouped_by_path`].
///
/// Deserializable so report layers can keep grouping presets alongside their
/// own configuration; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathGrouping {
    /// Leading directories to keep; `0` groups by the entire path.
    pub depth: usize,
    /// Group name used when a symbol has no path.
    pub fallback: String,
    /// Use `object_path` when `source_path` is empty.
    pub fallback_to_object_path: bool,
    /// Minimum group size; negative values drop smaller groups entirely.
    pub min_count: i32,
}

impl PathGrouping {
    pub fn new(depth: usize) -> Self {
        Self { depth, ..Self::default() }
    }

    pub fn with_min_count(mut self, min_count: i32) -> Self {
        self.min_count = min_count;
        self
    }
}

impl Default for PathGrouping {
    fn default() -> Self {
        Self {
            depth: 0,
            fallback: NO_PATH_PLACEHOLDER.to_string(),
            fallback_to_object_path: true,
            min_count: 0,
        }
    }
}
