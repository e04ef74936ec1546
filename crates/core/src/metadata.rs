use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Git revision of the source tree the binary was built from.
pub const GIT_REVISION: &str = "git_revision";
/// APK path relative to the output directory.
pub const APK_FILE_NAME: &str = "apk_file_name";
/// Linker map path relative to the output directory.
pub const MAP_FILE_NAME: &str = "map_file_name";
/// "Machine" field from the ELF header.
pub const ELF_ARCHITECTURE: &str = "elf_arch";
/// ELF path relative to the output directory.
pub const ELF_FILE_NAME: &str = "elf_file_name";
/// ELF modification time, UTC unix seconds.
pub const ELF_MTIME: &str = "elf_mtime";
pub const ELF_BUILD_ID: &str = "elf_build_id";
pub const GN_ARGS: &str = "gn_args";
/// Toolchain prefix relative to the source root.
pub const TOOL_PREFIX: &str = "tool_prefix";

/// Build provenance facts recorded alongside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn git_revision(&self) -> Option<&str> {
        self.get_str(GIT_REVISION)
    }

    pub fn apk_file_name(&self) -> Option<&str> {
        self.get_str(APK_FILE_NAME)
    }

    pub fn map_file_name(&self) -> Option<&str> {
        self.get_str(MAP_FILE_NAME)
    }

    pub fn elf_architecture(&self) -> Option<&str> {
        self.get_str(ELF_ARCHITECTURE)
    }

    pub fn elf_file_name(&self) -> Option<&str> {
        self.get_str(ELF_FILE_NAME)
    }

    pub fn elf_build_id(&self) -> Option<&str> {
        self.get_str(ELF_BUILD_ID)
    }

    pub fn tool_prefix(&self) -> Option<&str> {
        self.get_str(TOOL_PREFIX)
    }

    /// ELF modification time; `None` when absent or not a valid timestamp.
    pub fn elf_mtime(&self) -> Option<DateTime<Utc>> {
        let seconds = self.get(ELF_MTIME).and_then(Value::as_i64)?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// GN build arguments; non-string entries are skipped.
    pub fn gn_args(&self) -> Vec<&str> {
        match self.get(GN_ARGS) {
            Some(Value::Array(args)) => args.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl FromIterator<(String, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
