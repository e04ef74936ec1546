//! Helpers for the regular expressions accepted by `where_*_matches` filters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::SizeResult;

static IDENTIFIER_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid placeholder regex"));

/// Expands `{{pattern}}` so that `pattern` only matches a whole identifier.
///
/// `{{foo}}` matches "foo" and "ns::foo()" but not "foobar" or "my_foo".
/// The identifier boundaries are lookarounds, so placeholders may sit next
/// to each other (`{{ns}}::{{foo}}`). The expansion needs a
/// [`fancy_regex::Regex`] to compile.
pub fn expand_identifier_placeholders(pattern: &str) -> String {
    IDENTIFIER_PLACEHOLDER
        .replace_all(pattern, |caps: &Captures<'_>| {
            format!("(?<![A-Za-z0-9_])(?:{})(?![A-Za-z0-9_])", &caps[1])
        })
        .into_owned()
}

/// Compiles a filter pattern after expanding its placeholders.
pub fn compile_pattern(pattern: &str) -> SizeResult<fancy_regex::Regex> {
    Ok(fancy_regex::Regex::new(&expand_identifier_placeholders(pattern))?)
}
