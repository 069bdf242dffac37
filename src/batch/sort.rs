//! Natural ordering of course files.

use std::sync::OnceLock;

use regex::Regex;

/// Sort key: files numbered `Unit N` first by N, then everything else by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// `Unit N` / `unit N` somewhere in the name
    Unit(u64, String),
    /// No unit number
    Named(String),
}

fn unit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[Uu]nit (\d+)").expect("unit pattern is valid"))
}

/// Compute the natural sort key of a file name.
pub fn natural_sort_key(name: &str) -> SortKey {
    unit_pattern()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .map(|n| SortKey::Unit(n, name.to_string()))
        .unwrap_or_else(|| SortKey::Named(name.to_string()))
}

/// Sort file names in natural order.
pub fn sort_natural<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by_cached_key(|n| natural_sort_key(n.as_ref()));
}
