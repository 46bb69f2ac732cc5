//! Version ordering for dotted project versions and numeric agent revisions.
//!
//! Both comparators return ascending order; display sites want newest first
//! and call `.reverse()` on the result themselves.

use std::cmp::Ordering;

/// Total order over dotted version strings.
///
/// Each string splits on `.`; components parse as non-negative integers and
/// pad with zeros up to major.minor.patch, so `"1.2"` equals `"1.2.0"`.
/// Unparseable components and wholly empty strings read as 0, which makes
/// the order total over arbitrary input instead of failing on it.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    version_components(a).cmp(&version_components(b))
}

fn version_components(version: &str) -> [u64; 3] {
    let mut components = [0u64; 3];
    for (i, piece) in version.split('.').take(3).enumerate() {
        components[i] = piece.trim().parse().unwrap_or(0);
    }
    components
}

/// Order for agent revisions. Trivial today, but keeps the display-side
/// sorting symmetric with [`compare_versions`].
pub fn compare_agent_versions(a: i64, b: i64) -> Ordering {
    a.cmp(&b)
}
