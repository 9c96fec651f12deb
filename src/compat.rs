//! Pick a library version compatible with a CodeGame protocol version.
//!
//! Client libraries publish a `versions.json` mapping each library version to
//! the CG version it implements:
//!
//! ```json
//! { "0.1": "0.6", "0.2": "0.7", "1.0": "0.7" }
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

/// Returned when nothing in the map fits.
pub const LATEST: &str = "latest";

/// Highest library version whose CG version is compatible with `cg_version`.
///
/// A CG version `a.b` is compatible with the requested `x.y` when `a == x`
/// and either `x == 0 && b == y` (pre-1.0 minors break) or `x >= 1 && b <= y`.
/// Falls back to [`LATEST`] if `cg_version` doesn't parse or nothing matches.
pub fn compatible_version(versions: &HashMap<String, String>, cg_version: &str) -> String {
    let Some(wanted) = major_minor(cg_version) else {
        return LATEST.to_string();
    };

    versions
        .iter()
        .filter(|(_, cg)| major_minor(cg).is_some_and(|have| is_compatible(have, wanted)))
        .map(|(library, _)| library)
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
        .unwrap_or_else(|| LATEST.to_string())
}

fn is_compatible(have: (u64, u64), wanted: (u64, u64)) -> bool {
    if have.0 != wanted.0 {
        return false;
    }
    if wanted.0 == 0 {
        have.1 == wanted.1
    } else {
        have.1 <= wanted.1
    }
}

fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major, minor))
}

/// Order dotted versions by their numeric components; `1.10` sorts above
/// `1.9` and `1.0` equals `1`. Textual order breaks remaining ties.
fn compare_versions(a: &str, b: &str) -> Ordering {
    numeric_key(a).cmp(&numeric_key(b)).then_with(|| a.cmp(b))
}

fn numeric_key(version: &str) -> Vec<u64> {
    let mut key: Vec<u64> = version.split('.').filter_map(|s| s.parse().ok()).collect();
    while key.last() == Some(&0) {
        key.pop();
    }
    key
}
