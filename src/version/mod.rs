pub mod range;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use semver::Version;

use crate::error::KdmError;

pub use range::{RangeParseError, VersionRange};

pub fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

pub fn prepend_v(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Strict `MAJOR.MINOR.PATCH[-PRE][+BUILD]` parse with an optional leading `v`.
pub fn parse_semver(version: &str) -> Result<Version, KdmError> {
    Version::parse(strip_v(version.trim())).map_err(|e| KdmError::invalid_version(version, e))
}

/// Like [`parse_semver`], but pads partial versions (`2.7` -> `2.7.0`).
///
/// Returns `None` for anything that still isn't a version, e.g. `dev` or `master-head`.
pub fn parse_lenient(version: &str) -> Option<Version> {
    let stripped = strip_v(version.trim());
    let split_at = stripped.find(|c: char| c == '-' || c == '+').unwrap_or(stripped.len());
    let (core, rest) = stripped.split_at(split_at);
    let parts: Vec<&str> = core.split('.').collect();
    let padded = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => core.to_string(),
    };
    Version::parse(&format!("{padded}{rest}")).ok()
}

/// Orders two version tags by semver precedence, falling back to plain string order
/// when either side doesn't parse.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(left), Some(right)) => left.cmp_precedence(&right),
        _ => a.cmp(b),
    }
}

/// `v1.24.10-rancher1-1` -> `v1.24`. Tags with fewer than two components yield an empty string.
pub fn tag_major_version(tag: &str) -> String {
    let parts: Vec<&str> = tag.split('.').collect();
    if parts.len() < 2 {
        return String::new();
    }
    parts[..2].join(".")
}

/// Keeps the highest version for every `MAJOR.MINOR` family, sorted.
pub fn latest_per_minor(versions: &[String]) -> Vec<String> {
    let mut latest: BTreeMap<String, &String> = BTreeMap::new();
    for version in versions {
        let family = tag_major_version(version);
        let newer = latest
            .get(&family)
            .map_or(true, |current| compare_versions(version, current) == Ordering::Greater);
        if newer {
            latest.insert(family, version);
        }
    }
    let mut out: Vec<String> = latest.into_values().cloned().collect();
    out.sort();
    out
}
