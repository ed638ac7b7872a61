//! Version range expressions as used by KDM add-on template keys.
//!
//! Grammar:
//! - comparators: `<`, `<=`, `>`, `>=`, `=`, `==`, `!=`, `!`, or a bare version (equality)
//! - whitespace separated comparators must all match (`>=1.21.0 <1.24.0`)
//! - `||` separates alternatives (`<1.16.0 || >=1.20.0`)
//! - an `x` component widens a comparator to its family (`1.2.x`, `>=1.x`)
//!
//! Ordering follows semver precedence, so `1.24.0-rancher1-1` sits below `1.24.0`
//! and pre-release versions take part in range checks like any other.

use std::cmp::Ordering;

use semver::Version;
use thiserror::Error;

use crate::version::strip_v;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid range [{range}]: {reason}")]
pub struct RangeParseError {
    pub range: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Comparator {
    Eq(Version),
    Ne(Version),
    Gt(Version),
    Ge(Version),
    Lt(Version),
    Le(Version),
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Eq(v) => version.cmp_precedence(v) == Ordering::Equal,
            Self::Ne(v) => version.cmp_precedence(v) != Ordering::Equal,
            Self::Gt(v) => version.cmp_precedence(v) == Ordering::Greater,
            Self::Ge(v) => version.cmp_precedence(v) != Ordering::Less,
            Self::Lt(v) => version.cmp_precedence(v) == Ordering::Less,
            Self::Le(v) => version.cmp_precedence(v) != Ordering::Greater,
        }
    }
}

/// A single alternative: every comparator must match. A wildcard `!=` expands to an
/// inner disjunction, hence the nested `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Conjunction(Vec<Vec<Comparator>>);

impl Conjunction {
    fn matches(&self, version: &Version) -> bool {
        self.0
            .iter()
            .all(|any_of| any_of.iter().any(|c| c.matches(version)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    alternatives: Vec<Conjunction>,
}

impl VersionRange {
    pub fn parse(range: &str) -> Result<Self, RangeParseError> {
        let err = |reason: String| RangeParseError {
            range: range.to_string(),
            reason,
        };

        let mut alternatives = Vec::new();
        for alternative in range.split("||") {
            let tokens = tokenize(alternative);
            if tokens.is_empty() {
                return Err(err("empty range alternative".to_string()));
            }
            let mut conjunction = Vec::new();
            for token in tokens {
                conjunction.extend(parse_comparator(&token).map_err(&err)?);
            }
            alternatives.push(Conjunction(conjunction));
        }

        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|a| a.matches(version))
    }
}

/// Splits on whitespace, gluing a dangling operator to the version that follows it
/// so `>= 1.2.0` reads the same as `>=1.2.0`.
fn tokenize(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_operator: Option<String> = None;
    for word in alternative.split_whitespace() {
        if word.chars().all(|c| matches!(c, '<' | '>' | '=' | '!')) {
            let mut op = pending_operator.take().unwrap_or_default();
            op.push_str(word);
            pending_operator = Some(op);
            continue;
        }
        match pending_operator.take() {
            Some(op) => tokens.push(format!("{op}{word}")),
            None => tokens.push(word.to_string()),
        }
    }
    if let Some(op) = pending_operator {
        tokens.push(op);
    }
    tokens
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in [">=", "<=", "!=", "==", ">", "<", "=", "!"] {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn parse_comparator(token: &str) -> Result<Vec<Vec<Comparator>>, String> {
    let (op, raw_version) = split_operator(token);
    if raw_version.is_empty() {
        return Err(format!("operator [{op}] without a version"));
    }
    let raw_version = strip_v(raw_version);

    if is_wildcard(raw_version) {
        let (floor, ceiling) = expand_wildcard(raw_version)?;
        let expanded = match op {
            "" | "=" | "==" => vec![vec![Comparator::Ge(floor)], vec![Comparator::Lt(ceiling)]],
            "!=" | "!" => vec![vec![Comparator::Lt(floor), Comparator::Ge(ceiling)]],
            ">" => vec![vec![Comparator::Ge(ceiling)]],
            ">=" => vec![vec![Comparator::Ge(floor)]],
            "<" => vec![vec![Comparator::Lt(floor)]],
            "<=" => vec![vec![Comparator::Lt(ceiling)]],
            other => return Err(format!("unsupported operator [{other}]")),
        };
        return Ok(expanded);
    }

    let version = Version::parse(raw_version).map_err(|e| format!("[{raw_version}]: {e}"))?;
    let comparator = match op {
        "" | "=" | "==" => Comparator::Eq(version),
        "!=" | "!" => Comparator::Ne(version),
        ">" => Comparator::Gt(version),
        ">=" => Comparator::Ge(version),
        "<" => Comparator::Lt(version),
        "<=" => Comparator::Le(version),
        other => return Err(format!("unsupported operator [{other}]")),
    };
    Ok(vec![vec![comparator]])
}

fn is_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| part.eq_ignore_ascii_case("x") || part == "*")
}

/// `1.2.x` -> (`1.2.0`, `1.3.0`), `1.x` -> (`1.0.0`, `2.0.0`).
fn expand_wildcard(version: &str) -> Result<(Version, Version), String> {
    let parts: Vec<&str> = version.split('.').collect();
    let numeric = |part: &str| {
        part.parse::<u64>()
            .map_err(|_| format!("[{version}] is not a valid wildcard version"))
    };
    let is_x = |part: &str| part.eq_ignore_ascii_case("x") || part == "*";
    let bump = |n: u64| {
        n.checked_add(1)
            .ok_or_else(|| format!("[{version}] has no upper bound"))
    };

    match parts.as_slice() {
        [major, minor, patch] if !is_x(major) && !is_x(minor) && is_x(patch) => {
            let (major, minor) = (numeric(major)?, numeric(minor)?);
            Ok((Version::new(major, minor, 0), Version::new(major, bump(minor)?, 0)))
        }
        [major, minor] | [major, minor, _] if !is_x(major) && is_x(minor) => {
            let major = numeric(major)?;
            Ok((Version::new(major, 0, 0), Version::new(bump(major)?, 0, 0)))
        }
        _ => Err(format!("[{version}] is not a valid wildcard version")),
    }
}
