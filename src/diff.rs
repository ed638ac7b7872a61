//! Set differences over ordered string lists.
//!
//! Membership is exact string equality. Neither function sorts or deduplicates its
//! output; callers do that when they need a display order.

use std::collections::HashSet;

/// Elements of `left` missing from `right`, followed by elements of `right` missing
/// from `left`. Each half keeps its input order.
pub fn diff_symmetric<S: AsRef<str>>(left: &[S], right: &[S]) -> Vec<String> {
    let mut out = diff_one_way(left, right);
    out.extend(diff_one_way(right, left));
    out
}

/// Elements of `left` missing from `right`, in `left` order.
pub fn diff_one_way<S: AsRef<str>>(left: &[S], right: &[S]) -> Vec<String> {
    let present: HashSet<&str> = right.iter().map(|item| item.as_ref()).collect();
    left.iter()
        .map(|item| item.as_ref())
        .filter(|item| !present.contains(item))
        .map(str::to_string)
        .collect()
}

/// Drops repeated entries, keeping the first occurrence of each.
pub fn unique<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| item.as_ref())
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_way_keeps_left_order() {
        assert_eq!(diff_one_way(&["a", "b", "c"], &["b"]), strings(&["a", "c"]));
    }

    #[test]
    fn one_way_of_self_is_empty() {
        let items = ["x", "y", "x"];
        assert!(diff_one_way(&items, &items).is_empty());
    }

    #[test]
    fn one_way_result_is_subset_of_left() {
        let left = ["v1.24.10", "v1.25.6", "v1.26.1"];
        let right = ["v1.25.6", "v1.27.0"];
        for item in diff_one_way(&left, &right) {
            assert!(left.contains(&item.as_str()));
            assert!(!right.contains(&item.as_str()));
        }
    }

    #[test]
    fn symmetric_of_disjoint_lists_is_concatenation() {
        let left = ["a", "b"];
        let right = ["c", "d", "e"];
        let diff = diff_symmetric(&left, &right);
        assert_eq!(diff.len(), left.len() + right.len());
        assert_eq!(diff, strings(&["a", "b", "c", "d", "e"]));
    }

    #[test]
    fn symmetric_lists_left_then_right_leftovers() {
        let left = ["v1.23.16", "v1.24.10", "v1.25.6"];
        let right = ["v1.24.10", "v1.25.6", "v1.26.1"];
        assert_eq!(
            diff_symmetric(&left, &right),
            strings(&["v1.23.16", "v1.26.1"])
        );
    }

    #[test]
    fn symmetric_of_self_is_empty() {
        let items = ["a", "a", "b"];
        assert!(diff_symmetric(&items, &items).is_empty());
    }

    #[test]
    fn empty_side_returns_other_side() {
        let empty: [&str; 0] = [];
        let items = ["a", "b"];
        assert_eq!(diff_one_way(&items, &empty), strings(&["a", "b"]));
        assert!(diff_one_way(&empty, &items).is_empty());
        assert_eq!(diff_symmetric(&empty, &items), strings(&["a", "b"]));
        assert_eq!(diff_symmetric(&items, &empty), strings(&["a", "b"]));
    }

    #[test]
    fn equality_is_exact() {
        assert_eq!(
            diff_symmetric(&["Etcd"], &["etcd"]),
            strings(&["Etcd", "etcd"])
        );
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        assert_eq!(
            unique(&["b", "a", "b", "c", "a"]),
            strings(&["b", "a", "c"])
        );
    }
}
