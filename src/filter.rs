use std::collections::HashSet;

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32String};

use crate::model::task::TaskNode;

/// Filtered view of the roots for a search query.
///
/// Candidates come from the whole tree, but only root tickets whose own text
/// matched are returned. A match found solely in a descendant surfaces
/// nothing. Root order is preserved; an empty query returns every root.
pub fn filter_roots(roots: &[TaskNode], query: &str) -> Vec<TaskNode> {
    if query.is_empty() {
        return roots.to_vec();
    }

    let matched = matching_candidates(roots, query);
    roots
        .iter()
        .filter(|root| matched.contains(&root.search_text()))
        .cloned()
        .collect()
}

/// Every `identifier + " " + title` string in the tree that fuzzy-matches.
fn matching_candidates(roots: &[TaskNode], query: &str) -> HashSet<String> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);

    let mut candidates = Vec::new();
    flatten(roots, &mut candidates);

    candidates
        .into_iter()
        .filter(|candidate| {
            let haystack = Utf32String::from(candidate.as_str());
            pattern.score(haystack.slice(..), &mut matcher).is_some()
        })
        .collect()
}

fn flatten(nodes: &[TaskNode], out: &mut Vec<String>) {
    for node in nodes {
        out.push(node.search_text());
        flatten(&node.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roots() -> Vec<TaskNode> {
        let mut parent = TaskNode::new("p", "SPR-10", "Billing overhaul");
        parent.children = vec![TaskNode::new("c", "SPR-11", "Invoice export")];
        parent.has_children = true;
        vec![
            TaskNode::new("a", "SPR-123", "Add user authentication"),
            parent,
            TaskNode::new("b", "OPS-7", "Rotate certificates"),
        ]
    }

    fn ids(nodes: &[TaskNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_everything_unchanged() {
        let all = roots();
        assert_eq!(filter_roots(&all, ""), all);
    }

    #[test]
    fn unmatched_query_is_empty() {
        assert!(filter_roots(&roots(), "xyz").is_empty());
    }

    #[test]
    fn matches_are_case_insensitive_subsequences() {
        assert_eq!(ids(&filter_roots(&roots(), "usrauth")), vec!["a"]);
        assert_eq!(ids(&filter_roots(&roots(), "ROTATE")), vec!["b"]);
    }

    #[test]
    fn identifier_is_searchable() {
        assert_eq!(ids(&filter_roots(&roots(), "ops-7")), vec!["b"]);
    }

    #[test]
    fn descendant_only_match_surfaces_nothing() {
        assert!(filter_roots(&roots(), "invoice").is_empty());
    }

    #[test]
    fn root_order_is_preserved() {
        assert_eq!(ids(&filter_roots(&roots(), "spr")), vec!["a", "p"]);
    }
}
