//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! All traversal goes through the [`DomFacade`] so that a facade
//! implementation sees every structural read the engine performs.

use crate::datasource::DataSourceNode;
use crate::facade::{Bucket, DomFacade};
use std::collections::HashSet;

fn add_node<'a, N: DataSourceNode<'a>>(node: N, seen: &mut HashSet<N>, results: &mut Vec<N>) {
    if seen.insert(node) {
        results.push(node);
    }
}

pub fn collect_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    add_node(node, seen, results);
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    bucket: Option<&Bucket>,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    for child in dom.child_nodes(node, bucket) {
        add_node(child, seen, results);
    }
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    for attr in dom.all_attributes(node) {
        add_node(attr, seen, results);
    }
}

/// Document-order walk over all descendants using first-child/next-sibling
/// traversal. No bucket is applied: pruning a container would also hide the
/// matching nodes inside it.
pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut ancestors: Vec<N> = Vec::new();
    let mut current = dom.first_child(node, None);
    while let Some(n) = current {
        add_node(n, seen, results);
        if let Some(child) = dom.first_child(n, None) {
            ancestors.push(n);
            current = Some(child);
            continue;
        }
        let mut next = dom.next_sibling(n, None);
        while next.is_none() {
            match ancestors.pop() {
                Some(parent) => next = dom.next_sibling(parent, None),
                None => break,
            }
        }
        current = next;
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    add_node(node, seen, results);
    collect_descendant_nodes(dom, node, seen, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    if let Some(parent) = dom.parent_node(node) {
        add_node(parent, seen, results);
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = dom.parent_node(node);
    while let Some(parent) = current {
        add_node(parent, seen, results);
        current = dom.parent_node(parent);
    }
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    bucket: Option<&Bucket>,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = dom.next_sibling(node, bucket);
    while let Some(sibling) = current {
        add_node(sibling, seen, results);
        current = dom.next_sibling(sibling, bucket);
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    bucket: Option<&Bucket>,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut collected = Vec::new();
    let mut current = dom.previous_sibling(node, bucket);
    while let Some(sibling) = current {
        collected.push(sibling);
        current = dom.previous_sibling(sibling, bucket);
    }
    // Results are kept in document order.
    for sibling in collected.into_iter().rev() {
        add_node(sibling, seen, results);
    }
}

pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = Some(node);
    while let Some(c) = current {
        let mut sibling = dom.next_sibling(c, None);
        while let Some(s) = sibling {
            collect_descendant_or_self_nodes(dom, s, seen, results);
            sibling = dom.next_sibling(s, None);
        }
        current = dom.parent_node(c);
    }
}

pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(
    dom: &dyn DomFacade<'a, N>,
    node: N,
    seen: &mut HashSet<N>,
    results: &mut Vec<N>,
) {
    let mut current = Some(node);
    while let Some(c) = current {
        let mut collected = Vec::new();
        let mut sibling = dom.previous_sibling(c, None);
        while let Some(s) = sibling {
            collected.push(s);
            sibling = dom.previous_sibling(s, None);
        }
        for s in collected.into_iter().rev() {
            collect_descendant_or_self_nodes(dom, s, seen, results);
        }
        current = dom.parent_node(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};
    use crate::facade::DirectDomFacade;

    #[test]
    fn test_collect_child() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let root = MockNode { id: 0, tree: &tree };
        let entry1 = MockNode { id: 1, tree: &tree };
        let comment = MockNode { id: 5, tree: &tree };
        let sep = MockNode { id: 6, tree: &tree };
        let pi = MockNode { id: 7, tree: &tree };
        let entry2 = MockNode { id: 8, tree: &tree };
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_child_nodes(&dom, root, None, &mut seen, &mut results);
        assert_eq!(results, vec![entry1, comment, sep, pi, entry2]);

        seen.clear();
        let mut bucketed = Vec::new();
        let bucket = crate::facade::Bucket::Name("entry");
        collect_child_nodes(&dom, root, Some(&bucket), &mut seen, &mut bucketed);
        assert_eq!(bucketed, vec![entry1, entry2]);
    }

    #[test]
    fn test_collect_ancestor() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let root = MockNode { id: 0, tree: &tree };
        let entry = MockNode { id: 1, tree: &tree };
        let text = MockNode { id: 4, tree: &tree };
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_ancestor_nodes(&dom, text, &mut seen, &mut results);
        assert_eq!(results, vec![entry, root]);
    }

    #[test]
    fn test_collect_descendant_in_document_order() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let root = MockNode { id: 0, tree: &tree };
        let expected: Vec<_> = [1, 4, 5, 6, 7, 8, 9]
            .iter()
            .map(|&id| MockNode { id, tree: &tree })
            .collect();
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        collect_descendant_nodes(&dom, root, &mut seen, &mut results);
        assert_eq!(results, expected);
    }

    #[test]
    fn test_collect_siblings() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let entry1 = MockNode { id: 1, tree: &tree };
        let comment = MockNode { id: 5, tree: &tree };
        let sep = MockNode { id: 6, tree: &tree };
        let pi = MockNode { id: 7, tree: &tree };
        let entry2 = MockNode { id: 8, tree: &tree };

        let mut seen = HashSet::new();
        let mut following = Vec::new();
        collect_following_sibling_nodes(&dom, entry1, None, &mut seen, &mut following);
        assert_eq!(following, vec![comment, sep, pi, entry2]);

        seen.clear();
        let mut preceding = Vec::new();
        collect_preceding_sibling_nodes(&dom, entry2, None, &mut seen, &mut preceding);
        assert_eq!(preceding, vec![entry1, comment, sep, pi]);

        // A bucket narrows the scan without surfacing skipped siblings.
        seen.clear();
        let bucket = crate::facade::Bucket::Name("entry");
        let mut bucketed = Vec::new();
        collect_following_sibling_nodes(&dom, entry1, Some(&bucket), &mut seen, &mut bucketed);
        assert_eq!(bucketed, vec![entry2]);
    }

    #[test]
    fn test_collect_following_preceding() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let entry1 = MockNode { id: 1, tree: &tree };
        let text1 = MockNode { id: 4, tree: &tree };
        let comment = MockNode { id: 5, tree: &tree };
        let sep = MockNode { id: 6, tree: &tree };
        let pi = MockNode { id: 7, tree: &tree };
        let entry2 = MockNode { id: 8, tree: &tree };
        let text2 = MockNode { id: 9, tree: &tree };

        let mut seen = HashSet::new();
        let mut following = Vec::new();
        // The following of the text node "First" are all of its parent's
        // following siblings and their descendants.
        collect_following_nodes(&dom, text1, &mut seen, &mut following);
        following.sort();
        assert_eq!(following, vec![comment, sep, pi, entry2, text2]);

        seen.clear();
        let mut preceding = Vec::new();
        collect_preceding_nodes(&dom, sep, &mut seen, &mut preceding);
        preceding.sort();
        assert_eq!(preceding, vec![entry1, text1, comment]);
    }
}
