//! The node-access capability surface the evaluation engine navigates through.
//!
//! The engine never inspects a [`DataSourceNode`] directly during evaluation.
//! Every structural read (children, siblings, attributes, parents) and every
//! content read goes through a [`DomFacade`], which is what makes evaluation
//! observable: an implementation is free to record which nodes it hands out.
//! [`DirectDomFacade`] is the plain pass-through used for ordinary evaluation.

use crate::datasource::{DataSourceNode, NodeType};

/// A classification tag derived from a step's node test, used to prune
/// traversal candidates. A bucket may only reject nodes the node test would
/// reject anyway, so pruning never changes which nodes end up selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket<'e> {
    /// Matches named nodes (elements, attributes, processing instructions)
    /// with the given local name.
    Name(&'e str),
    /// Matches nodes of one kind.
    Type(NodeType),
}

impl<'e> Bucket<'e> {
    pub fn matches<'a, N: DataSourceNode<'a>>(&self, node: N) -> bool {
        match self {
            Bucket::Name(name) => node.name().is_some_and(|q| q.local_part == *name),
            Bucket::Type(node_type) => node.node_type() == *node_type,
        }
    }
}

/// `None` means "no pruning": every candidate passes.
pub fn matches_bucket<'a, N: DataSourceNode<'a>>(node: N, bucket: Option<&Bucket>) -> bool {
    bucket.is_none_or(|b| b.matches(node))
}

/// Scans forward through the siblings of `node`, skipping any that do not
/// match `bucket`, and returns the first match. Skipped siblings are never
/// surfaced to the caller.
pub fn scan_next_sibling<'a, N: DataSourceNode<'a>>(node: N, bucket: Option<&Bucket>) -> Option<N> {
    let parent = node.parent()?;
    let mut seen_self = false;
    for sibling in parent.children() {
        if seen_self && matches_bucket(sibling, bucket) {
            return Some(sibling);
        }
        if sibling == node {
            seen_self = true;
        }
    }
    None
}

/// Scans backward through the siblings of `node`, skipping any that do not
/// match `bucket`, and returns the closest preceding match.
pub fn scan_previous_sibling<'a, N: DataSourceNode<'a>>(
    node: N,
    bucket: Option<&Bucket>,
) -> Option<N> {
    let parent = node.parent()?;
    let mut previous = None;
    for sibling in parent.children() {
        if sibling == node {
            return previous;
        }
        if matches_bucket(sibling, bucket) {
            previous = Some(sibling);
        }
    }
    None
}

/// The full capability set the evaluation engine requires of a tree accessor.
///
/// Of all methods, only [`data`](DomFacade::data) reads node content; the rest
/// expose structure. Implementations that track dependencies key off that
/// distinction: enumerating children or scanning past siblings reveals nothing
/// about a node's content, so those reads do not make the result depend on it.
pub trait DomFacade<'a, N: DataSourceNode<'a>> {
    /// All attribute nodes of an element.
    fn all_attributes(&self, node: N) -> Vec<N>;

    /// The current string value of the named attribute, if present.
    fn attribute_value(&self, node: N, name: &str) -> Option<String>;

    /// Child nodes of a container, optionally narrowed to `bucket`.
    fn child_nodes(&self, node: N, bucket: Option<&Bucket>) -> Vec<N>;

    /// The content of an attribute, text, comment, or processing-instruction
    /// node.
    fn data(&self, node: N) -> String;

    /// The first child matching `bucket`, if any.
    fn first_child(&self, node: N, bucket: Option<&Bucket>) -> Option<N>;

    /// The last child matching `bucket`, if any.
    fn last_child(&self, node: N, bucket: Option<&Bucket>) -> Option<N>;

    /// The next sibling matching `bucket`, skipping non-matching siblings.
    fn next_sibling(&self, node: N, bucket: Option<&Bucket>) -> Option<N>;

    /// The previous sibling matching `bucket`, skipping non-matching siblings.
    fn previous_sibling(&self, node: N, bucket: Option<&Bucket>) -> Option<N>;

    /// The structural parent of a node.
    fn parent_node(&self, node: N) -> Option<N>;

    /// The string value of a node as defined by XPath 1.0 `string()`,
    /// assembled exclusively from `child_nodes` and `data` so that every
    /// content read passes through the facade.
    fn string_value(&self, node: N) -> String {
        match node.node_type() {
            NodeType::Attribute
            | NodeType::Text
            | NodeType::Comment
            | NodeType::ProcessingInstruction => self.data(node),
            NodeType::Root | NodeType::Element => {
                let mut value = String::new();
                let mut queue = self.child_nodes(node, None);
                queue.reverse();
                while let Some(current) = queue.pop() {
                    match current.node_type() {
                        NodeType::Text => value.push_str(&self.data(current)),
                        NodeType::Element => {
                            let mut grandchildren = self.child_nodes(current, None);
                            grandchildren.reverse();
                            queue.append(&mut grandchildren);
                        }
                        _ => {}
                    }
                }
                value
            }
        }
    }
}

/// A pass-through facade: navigation straight from the data source, no
/// interception.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectDomFacade;

impl<'a, N: DataSourceNode<'a>> DomFacade<'a, N> for DirectDomFacade {
    fn all_attributes(&self, node: N) -> Vec<N> {
        node.attributes().collect()
    }

    fn attribute_value(&self, node: N, name: &str) -> Option<String> {
        node.attributes()
            .find(|attr| attr.name().is_some_and(|q| q.local_part == name))
            .map(|attr| attr.string_value())
    }

    fn child_nodes(&self, node: N, bucket: Option<&Bucket>) -> Vec<N> {
        node.children()
            .filter(|child| matches_bucket(*child, bucket))
            .collect()
    }

    fn data(&self, node: N) -> String {
        node.string_value()
    }

    fn first_child(&self, node: N, bucket: Option<&Bucket>) -> Option<N> {
        node.children().find(|child| matches_bucket(*child, bucket))
    }

    fn last_child(&self, node: N, bucket: Option<&Bucket>) -> Option<N> {
        node.children()
            .filter(|child| matches_bucket(*child, bucket))
            .last()
    }

    fn next_sibling(&self, node: N, bucket: Option<&Bucket>) -> Option<N> {
        scan_next_sibling(node, bucket)
    }

    fn previous_sibling(&self, node: N, bucket: Option<&Bucket>) -> Option<N> {
        scan_previous_sibling(node, bucket)
    }

    fn parent_node(&self, node: N) -> Option<N> {
        node.parent()
    }
}
