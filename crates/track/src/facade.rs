//! A recording [`DomFacade`] and the accumulator it writes into.
//!
//! Structural navigation (children, siblings, parents, attribute presence) is
//! passed straight through without recording anything: enumerating nodes does
//! not make the result depend on their content. Only [`data`](DomFacade::data)
//! records, and the touched node depends on what was read:
//! - an attribute's value depends on the attribute node itself;
//! - a text, comment, or processing-instruction node's content is attributed
//!   to its parent element, since that is the node a caller would re-evaluate
//!   under.

use log::trace;
use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::Hash;

use xdep_xpath1::facade::{matches_bucket, scan_next_sibling, scan_previous_sibling};
use xdep_xpath1::{Bucket, DataSourceNode, DomFacade, NodeType};

/// Collects touched nodes across one or more evaluations.
///
/// Recording happens through a shared reference from inside facade methods
/// that take `&self`, hence the interior mutability.
#[derive(Debug)]
pub struct NodeAccumulator<N> {
    touched: RefCell<HashSet<N>>,
}

impl<N: Copy + Eq + Hash> NodeAccumulator<N> {
    pub fn new() -> Self {
        Self {
            touched: RefCell::new(HashSet::new()),
        }
    }

    pub fn record(&self, node: N) {
        self.touched.borrow_mut().insert(node);
    }

    pub fn len(&self) -> usize {
        self.touched.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.touched.borrow().is_empty()
    }

    pub fn into_set(self) -> HashSet<N> {
        self.touched.into_inner()
    }
}

impl<N: Copy + Eq + Hash> Default for NodeAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A facade that records every content read into a [`NodeAccumulator`].
///
/// The accumulator is borrowed rather than owned so that several facade
/// instances can feed one accumulator.
pub struct TrackingDomFacade<'t, N> {
    accumulator: &'t NodeAccumulator<N>,
}

impl<'t, N> TrackingDomFacade<'t, N> {
    pub fn new(accumulator: &'t NodeAccumulator<N>) -> Self {
        Self { accumulator }
    }
}

impl<'a, 't, N: DataSourceNode<'a>> DomFacade<'a, N> for TrackingDomFacade<'t, N> {
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
        match node.node_type() {
            NodeType::Attribute => {
                trace!("touched attribute node {:?}", node);
                self.accumulator.record(node);
            }
            NodeType::Text | NodeType::Comment | NodeType::ProcessingInstruction => {
                if let Some(parent) = node.parent() {
                    trace!("touched {:?} via content of {:?}", parent, node);
                    self.accumulator.record(parent);
                }
            }
            NodeType::Root | NodeType::Element => {}
        }
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
