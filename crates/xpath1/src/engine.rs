//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.
//!
//! All node access during evaluation is routed through the context's
//! [`DomFacade`], so a facade implementation observes exactly which parts of
//! the tree an expression reads.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::functions::{self, FunctionRegistry};
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use crate::facade::{Bucket, DomFacade};
use std::collections::{HashMap, HashSet};

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    ///
    /// For a node-set this is a pure emptiness check; it does not read any
    /// node content and therefore needs no facade.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self, dom: &dyn DomFacade<'a, N>) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                let s = nodes
                    .first()
                    .map(|&n| dom.string_value(n))
                    .unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
        }
    }

    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    pub fn to_string_value(&self, dom: &dyn DomFacade<'a, N>) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&n| dom.string_value(n))
                .unwrap_or_default(),
            XPathValue::String(s) => s.clone(),
            XPathValue::Number(n) => n.to_string(),
            XPathValue::Boolean(b) => b.to_string(),
        }
    }
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the evaluation context itself.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub functions: &'d FunctionRegistry,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'d HashMap<String, XPathValue<N>>,
    /// If true, enables strict error checking.
    pub strict: bool,
    /// The facade every node access during evaluation goes through.
    pub dom: &'d dyn DomFacade<'a, N>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context_node: N,
        root_node: N,
        functions: &'d FunctionRegistry,
        context_position: usize,
        context_size: usize,
        variables: &'d HashMap<String, XPathValue<N>>,
        strict: bool,
        dom: &'d dyn DomFacade<'a, N>,
    ) -> Self {
        Self {
            context_node,
            root_node,
            functions,
            context_position,
            context_size,
            variables,
            strict,
            dom,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Variable(name) => {
            if e_ctx.strict && !e_ctx.variables.contains_key(name) {
                return Err(XPathError::UnknownVariable(name.clone()));
            }
            Ok(e_ctx
                .variables
                .get(name)
                .cloned()
                .unwrap_or(XPathValue::String("".to_string())))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            Ok(functions::evaluate_function(name, evaluated_args, e_ctx)?)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            // `or` and `and` short-circuit: the right operand is only
            // evaluated when the left one does not decide the outcome.
            match op {
                BinaryOperator::Or if left_val.to_bool() => Ok(XPathValue::Boolean(true)),
                BinaryOperator::And if !left_val.to_bool() => Ok(XPathValue::Boolean(false)),
                _ => {
                    let right_val = evaluate(right, e_ctx)?;
                    operators::evaluate(*op, left_val, right_val, e_ctx.dom)
                }
            }
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number(e_ctx.dom))),
            }
        }
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    // If the path has no steps and is relative, it refers to the context node itself.
    if path.steps.is_empty() && !path.is_absolute && path.start_point.is_none() {
        return Ok(vec![e_ctx.context_node]);
    }

    let initial_context = if let Some(start_expr) = &path.start_point {
        // The path starts from the result of another expression.
        match evaluate(start_expr, e_ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            // If the start expression doesn't evaluate to a node-set, the path is empty.
            _ => return Ok(vec![]),
        }
    } else if path.is_absolute {
        // Standard absolute path from the root.
        vec![e_ctx.root_node]
    } else {
        // Standard relative path from the current context node.
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Derives the traversal bucket from a step's node test. The bucket is an
/// optimization hint: it narrows what the facade hands back, but only to
/// nodes the node test would keep anyway.
fn bucket_for_step(step: &Step) -> Option<Bucket<'_>> {
    match &step.node_test {
        NodeTest::Name(name) => Some(Bucket::Name(name)),
        NodeTest::Wildcard => match step.axis {
            Axis::Attribute => Some(Bucket::Type(NodeType::Attribute)),
            _ => Some(Bucket::Type(NodeType::Element)),
        },
        NodeTest::NodeType(ntt) => match ntt {
            NodeTypeTest::Text => Some(Bucket::Type(NodeType::Text)),
            NodeTypeTest::Comment => Some(Bucket::Type(NodeType::Comment)),
            NodeTypeTest::ProcessingInstruction => {
                Some(Bucket::Type(NodeType::ProcessingInstruction))
            }
            NodeTypeTest::Node => None,
        },
    }
}

/// Evaluates a single step in a location path by chaining axis collection, node testing, and predicate application.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    // Handle special abbreviated step '.' which means the context node set itself.
    if step.axis == Axis::SelfAxis && step.node_test == NodeTest::Name(".".to_string()) {
        return Ok(context_nodes.to_vec());
    }

    let bucket = bucket_for_step(step);
    let axis_nodes = collect_axis_nodes(step.axis, context_nodes, bucket.as_ref(), e_ctx.dom);
    let tested_nodes = filter_by_node_test(&axis_nodes, &step.node_test, step.axis);
    apply_predicates(&tested_nodes, &step.predicates, e_ctx)
}

/// Stage 1: Collects all unique nodes from the context set along a given axis.
///
/// The bucket is only applied on the child and sibling axes, where the facade
/// can skip non-matching nodes one level at a time. Subtree axes never prune:
/// skipping a container would also hide matching descendants inside it.
fn collect_axis_nodes<'a, N>(
    axis: Axis,
    context_nodes: &[N],
    bucket: Option<&Bucket>,
    dom: &dyn DomFacade<'a, N>,
) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut result_nodes = Vec::new();
    let mut seen = HashSet::new();

    for &node in context_nodes {
        match axis {
            Axis::Child => axes::collect_child_nodes(dom, node, bucket, &mut seen, &mut result_nodes),
            Axis::Attribute => {
                axes::collect_attribute_nodes(dom, node, &mut seen, &mut result_nodes)
            }
            Axis::Descendant => {
                axes::collect_descendant_nodes(dom, node, &mut seen, &mut result_nodes)
            }
            Axis::DescendantOrSelf => {
                axes::collect_descendant_or_self_nodes(dom, node, &mut seen, &mut result_nodes)
            }
            Axis::Parent => axes::collect_parent_nodes(dom, node, &mut seen, &mut result_nodes),
            Axis::Ancestor => axes::collect_ancestor_nodes(dom, node, &mut seen, &mut result_nodes),
            Axis::SelfAxis => axes::collect_self_nodes(node, &mut seen, &mut result_nodes),
            Axis::FollowingSibling => {
                axes::collect_following_sibling_nodes(dom, node, bucket, &mut seen, &mut result_nodes)
            }
            Axis::PrecedingSibling => {
                axes::collect_preceding_sibling_nodes(dom, node, bucket, &mut seen, &mut result_nodes)
            }
            Axis::Following => axes::collect_following_nodes(dom, node, &mut seen, &mut result_nodes),
            Axis::Preceding => axes::collect_preceding_nodes(dom, node, &mut seen, &mut result_nodes),
        }
    }
    result_nodes
}

/// Stage 2: Filters a set of nodes based on a `NodeTest`.
fn filter_by_node_test<'a, N>(nodes: &[N], test: &NodeTest, axis: Axis) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    nodes
        .iter()
        .filter(|&node| match test {
            NodeTest::Wildcard => match axis {
                Axis::Attribute => node.node_type() == NodeType::Attribute,
                _ => node.node_type() == NodeType::Element,
            },
            NodeTest::Name(name_to_test) => {
                // A name test only matches the axis's principal node type, so
                // `child::foo` never selects a processing instruction whose
                // target happens to be `foo`.
                let principal = match axis {
                    Axis::Attribute => NodeType::Attribute,
                    _ => NodeType::Element,
                };
                node.node_type() == principal
                    && node
                        .name()
                        .is_some_and(|q_name| q_name.local_part == name_to_test)
            }
            NodeTest::NodeType(ntt) => match ntt {
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    node.node_type() == NodeType::ProcessingInstruction
                }
                NodeTypeTest::Node => true,
            },
        })
        .copied()
        .collect()
}

/// Stage 3: Filters a set of nodes by applying a series of predicates.
fn apply_predicates<'a, N>(
    nodes: &[N],
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes.to_vec();
    for predicate in predicates {
        let mut predicate_results = Vec::new();
        let context_size = final_nodes.len();
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_e_ctx = EvaluationContext::new(
                *node,
                e_ctx.root_node,
                e_ctx.functions,
                i + 1,
                context_size,
                e_ctx.variables,
                e_ctx.strict,
                e_ctx.dom,
            );
            let result = evaluate(predicate, &predicate_e_ctx)?;
            let keep = match result {
                XPathValue::Number(n) => (n as usize) == (i + 1),
                _ => result.to_bool(),
            };
            if keep {
                predicate_results.push(*node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::facade::DirectDomFacade;
    use std::collections::HashMap;

    fn create_test_eval_context<'a, 'd>(
        tree: &'a MockTree<'a>,
        functions: &'d FunctionRegistry,
        vars: &'d HashMap<String, XPathValue<MockNode<'a>>>,
        dom: &'d dyn DomFacade<'a, MockNode<'a>>,
    ) -> EvaluationContext<'a, 'd, MockNode<'a>> {
        let root = MockNode { id: 0, tree };
        EvaluationContext::new(root, root, functions, 1, 1, vars, false, dom)
    }

    #[test]
    fn test_pipeline_functions_individually() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let root = MockNode { id: 0, tree: &tree };
        let entry = MockNode { id: 1, tree: &tree };
        let attr = MockNode { id: 2, tree: &tree };
        let text = MockNode { id: 4, tree: &tree };

        // Test collect_axis_nodes
        let children = collect_axis_nodes(Axis::Child, &[root], None, &dom);
        assert_eq!(children.len(), 5);
        let attributes = collect_axis_nodes(Axis::Attribute, &[entry], None, &dom);
        assert_eq!(attributes.len(), 2);
        let ancestors = collect_axis_nodes(Axis::Ancestor, &[text], None, &dom);
        assert_eq!(ancestors, vec![entry, root]);

        // Test filter_by_node_test
        let all_nodes = vec![root, entry, attr, text];
        let elements = filter_by_node_test(&all_nodes, &NodeTest::Wildcard, Axis::Child);
        assert_eq!(elements, vec![entry]);
        let entry_nodes = filter_by_node_test(
            &all_nodes,
            &NodeTest::Name("entry".to_string()),
            Axis::Child,
        );
        assert_eq!(entry_nodes, vec![entry]);
        let text_nodes = filter_by_node_test(
            &all_nodes,
            &NodeTest::NodeType(NodeTypeTest::Text),
            Axis::Child,
        );
        assert_eq!(text_nodes, vec![text]);

        // Test apply_predicates (positional)
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);
        let predicate_expr = crate::parser::parse_expression("position()=2").unwrap();
        let predicates = vec![predicate_expr];
        let nodes_to_filter = vec![root, entry, text];
        let filtered = apply_predicates(&nodes_to_filter, &predicates, &e_ctx).unwrap();
        assert_eq!(filtered, vec![entry]);
    }

    #[test]
    fn test_predicate_by_attribute() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        let expr = crate::parser::parse_expression("child::entry[@status='draft']").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();

        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 1);
        } else {
            panic!("Expected a NodeSet");
        }
    }

    #[test]
    fn test_predicate_by_position() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        let expr = crate::parser::parse_expression("child::entry[2]").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();

        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 8);
        } else {
            panic!("Expected a NodeSet");
        }
    }

    #[test]
    fn test_predicate_by_position_function() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        let expr = crate::parser::parse_expression("child::entry[position()=1]").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();

        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 1);
        } else {
            panic!("Expected a NodeSet");
        }
    }

    #[test]
    fn test_name_test_selects_only_the_principal_node_type() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        // The root has a processing instruction with target "render"; a name
        // test on the child axis matches elements only.
        let expr = crate::parser::parse_expression("render").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        if let XPathValue::NodeSet(nodes) = result {
            assert!(nodes.is_empty());
        } else {
            panic!("Expected a NodeSet");
        }

        // The node-type test is the way to reach it.
        let expr = crate::parser::parse_expression("processing-instruction()").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 7);
        } else {
            panic!("Expected a NodeSet");
        }
    }

    #[test]
    fn test_variable_evaluation() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();

        let mut vars = HashMap::new();
        vars.insert(
            "myVar".to_string(),
            XPathValue::String("test-value".to_string()),
        );

        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        let expr = crate::parser::parse_expression("$myVar").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        assert_eq!(result.to_string_value(&dom), "test-value");
    }

    #[test]
    fn test_undeclared_variable_in_strict_mode() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let root = MockNode { id: 0, tree: &tree };
        let e_ctx = EvaluationContext::new(root, root, &funcs, 1, 1, &vars, true, &dom);

        let expr = crate::parser::parse_expression("$missing").unwrap();
        let result = evaluate(&expr, &e_ctx);
        assert!(matches!(result, Err(XPathError::UnknownVariable(name)) if name == "missing"));
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let root = MockNode { id: 0, tree: &tree };
        // Strict mode turns the undeclared variable into an error, so these
        // only pass if the right operand is never evaluated.
        let e_ctx = EvaluationContext::new(root, root, &funcs, 1, 1, &vars, true, &dom);

        let expr = crate::parser::parse_expression("true() or $missing").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        assert!(result.to_bool());

        let expr = crate::parser::parse_expression("false() and $missing").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        assert!(!result.to_bool());
    }

    #[test]
    fn test_path_from_variable_node_set() {
        let tree = create_test_tree();
        let dom = DirectDomFacade;
        let funcs = FunctionRegistry::default();
        let mut vars = HashMap::new();

        // Put the first <entry> node (id 1) into a variable
        let entry_node = MockNode { id: 1, tree: &tree };
        vars.insert(
            "entry_node".to_string(),
            XPathValue::NodeSet(vec![entry_node]),
        );

        let e_ctx = create_test_eval_context(&tree, &funcs, &vars, &dom);

        // Select the text() node from the node in the variable
        let expr = crate::parser::parse_expression("$entry_node/text()").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();

        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 4);
            assert_eq!(nodes[0].string_value(), "First");
        } else {
            panic!("Expected a NodeSet");
        }
    }
}
