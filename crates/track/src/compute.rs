//! The two dependency-computation strategies.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::error::DependencyError;
use crate::facade::{NodeAccumulator, TrackingDomFacade};
use crate::isolate::collect_path_expressions;
use xdep_xpath1::functions::FunctionRegistry;
use xdep_xpath1::{
    DataSourceNode, EvaluationContext, Expression, XPathValue, evaluate, parse_expression,
};

/// Computes a conservative dependency set for `xpath` evaluated at
/// `context_node`.
///
/// Every outermost path expression is evaluated independently against a fresh
/// tracking facade, all feeding one accumulator. This covers paths the real
/// evaluation would skip through short-circuiting. The nodes each path selects
/// are added to the set as well: the result of a path depends on the selected
/// nodes existing where they do.
pub fn compute_dependencies<'a, N>(
    xpath: &str,
    context_node: N,
) -> Result<HashSet<N>, DependencyError>
where
    N: DataSourceNode<'a> + 'a,
{
    let expr = parse_expression(xpath).map_err(DependencyError::Parse)?;
    let paths = collect_path_expressions(&expr);
    debug!("isolated {} path expression(s) from '{}'", paths.len(), xpath);

    let accumulator = NodeAccumulator::new();
    if paths.is_empty() {
        return Ok(accumulator.into_set());
    }

    let root = document_root(context_node);
    let functions = FunctionRegistry::default();
    let variables = HashMap::new();

    for path in paths {
        let facade = TrackingDomFacade::new(&accumulator);
        let wrapper = Expression::LocationPath(path.clone());
        let e_ctx = EvaluationContext::new(
            context_node,
            root,
            &functions,
            1,
            1,
            &variables,
            false,
            &facade,
        );
        let value = evaluate(&wrapper, &e_ctx).map_err(DependencyError::Evaluation)?;
        record_result_nodes(&accumulator, value);
    }

    debug!("'{}' depends on {} node(s)", xpath, accumulator.len());
    Ok(accumulator.into_set())
}

/// Computes the dependency set of a single evaluation of `xpath` at
/// `context_node`.
///
/// Only the nodes this one evaluation actually read are recorded, plus the
/// members of the result when the expression yields a node-set. A
/// subexpression skipped by short-circuiting leaves no trace here; use
/// [`compute_dependencies`] when that matters.
pub fn compute_minimal_dependencies<'a, N>(
    xpath: &str,
    context_node: N,
) -> Result<HashSet<N>, DependencyError>
where
    N: DataSourceNode<'a> + 'a,
{
    let expr = parse_expression(xpath).map_err(DependencyError::Parse)?;

    let accumulator = NodeAccumulator::new();
    let facade = TrackingDomFacade::new(&accumulator);
    let root = document_root(context_node);
    let functions = FunctionRegistry::default();
    let variables = HashMap::new();

    let e_ctx = EvaluationContext::new(
        context_node,
        root,
        &functions,
        1,
        1,
        &variables,
        false,
        &facade,
    );
    let value = evaluate(&expr, &e_ctx).map_err(DependencyError::Evaluation)?;
    record_result_nodes(&accumulator, value);

    debug!("'{}' depends on {} node(s)", xpath, accumulator.len());
    Ok(accumulator.into_set())
}

fn record_result_nodes<'a, N: DataSourceNode<'a>>(
    accumulator: &NodeAccumulator<N>,
    value: XPathValue<N>,
) {
    if let XPathValue::NodeSet(nodes) = value {
        for node in nodes {
            accumulator.record(node);
        }
    }
}

fn document_root<'a, N: DataSourceNode<'a>>(node: N) -> N {
    let mut current = node;
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}
