//! Contains pure functions for evaluating XPath binary operators.

use crate::ast::BinaryOperator;
use crate::datasource::DataSourceNode;
use crate::engine::XPathValue;
use crate::error::XPathError;
use crate::facade::DomFacade;

/// Evaluates a binary operator over two already-evaluated operands.
///
/// The engine short-circuits `or` and `and` before both operands exist; the
/// arms here cover the remaining case where the left operand did not decide
/// the outcome.
pub fn evaluate<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
    dom: &dyn DomFacade<'a, N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals => {
            let res = if let (XPathValue::Number(l), XPathValue::Number(r)) = (&left, &right) {
                l == r
            } else if let (XPathValue::Boolean(l), XPathValue::Boolean(r)) = (&left, &right) {
                l == r
            } else {
                left.to_string_value(dom) == right.to_string_value(dom)
            };
            Ok(XPathValue::Boolean(if op == Equals { res } else { !res }))
        }
        LessThan => Ok(XPathValue::Boolean(
            left.to_number(dom) < right.to_number(dom),
        )),
        LessThanOrEqual => Ok(XPathValue::Boolean(
            left.to_number(dom) <= right.to_number(dom),
        )),
        GreaterThan => Ok(XPathValue::Boolean(
            left.to_number(dom) > right.to_number(dom),
        )),
        GreaterThanOrEqual => Ok(XPathValue::Boolean(
            left.to_number(dom) >= right.to_number(dom),
        )),
        Plus => Ok(XPathValue::Number(
            left.to_number(dom) + right.to_number(dom),
        )),
        Minus => Ok(XPathValue::Number(
            left.to_number(dom) - right.to_number(dom),
        )),
        Multiply => Ok(XPathValue::Number(
            left.to_number(dom) * right.to_number(dom),
        )),
        Divide => Ok(XPathValue::Number(
            left.to_number(dom) / right.to_number(dom),
        )),
        Modulo => Ok(XPathValue::Number(
            left.to_number(dom) % right.to_number(dom),
        )),
        Union => evaluate_union(left, right),
    }
}

fn evaluate_union<'a, N: DataSourceNode<'a> + 'a>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let l_nodes = if let XPathValue::NodeSet(n) = left {
        n
    } else {
        return Err(XPathError::TypeError(
            "Left-hand side of '|' must be a node-set.".to_string(),
        ));
    };
    let r_nodes = if let XPathValue::NodeSet(n) = right {
        n
    } else {
        return Err(XPathError::TypeError(
            "Right-hand side of '|' must be a node-set.".to_string(),
        ));
    };

    let mut merged = l_nodes;
    merged.extend(r_nodes);
    merged.sort();
    merged.dedup();
    Ok(XPathValue::NodeSet(merged))
}
