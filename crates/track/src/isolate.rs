//! Locates the outermost path expressions inside a parsed expression.
//!
//! Each returned path is later re-evaluated on its own, so that a path whose
//! evaluation was skipped (a short-circuited `or` operand, an unused function
//! argument) still contributes to the dependency set. Paths nested inside
//! another path (predicates, start-point expressions) are not returned
//! separately: they run as part of the outer path's isolated evaluation.

use xdep_xpath1::{Expression, LocationPath};

/// Returns the outermost `LocationPath`s of `expr` in pre-order.
pub fn collect_path_expressions(expr: &Expression) -> Vec<&LocationPath> {
    let mut paths = Vec::new();
    visit(expr, &mut paths);
    paths
}

fn visit<'e>(expr: &'e Expression, paths: &mut Vec<&'e LocationPath>) {
    match expr {
        Expression::LocationPath(path) => paths.push(path),
        Expression::FunctionCall { args, .. } => {
            for arg in args {
                visit(arg, paths);
            }
        }
        Expression::BinaryOp { left, right, .. } => {
            visit(left, paths);
            visit(right, paths);
        }
        Expression::UnaryOp { expr, .. } => visit(expr, paths),
        Expression::Literal(_) | Expression::Number(_) | Expression::Variable(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdep_xpath1::parse_expression;

    fn paths_of(input: &str) -> usize {
        let expr = parse_expression(input).unwrap();
        collect_path_expressions(&expr).len()
    }

    #[test]
    fn test_no_paths_in_pure_expressions() {
        assert_eq!(paths_of("true()"), 0);
        assert_eq!(paths_of("1 + 2 * 3"), 0);
        assert_eq!(paths_of("'literal'"), 0);
    }

    #[test]
    fn test_each_operand_is_isolated() {
        assert_eq!(paths_of("@first or @second"), 2);
        assert_eq!(paths_of("foo = 'x' and bar = 'y'"), 2);
    }

    #[test]
    fn test_paths_inside_function_arguments() {
        assert_eq!(paths_of("count(foo) + count(bar)"), 2);
        assert_eq!(paths_of("concat('a', 'b')"), 0);
    }

    #[test]
    fn test_nested_paths_are_not_collected_separately() {
        // The predicate path @id stays inside the outer path.
        assert_eq!(paths_of("foo[@id = 'a']"), 1);
        // A path starting from a function result is one path.
        assert_eq!(paths_of("id('x')/child"), 1);
    }

    #[test]
    fn test_pre_order_collection() {
        let expr = parse_expression("foo | bar").unwrap();
        let paths = collect_path_expressions(&expr);
        assert_eq!(paths.len(), 2);
        assert!(!paths[0].steps.is_empty());
        assert!(!paths[1].steps.is_empty());
    }
}
