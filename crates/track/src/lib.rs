//! Dependency analysis for XPath 1.0 expressions.
//!
//! Given an expression and a context node, this crate computes the set of
//! document nodes whose content influenced the result. A caller that caches
//! the result of an evaluation can re-run it only when one of those nodes
//! changes.
//!
//! Two strategies are provided:
//! - [`compute_minimal_dependencies`] evaluates the expression once and
//!   records exactly what that evaluation read. Cheap, but a short-circuited
//!   subexpression leaves no trace, so the set can go stale.
//! - [`compute_dependencies`] evaluates every outermost path expression in
//!   isolation instead, so nodes that a short-circuit would skip are still
//!   accounted for.

pub mod compute;
pub mod error;
pub mod facade;
pub mod isolate;

pub use compute::{compute_dependencies, compute_minimal_dependencies};
pub use error::DependencyError;
pub use facade::{NodeAccumulator, TrackingDomFacade};
