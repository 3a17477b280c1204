//! # Resolve-Transform Capability
//!
//! The seam between the hash reducer and whatever evaluates nested transform
//! expressions. The reducer depends only on this trait, never on the engine,
//! so recursion (`compose` stages re-entering the reducer) goes through a
//! value the caller injects.

use crate::transform::TransformExpr;
use crate::{Accumulator, HashpointError};
use async_trait::async_trait;

/// Resolves a transform expression against an accumulator.
///
/// Implementations may recurse into entity lookup and any reducer. Errors
/// they return reach the original caller unchanged.
#[async_trait]
pub trait ResolveTransform: Send + Sync {
    /// Evaluate `expr` with `accumulator` as input.
    ///
    /// The returned accumulator's `value` is the result.
    async fn resolve_transform(
        &self,
        accumulator: &Accumulator,
        expr: &TransformExpr,
    ) -> Result<Accumulator, HashpointError>;
}
